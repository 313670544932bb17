//! Form validation: an error accumulator plus reusable predicates.
//!
//! Validation never short-circuits. Every check runs, and the caller inspects
//! [`Validator::valid`] once all fields have been looked at so a single response
//! can report every problem with a submission.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Email address pattern from the WHATWG HTML living standard
/// (<https://html.spec.whatwg.org/multipage/input.html#valid-e-mail-address>).
pub static EMAIL_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email pattern compiles")
});

/// Permissive North-American style number: optional `+`, area code with or
/// without parentheses, then 3 and 4 digit groups with optional `-`/space separators.
///
/// A bare area code directly after `+` reads as a country code, so it may not
/// start with 0 (`+0234567890` is rejected).
pub static PERMISSIVE_PHONE_RX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:\+?\([0-9]{3}\)|\+[1-9][0-9]{2}|[0-9]{3})[-\t\n\x0C\r ]?[0-9]{3}[-\t\n\x0C\r ]?[0-9]{4}$",
    )
    .expect("permissive phone pattern compiles")
});

/// ITU-T E.164: `+`, no leading zero, at most 15 digits.
pub static E164_PHONE_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").expect("E.164 pattern compiles"));

/// Collects validation failures for a single form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validator {
    /// Errors tied to a form field. Only the first failure per field is kept.
    pub field_errors: HashMap<String, String>,
    /// Errors about the submission as a whole, in the order they were added.
    pub non_field_errors: Vec<String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no field or non-field error has been recorded.
    pub fn valid(&self) -> bool {
        self.field_errors.is_empty() && self.non_field_errors.is_empty()
    }

    /// Records `message` for `field` unless that field already failed.
    pub fn add_field_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.field_errors
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    pub fn add_non_field_error(&mut self, message: impl Into<String>) {
        self.non_field_errors.push(message.into());
    }

    /// Records `message` for `field` when `ok` is false.
    pub fn check_field(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_field_error(field, message);
        }
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }
}

/// True if `s` contains something other than whitespace.
pub fn not_blank(s: &str) -> bool {
    !s.trim().is_empty()
}

/// True if `s` has at most `n` characters (Unicode scalar values, not bytes).
pub fn max_chars(s: &str, n: usize) -> bool {
    s.chars().count() <= n
}

/// True if `s` has at least `n` characters (Unicode scalar values, not bytes).
pub fn min_chars(s: &str, n: usize) -> bool {
    s.chars().count() >= n
}

pub fn matches(s: &str, rx: &Regex) -> bool {
    rx.is_match(s)
}

pub fn permitted_value<T: PartialEq>(value: &T, permitted: &[T]) -> bool {
    permitted.contains(value)
}

/// Accepts either the permissive regional format or strict E.164.
pub fn validate_phone_number_input(phone: &str) -> bool {
    matches(phone, &PERMISSIVE_PHONE_RX) || matches(phone, &E164_PHONE_RX)
}
