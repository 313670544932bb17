//! The contact entity and the form used to create or edit one.

use crate::domain::validator::{
    matches, max_chars, not_blank, validate_phone_number_input, Validator, EMAIL_RX,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Version assigned to a freshly inserted contact.
pub const INITIAL_VERSION: i32 = 1;

/// Longest accepted first or last name, in characters.
pub const MAX_NAME_CHARS: usize = 100;

pub const MSG_BLANK: &str = "This field can't be blank.";
pub const MSG_TOO_LONG: &str = "This can't contain more than 100 characters.";
pub const MSG_INVALID_EMAIL: &str = "Invalid email.";
pub const MSG_INVALID_PHONE: &str = "Invalid phone number.";

/// A persisted contact row.
///
/// `version` is the optimistic-concurrency token: callers hand back the value
/// they read when updating, and every successful update bumps it by one.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Contact {
    pub id: i32,
    pub first: String,
    pub last: String,
    pub phone: String,
    pub email: String,
    pub created: DateTime<Utc>,
    pub version: i32,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first, self.last)
    }
}

/// Fields submitted by the create and edit forms.
///
/// `id` and `version` are only present on the edit form (hidden inputs).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub version: i32,
}

impl ContactForm {
    /// Pre-populates an edit form from the stored record.
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            id: Some(contact.id),
            first: contact.first.clone(),
            last: contact.last.clone(),
            phone: contact.phone.clone(),
            email: contact.email.clone(),
            version: contact.version,
        }
    }

    /// Builds the record handed to the store's update, keyed by `id` and
    /// carrying the version the form was rendered with.
    pub fn into_contact(self, id: i32) -> Contact {
        Contact {
            id,
            first: self.first,
            last: self.last,
            phone: self.phone,
            email: self.email,
            created: DateTime::<Utc>::default(),
            version: self.version,
        }
    }
}

/// Runs every field check for the contact form.
pub fn validate_contact_form(form: &ContactForm) -> Validator {
    let mut v = Validator::new();

    v.check_field(not_blank(&form.first), "first", MSG_BLANK);
    v.check_field(max_chars(&form.first, MAX_NAME_CHARS), "first", MSG_TOO_LONG);
    v.check_field(not_blank(&form.last), "last", MSG_BLANK);
    v.check_field(max_chars(&form.last, MAX_NAME_CHARS), "last", MSG_TOO_LONG);
    v.check_field(not_blank(&form.email), "email", MSG_BLANK);
    v.check_field(matches(&form.email, &EMAIL_RX), "email", MSG_INVALID_EMAIL);
    v.check_field(not_blank(&form.phone), "phone", MSG_BLANK);
    v.check_field(validate_phone_number_input(&form.phone), "phone", MSG_INVALID_PHONE);

    v
}
