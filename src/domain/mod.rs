//! Domain types: the contact entity and form validation.

pub mod contact;
pub mod validator;

pub use contact::{validate_contact_form, Contact, ContactForm};
pub use validator::Validator;
