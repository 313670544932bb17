pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use domain::{validate_contact_form, Contact, ContactForm, Validator};
pub use infra::config::{Config, DatabaseConfig, Environment};
pub use storage::{ContactStore, MemoryContactStore, PostgresContactStore, StoreError};
pub use transport::http::{create_router, AppState};
