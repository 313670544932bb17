//! Contact persistence.

pub mod contacts;
pub mod memory;

pub use contacts::{ContactStore, PostgresContactStore, StoreError, StoreResult};
pub use memory::MemoryContactStore;
