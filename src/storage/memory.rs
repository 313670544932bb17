//! In-process contact store with the same semantics as the PostgreSQL one.
//!
//! Used to exercise the HTTP layer without a database.

use crate::domain::contact::{Contact, INITIAL_VERSION};
use crate::storage::contacts::{ContactStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Rows {
    next_id: i32,
    by_id: BTreeMap<i32, Contact>,
}

#[derive(Default)]
pub struct MemoryContactStore {
    rows: RwLock<Rows>,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn insert(&self, first: &str, last: &str, phone: &str, email: &str) -> StoreResult<i32> {
        let mut rows = self.rows.write().await;
        rows.next_id += 1;
        let id = rows.next_id;
        rows.by_id.insert(
            id,
            Contact {
                id,
                first: first.to_string(),
                last: last.to_string(),
                phone: phone.to_string(),
                email: email.to_string(),
                created: Utc::now(),
                version: INITIAL_VERSION,
            },
        );
        Ok(id)
    }

    async fn get(&self, id: i32) -> StoreResult<Contact> {
        let rows = self.rows.read().await;
        rows.by_id.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> StoreResult<Vec<Contact>> {
        let rows = self.rows.read().await;
        let mut contacts: Vec<Contact> = rows.by_id.values().cloned().collect();
        // Byte order on UTF-8 is code point order, matching `COLLATE "C"`.
        contacts.sort_by(|a, b| {
            (a.first.as_str(), a.last.as_str(), a.id).cmp(&(b.first.as_str(), b.last.as_str(), b.id))
        });
        Ok(contacts)
    }

    async fn update(&self, contact: &Contact) -> StoreResult<i32> {
        let mut rows = self.rows.write().await;
        let stored = match rows.by_id.get_mut(&contact.id) {
            Some(c) if c.version == contact.version => c,
            _ => return Err(StoreError::EditConflict),
        };
        stored.first = contact.first.clone();
        stored.last = contact.last.clone();
        stored.phone = contact.phone.clone();
        stored.email = contact.email.clone();
        stored.version += 1;
        Ok(stored.version)
    }

    async fn delete(&self, id: i32) -> StoreResult<()> {
        let mut rows = self.rows.write().await;
        rows.by_id.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }
}
