//! Persistent contact store implementation using PostgreSQL.

use crate::domain::contact::Contact;
use crate::infra::config::DatabaseConfig;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use thiserror::Error;

/// Failures surfaced by a [`ContactStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no matching record found")]
    NotFound,
    /// The version supplied to `update` is no longer current, or the row is gone.
    #[error("edit conflict: the record was changed by someone else")]
    EditConflict,
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// All persistence operations for contacts.
///
/// Implementations must be safe to share across request tasks.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Creates a contact and returns its server-assigned id.
    async fn insert(&self, first: &str, last: &str, phone: &str, email: &str) -> StoreResult<i32>;

    /// Fetches one contact, or [`StoreError::NotFound`].
    async fn get(&self, id: i32) -> StoreResult<Contact>;

    /// Every contact, ordered by first name, then last name, then id. Names
    /// compare by code point, not by the database's locale collation.
    async fn list(&self) -> StoreResult<Vec<Contact>>;

    /// Writes the editable fields of `contact` if `contact.version` is still
    /// the stored version, and returns the incremented version.
    ///
    /// Zero matching rows yields [`StoreError::EditConflict`], whether the
    /// version moved on or the row no longer exists. Callers that need to tell
    /// those apart check existence first.
    async fn update(&self, contact: &Contact) -> StoreResult<i32>;

    /// Removes the row permanently, or [`StoreError::NotFound`].
    async fn delete(&self, id: i32) -> StoreResult<()>;
}

const CREATE_CONTACTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS contacts (
    id SERIAL PRIMARY KEY,
    first TEXT NOT NULL,
    last TEXT NOT NULL,
    phone TEXT NOT NULL,
    email TEXT NOT NULL,
    created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    version INTEGER NOT NULL DEFAULT 1
)";

/// A [`ContactStore`] backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PostgresContactStore {
    pool: PgPool,
}

impl PostgresContactStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a pool sized from `cfg` and verifies the database is reachable.
    pub async fn connect(cfg: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_open_conns)
            .min_connections(cfg.max_idle_conns.min(cfg.max_open_conns))
            .idle_timeout(Some(cfg.max_idle_time))
            .acquire_timeout(Duration::from_secs(5))
            .connect(&cfg.dsn)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the `contacts` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_CONTACTS_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ContactStore for PostgresContactStore {
    async fn insert(&self, first: &str, last: &str, phone: &str, email: &str) -> StoreResult<i32> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO contacts (first, last, phone, email, created, version)
             VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP, 1)
             RETURNING id",
        )
        .bind(first)
        .bind(last)
        .bind(phone)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get(&self, id: i32) -> StoreResult<Contact> {
        sqlx::query_as::<_, Contact>(
            "SELECT id, first, last, phone, email, created, version FROM contacts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> StoreResult<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"SELECT id, first, last, phone, email, created, version FROM contacts
             ORDER BY first COLLATE "C", last COLLATE "C", id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(contacts)
    }

    async fn update(&self, contact: &Contact) -> StoreResult<i32> {
        let new_version: Option<i32> = sqlx::query_scalar(
            "UPDATE contacts
             SET first = $1, last = $2, phone = $3, email = $4, version = version + 1
             WHERE id = $5 AND version = $6
             RETURNING version",
        )
        .bind(&contact.first)
        .bind(&contact.last)
        .bind(&contact.phone)
        .bind(&contact.email)
        .bind(contact.id)
        .bind(contact.version)
        .fetch_optional(&self.pool)
        .await?;

        new_version.ok_or(StoreError::EditConflict)
    }

    async fn delete(&self, id: i32) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
