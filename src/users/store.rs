//! Credential store seam.
//!
//! Implementations must keep `username` unique: a second insert (or an update
//! onto a taken name) returns [`StoreError::Duplicate`] and leaves the store
//! unchanged.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::models::UserRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists")]
    Duplicate,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    /// All records, oldest first.
    async fn list(&self) -> Result<Vec<UserRecord>, StoreError>;

    async fn insert(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Overwrite username and hash. Returns `false` if `record.id` does not exist.
    async fn update(&self, record: &UserRecord) -> Result<bool, StoreError>;

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
