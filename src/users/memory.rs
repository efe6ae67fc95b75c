//! In-process credential store for tests and local runs.
//!
//! Records live in insertion order behind one `RwLock`; uniqueness checks and
//! writes happen under the same write guard.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    models::UserRecord,
    store::{StoreError, UserStore},
};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    records: RwLock<Vec<UserRecord>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.username == username).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn insert(&self, record: &UserRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records
            .iter()
            .any(|r| r.username == record.username || r.id == record.id)
        {
            return Err(StoreError::Duplicate);
        }
        records.push(record.clone());
        Ok(())
    }

    async fn update(&self, record: &UserRecord) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        if records
            .iter()
            .any(|r| r.username == record.username && r.id != record.id)
        {
            return Err(StoreError::Duplicate);
        }
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                existing.clone_from(record);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() < before)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(username: &str) -> UserRecord {
        UserRecord {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password_hash: format!("hash-of-{username}"),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_username() {
        let store = MemoryUserStore::new();
        store.insert(&record("alice")).await.unwrap();
        assert!(matches!(
            store.insert(&record("alice")).await,
            Err(StoreError::Duplicate)
        ));
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let store = MemoryUserStore::new();
        for name in ["carol", "alice", "bob"] {
            store.insert(&record(name)).await.unwrap();
        }
        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.username)
            .collect();
        assert_eq!(names, ["carol", "alice", "bob"]);
    }

    #[tokio::test]
    async fn update_checks_other_users() {
        let store = MemoryUserStore::new();
        let alice = record("alice");
        let bob = record("bob");
        store.insert(&alice).await.unwrap();
        store.insert(&bob).await.unwrap();

        let mut renamed = alice.clone();
        renamed.username = "bob".to_string();
        assert!(matches!(
            store.update(&renamed).await,
            Err(StoreError::Duplicate)
        ));

        // Keeping one's own name is not a conflict.
        let mut same = alice.clone();
        same.password_hash = "new".to_string();
        assert!(store.update(&same).await.unwrap());
        assert_eq!(
            store.find_by_id(alice.id).await.unwrap().unwrap().password_hash,
            "new"
        );

        assert!(!store.update(&record("ghost")).await.unwrap());
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let store = MemoryUserStore::new();
        let alice = record("alice");
        store.insert(&alice).await.unwrap();
        assert!(store.delete(alice.id).await.unwrap());
        assert!(!store.delete(alice.id).await.unwrap());
        assert!(store.find_by_username("alice").await.unwrap().is_none());
    }
}
