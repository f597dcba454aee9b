//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use cachesync_core::storage::{RepositoryError, Result, UserRepository};
use cachesync_core::user::{NewUser, User};

#[derive(Debug, Default)]
struct Table {
    users: HashMap<u64, User>,
    last_id: u64,
}

/// In-memory storage backend for testing.
///
/// Identities are assigned sequentially starting at 1, deleted users stay in
/// the table with `deleted_at` set. Data is lost when the repository is
/// dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    table: Arc<RwLock<Table>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn get_user(&self, id: u64) -> Result<Option<User>> {
        let table = self.table.read().await;
        Ok(table.users.get(&id).filter(|u| !u.is_deleted()).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let created = user.clone().into_user(table.last_id);
        table.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, user: &User) -> Result<User> {
        let mut table = self.table.write().await;
        let stored = table
            .users
            .get_mut(&user.id)
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| RepositoryError::user_not_found(user.id))?;

        stored.name = user.name.clone();
        stored.email = user.email.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_user(&self, id: u64) -> Result<User> {
        let mut table = self.table.write().await;
        let stored = table
            .users
            .get_mut(&id)
            .filter(|u| !u.is_deleted())
            .ok_or_else(|| RepositoryError::user_not_found(id))?;

        stored.deleted_at = Some(Utc::now());
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let repo = InMemoryRepository::new();

        let a = repo.create_user(&NewUser::new("A", "a@x")).await.unwrap();
        let b = repo.create_user(&NewUser::new("B", "b@x")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(repo.get_user(1).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn test_update_changes_fields_and_timestamp() {
        let repo = InMemoryRepository::new();
        let created = repo.create_user(&NewUser::new("A", "a@x")).await.unwrap();

        let updated = repo
            .update_user(&created.clone().with_name("B"))
            .await
            .unwrap();

        assert_eq!(updated.name, "B");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(repo.get_user(created.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_missing_user_fails() {
        let repo = InMemoryRepository::new();
        let err = repo
            .update_user(&User::new(9, "X", "x@x"))
            .await
            .unwrap_err();
        assert_eq!(err, RepositoryError::user_not_found(9));
    }

    #[tokio::test]
    async fn test_delete_is_soft() {
        let repo = InMemoryRepository::new();
        let created = repo.create_user(&NewUser::new("A", "a@x")).await.unwrap();

        let deleted = repo.delete_user(created.id).await.unwrap();

        assert!(deleted.is_deleted());
        assert_eq!(deleted.name, "A");
        assert_eq!(repo.get_user(created.id).await.unwrap(), None);
        assert!(repo.table.read().await.users.contains_key(&created.id));
    }

    #[tokio::test]
    async fn test_delete_twice_fails() {
        let repo = InMemoryRepository::new();
        let created = repo.create_user(&NewUser::new("A", "a@x")).await.unwrap();

        repo.delete_user(created.id).await.unwrap();
        let err = repo.delete_user(created.id).await.unwrap_err();

        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_deleted_user_cannot_be_updated() {
        let repo = InMemoryRepository::new();
        let created = repo.create_user(&NewUser::new("A", "a@x")).await.unwrap();
        repo.delete_user(created.id).await.unwrap();

        assert!(repo.update_user(&created).await.is_err());
    }
}
