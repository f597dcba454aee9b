use async_trait::async_trait;

use crate::user::{NewUser, User};

use super::Result;

/// Repository for user operations: the record store of truth.
///
/// Deleted users are soft-deleted: they keep their row with `deleted_at` set
/// and are no longer returned by `get_user`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Gets a live (not deleted) user by their ID.
    async fn get_user(&self, id: u64) -> Result<Option<User>>;

    /// Creates a new user, assigning its identity. Returns the stored record.
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    /// Updates an existing user's fields. Returns the stored record with a
    /// refreshed `updated_at`.
    async fn update_user(&self, user: &User) -> Result<User>;

    /// Soft-deletes a user. Returns the last-known snapshot with
    /// `deleted_at` set.
    async fn delete_user(&self, id: u64) -> Result<User>;
}
