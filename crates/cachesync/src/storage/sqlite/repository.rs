//! SQLite repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use cachesync_core::storage::{RepositoryError, Result, UserRepository};
use cachesync_core::user::{NewUser, User};

use super::conversions::{format_datetime, row_to_user, to_rowid};
use super::error::map_tokio_rusqlite_error;
use super::schema;

/// Converts a rusqlite::Error to tokio_rusqlite::Error.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

/// SQLite-based user repository.
///
/// Identities come from the `AUTOINCREMENT` rowid. Deletes are soft: the row
/// keeps its data and gets `deleted_at` set.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Opens (or creates) the database at `path` and initializes the schema.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database. Useful for tests.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES).map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn get_user(&self, id: u64) -> Result<Option<User>> {
        let Some(rowid) = to_rowid(id) else {
            return Ok(None);
        };

        self.conn
            .call(move |conn| {
                conn.query_row(schema::SELECT_LIVE_USER, [rowid], row_to_user)
                    .optional()
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, Some(id)))
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let name = user.name.clone();
        let email = user.email.clone();
        let now = format_datetime(&Utc::now());

        self.conn
            .call(move |conn| {
                conn.execute(schema::INSERT_USER, rusqlite::params![name, email, now, now])
                    .map_err(wrap_err)?;
                let rowid = conn.last_insert_rowid();
                conn.query_row(schema::SELECT_ANY_USER, [rowid], row_to_user)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, None))
    }

    async fn update_user(&self, user: &User) -> Result<User> {
        let id = user.id;
        let rowid = to_rowid(id).ok_or_else(|| RepositoryError::user_not_found(id))?;
        let name = user.name.clone();
        let email = user.email.clone();
        let now = format_datetime(&Utc::now());

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::UPDATE_USER, rusqlite::params![rowid, name, email, now])
                    .map_err(wrap_err)?;
                if rows == 0 {
                    return Err(wrap_err(rusqlite::Error::QueryReturnedNoRows));
                }
                conn.query_row(schema::SELECT_ANY_USER, [rowid], row_to_user)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, Some(id)))
    }

    async fn delete_user(&self, id: u64) -> Result<User> {
        let rowid = to_rowid(id).ok_or_else(|| RepositoryError::user_not_found(id))?;
        let now = format_datetime(&Utc::now());

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::SOFT_DELETE_USER, rusqlite::params![rowid, now])
                    .map_err(wrap_err)?;
                if rows == 0 {
                    return Err(wrap_err(rusqlite::Error::QueryReturnedNoRows));
                }
                conn.query_row(schema::SELECT_ANY_USER, [rowid], row_to_user)
                    .map_err(wrap_err)
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error(e, Some(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqliteRepository {
        SqliteRepository::new_in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = repo().await;

        let created = repo
            .create_user(&NewUser::new("Alice", "alice@example.com"))
            .await
            .unwrap();

        assert_eq!(created.id, 1);
        assert_eq!(created.name, "Alice");
        assert!(created.deleted_at.is_none());
        assert_eq!(repo.get_user(created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_get_missing_user_returns_none() {
        let repo = repo().await;
        assert_eq!(repo.get_user(42).await.unwrap(), None);
        assert_eq!(repo.get_user(u64::MAX).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_user() {
        let repo = repo().await;
        let created = repo
            .create_user(&NewUser::new("Alice", "alice@example.com"))
            .await
            .unwrap();

        let updated = repo
            .update_user(&created.clone().with_name("Alicia"))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Alicia");
        assert_eq!(updated.email, "alice@example.com");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let repo = repo().await;
        let err = repo
            .update_user(&User::new(3, "Ghost", "ghost@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err, RepositoryError::user_not_found(3));
    }

    #[tokio::test]
    async fn test_delete_is_soft_and_returns_snapshot() {
        let repo = repo().await;
        let created = repo
            .create_user(&NewUser::new("Alice", "alice@example.com"))
            .await
            .unwrap();

        let deleted = repo.delete_user(created.id).await.unwrap();

        assert_eq!(deleted.id, created.id);
        assert_eq!(deleted.name, "Alice");
        assert!(deleted.is_deleted());
        assert_eq!(repo.get_user(created.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_deleted_user_cannot_be_deleted_or_updated_again() {
        let repo = repo().await;
        let created = repo
            .create_user(&NewUser::new("Alice", "alice@example.com"))
            .await
            .unwrap();
        repo.delete_user(created.id).await.unwrap();

        assert_eq!(
            repo.delete_user(created.id).await.unwrap_err(),
            RepositoryError::user_not_found(created.id)
        );
        assert!(repo.update_user(&created).await.is_err());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let repo = repo().await;
        let first = repo.create_user(&NewUser::new("A", "a@x")).await.unwrap();
        repo.delete_user(first.id).await.unwrap();

        let second = repo.create_user(&NewUser::new("B", "b@x")).await.unwrap();

        assert!(second.id > first.id);
    }
}
