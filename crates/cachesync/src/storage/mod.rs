//! Record store implementations.
//!
//! Concrete implementations of `cachesync_core::storage::UserRepository`.
//!
//! - `inmemory`: HashMap-backed store, always available (tests and demo).
//! - `sqlite` feature: SQLite store using `rusqlite` and `tokio-rusqlite`.

pub mod inmemory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use inmemory::InMemoryRepository;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepository;
