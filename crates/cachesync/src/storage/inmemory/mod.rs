//! In-memory storage backend for testing.
//!
//! This module provides an in-memory implementation of the repository trait
//! that stores all data in a HashMap wrapped in `Arc<RwLock<_>>`. Useful for
//! tests and the in-process demo where persistence is not required.

mod repository;

pub use repository::InMemoryRepository;
