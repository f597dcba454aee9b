//! In-memory cache backend implementation.
//!
//! Provides a thread-safe in-memory cache for single-process deployments
//! and tests.

mod cache;

pub use cache::MemoryCache;
