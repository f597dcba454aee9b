//! Cache backend implementations.
//!
//! This module provides concrete implementations of the `Cache` trait
//! defined in `cachesync_core::cache`.
//!
//! - `memory`: in-memory LRU cache using tokio synchronization primitives,
//!   always available (tests and the in-process demo).
//! - `redis` feature: Redis cache using the redis crate.

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use memory::MemoryCache;

#[cfg(feature = "redis")]
pub use redis_impl::RedisCache;
