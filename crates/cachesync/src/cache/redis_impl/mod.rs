//! Redis cache backend implementation.
//!
//! Provides a shared cache using Redis so several consumer processes (or
//! readers outside this project) see the same replica.

mod cache;
mod error;

pub use cache::RedisCache;
