//! Fan-out transport implementations.
//!
//! Concrete implementations of `cachesync_core::transport::Transport`.
//!
//! - `memory`: per-queue FIFO buffers inside one process, always available.
//! - `redis` feature: topology kept in Redis keys, queues as Redis lists, so
//!   publisher and consumers can run as separate processes.

pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use memory::MemoryTransport;

#[cfg(feature = "redis")]
pub use redis_impl::RedisTransport;
