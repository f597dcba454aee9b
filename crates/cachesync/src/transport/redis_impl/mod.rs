//! Redis fan-out transport implementation.
//!
//! Topology declarations live in plain Redis keys so every process sees the
//! same exchanges, queues and bindings. Each queue's payloads sit in a Redis
//! list until a consumer pops them, so a consumer restart loses nothing that
//! was published meanwhile.

mod error;
mod keys;
mod transport;

pub use transport::RedisTransport;
