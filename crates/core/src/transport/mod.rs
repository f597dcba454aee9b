//! Fan-out transport abstraction.
//!
//! Modeled on a broker with exchanges, queues and bindings: publishers write
//! to an exchange, every queue bound to a fanout exchange receives a copy of
//! every message, subscribers read from a queue. A queue holds its payloads
//! until a subscriber takes them; subscribers sharing one queue split its
//! payloads between them.

mod error;
mod subscription;
mod topology;
mod traits;

pub use error::{Result, TransportError};
pub use subscription::{DeliverySource, Subscription};
pub use topology::{
    Binding, ExchangeKind, ExchangeSpec, QueueSpec, Topology, DEFAULT_EXCHANGE, DEFAULT_QUEUE,
};
pub use traits::{declare_topology, Transport};
