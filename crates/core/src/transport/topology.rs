use serde::{Deserialize, Serialize};

/// Exchange the user change events are published to.
pub const DEFAULT_EXCHANGE: &str = "user_exchange";

/// Queue the cache replicas consume from.
pub const DEFAULT_QUEUE: &str = "user_queue";

/// Routing behavior of an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeKind {
    /// Every bound queue receives every message, routing keys are ignored.
    Fanout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeSpec {
    pub name: String,
    pub kind: ExchangeKind,
    pub durable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSpec {
    pub name: String,
    pub durable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub queue: String,
    pub exchange: String,
    pub routing_key: String,
}

/// The exchange, queue and binding both sides of the pipeline declare.
///
/// Declaring is idempotent, so publisher and subscriber each declare the
/// full topology before use and neither depends on the other starting first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub exchange: ExchangeSpec,
    pub queue: QueueSpec,
    pub routing_key: String,
}

impl Topology {
    /// A durable fanout exchange with one non-durable queue bound to it by
    /// the empty routing key.
    pub fn new(exchange: impl Into<String>, queue: impl Into<String>) -> Self {
        Self {
            exchange: ExchangeSpec {
                name: exchange.into(),
                kind: ExchangeKind::Fanout,
                durable: true,
            },
            queue: QueueSpec {
                name: queue.into(),
                durable: false,
            },
            routing_key: String::new(),
        }
    }

    /// The binding of this topology's queue to its exchange.
    pub fn binding(&self) -> Binding {
        Binding {
            queue: self.queue.name.clone(),
            exchange: self.exchange.name.clone(),
            routing_key: self.routing_key.clone(),
        }
    }
}

impl Default for Topology {
    fn default() -> Self {
        Self::new(DEFAULT_EXCHANGE, DEFAULT_QUEUE)
    }
}
