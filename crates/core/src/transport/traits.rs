use async_trait::async_trait;

use super::{Binding, ExchangeSpec, QueueSpec, Result, Subscription, Topology};

/// Broker-style fan-out transport.
///
/// All `declare_*` and `bind` calls are idempotent: re-declaring an entity
/// with identical parameters is a no-op, with different parameters it fails
/// with `TransportError::TopologyMismatch`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ensures the exchange exists.
    async fn declare_exchange(&self, exchange: &ExchangeSpec) -> Result<()>;

    /// Ensures the queue exists.
    async fn declare_queue(&self, queue: &QueueSpec) -> Result<()>;

    /// Binds a queue to an exchange. Both must already be declared.
    async fn bind(&self, binding: &Binding) -> Result<()>;

    /// Publishes a payload to an exchange. Returns once the transport has
    /// accepted it; consumers are never waited for.
    async fn publish(&self, exchange: &str, routing_key: &str, payload: &[u8]) -> Result<()>;

    /// Opens a subscription to a declared queue. Payloads that reached the
    /// queue before the call are delivered first.
    async fn subscribe(&self, queue: &str) -> Result<Subscription>;
}

/// Declares the exchange, the queue and the binding between them.
pub async fn declare_topology<T>(transport: &T, topology: &Topology) -> Result<()>
where
    T: Transport + ?Sized,
{
    transport.declare_exchange(&topology.exchange).await?;
    transport.declare_queue(&topology.queue).await?;
    transport.bind(&topology.binding()).await?;

    tracing::debug!(
        exchange = %topology.exchange.name,
        queue = %topology.queue.name,
        "Topology declared"
    );
    Ok(())
}
