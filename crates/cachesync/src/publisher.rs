//! Event publisher: encodes change events and hands them to the transport.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use cachesync_core::event::{encode, ChangeAction, ChangeEvent, EncodeError, Entity, EventSchema};
use cachesync_core::transport::{declare_topology, Topology, Transport, TransportError};

/// Errors that can occur while publishing a change event.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to encode change event: {0}")]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Publish timed out after {0:?}")]
    Timeout(Duration),
}

/// Publishes change events to the fan-out exchange of a topology.
///
/// Publishing is fire-and-forget: it returns as soon as the transport has
/// accepted the payload. Nothing waits for consumers.
pub struct EventPublisher<T: Transport> {
    transport: Arc<T>,
    topology: Topology,
    schema: EventSchema,
    timeout: Option<Duration>,
}

impl<T: Transport> EventPublisher<T> {
    pub fn new(transport: Arc<T>, topology: Topology, schema: EventSchema) -> Self {
        Self {
            transport,
            topology,
            schema,
            timeout: None,
        }
    }

    /// Bounds how long a single publish may take. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Declares the exchange, the queue and their binding.
    pub async fn declare_topology(&self) -> Result<(), PublishError> {
        declare_topology(self.transport.as_ref(), &self.topology).await?;
        Ok(())
    }

    /// Encodes and publishes one event.
    ///
    /// The exchange is re-declared on every call so a publisher never depends
    /// on someone else having declared it first.
    pub async fn publish(&self, event: &ChangeEvent) -> Result<(), PublishError> {
        let payload = encode(&self.schema, event)?;

        let send = async {
            self.transport
                .declare_exchange(&self.topology.exchange)
                .await?;
            self.transport
                .publish(
                    &self.topology.exchange.name,
                    &self.topology.routing_key,
                    &payload,
                )
                .await
        };

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, send)
                .await
                .map_err(|_| PublishError::Timeout(limit))??,
            None => send.await?,
        }

        tracing::trace!(
            exchange = %self.topology.exchange.name,
            action = %event.action,
            entity_id = event.entity_id(),
            bytes = payload.len(),
            "Change event published"
        );
        Ok(())
    }

    /// Snapshots `entity` and publishes it under `action`.
    pub async fn publish_change<E: Entity>(
        &self,
        action: ChangeAction,
        entity: &E,
    ) -> Result<(), PublishError> {
        let event = ChangeEvent::from_entity(&self.schema, action, entity)?;
        self.publish(&event).await
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::transport::MemoryTransport;
    use cachesync_core::transport::{Binding, ExchangeSpec, QueueSpec, Subscription};
    use cachesync_core::user::User;

    fn publisher(transport: &MemoryTransport) -> EventPublisher<MemoryTransport> {
        EventPublisher::new(
            Arc::new(transport.clone()),
            Topology::default(),
            EventSchema::USER,
        )
    }

    #[tokio::test]
    async fn test_declare_topology_is_idempotent() {
        let transport = MemoryTransport::new();
        let publisher = publisher(&transport);

        publisher.declare_topology().await.unwrap();
        publisher.declare_topology().await.unwrap();
    }

    #[tokio::test]
    async fn test_declare_topology_conflict_is_reported() {
        let transport = MemoryTransport::new();
        let mut conflicting = Topology::default();
        conflicting.exchange.durable = false;
        transport
            .declare_exchange(&conflicting.exchange)
            .await
            .unwrap();

        let err = publisher(&transport).declare_topology().await.unwrap_err();

        assert!(matches!(
            err,
            PublishError::Transport(TransportError::TopologyMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_publish_change_delivers_full_snapshot() {
        let transport = MemoryTransport::new();
        let publisher = publisher(&transport);
        publisher.declare_topology().await.unwrap();
        let mut sub = transport.subscribe("user_queue").await.unwrap();

        let user = User::new(42, "A", "a@example.com");
        publisher
            .publish_change(ChangeAction::Create, &user)
            .await
            .unwrap();

        let payload: Value = serde_json::from_slice(&sub.next().await.unwrap()).unwrap();
        assert_eq!(payload["action"], json!("create"));
        assert_eq!(payload["user"]["ID"], json!(42));
        assert_eq!(payload["user"]["Name"], json!("A"));
        assert_eq!(payload["user"]["Email"], json!("a@example.com"));
        assert_eq!(payload["user"]["DeletedAt"], Value::Null);
    }

    #[tokio::test]
    async fn test_publish_redeclares_exchange() {
        let transport = MemoryTransport::new();
        let publisher = publisher(&transport);

        publisher
            .publish_change(ChangeAction::Update, &User::new(1, "A", "a@x"))
            .await
            .unwrap();

        // The exchange now exists with the publisher's parameters.
        let mut conflicting = Topology::default();
        conflicting.exchange.durable = false;
        assert!(transport
            .declare_exchange(&conflicting.exchange)
            .await
            .is_err());
    }

    struct StalledTransport;

    #[async_trait]
    impl Transport for StalledTransport {
        async fn declare_exchange(
            &self,
            _exchange: &ExchangeSpec,
        ) -> cachesync_core::transport::Result<()> {
            Ok(())
        }

        async fn declare_queue(&self, _queue: &QueueSpec) -> cachesync_core::transport::Result<()> {
            Ok(())
        }

        async fn bind(&self, _binding: &Binding) -> cachesync_core::transport::Result<()> {
            Ok(())
        }

        async fn publish(
            &self,
            _exchange: &str,
            _routing_key: &str,
            _payload: &[u8],
        ) -> cachesync_core::transport::Result<()> {
            std::future::pending().await
        }

        async fn subscribe(&self, queue: &str) -> cachesync_core::transport::Result<Subscription> {
            Err(TransportError::QueueNotFound(queue.to_string()))
        }
    }

    #[tokio::test]
    async fn test_publish_times_out_on_stalled_transport() {
        let publisher = EventPublisher::new(
            Arc::new(StalledTransport),
            Topology::default(),
            EventSchema::USER,
        )
        .with_timeout(Some(Duration::from_millis(20)));

        let err = publisher
            .publish_change(ChangeAction::Create, &User::new(1, "A", "a@x"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Timeout(d) if d == Duration::from_millis(20)));
    }
}
