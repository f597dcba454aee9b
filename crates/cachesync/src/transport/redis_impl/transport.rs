//! Redis transport implementation.

use std::fmt::Debug;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;

use cachesync_core::transport::{
    Binding, ExchangeSpec, QueueSpec, Result, Subscription, Transport, TransportError,
};

use super::error::map_redis_error;
use super::keys::{bindings_key, exchange_key, queue_key, queue_list};

/// Payloads handed from the consumer task to its subscription at a time.
/// Everything else stays in the Redis list.
const HANDOVER_CAPACITY: usize = 1;

/// Seconds one BRPOP blocks before the consumer checks its subscription is
/// still alive.
const POP_TIMEOUT_SECS: u64 = 1;

/// Redis-backed fan-out transport.
///
/// Every queue is a Redis list: publish pushes onto the list of each bound
/// queue, a subscription pops from the other end. Payloads published while
/// no consumer runs wait in the list.
///
/// Every command runs on a freshly opened connection, publish included: a
/// publisher pays a connection handshake per event and a stalled Redis
/// blocks the caller for as long as the handshake takes.
pub struct RedisTransport {
    client: redis::Client,
}

impl RedisTransport {
    /// Creates a new Redis transport.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    ///
    /// # Errors
    ///
    /// Returns `TransportError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;

        // Verify connection by getting a connection
        let _ = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;

        Ok(Self { client })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)
    }

    /// Stores `spec` under `key` unless something is already there, in which
    /// case the stored declaration must be equal to `spec`.
    async fn declare<S>(&self, key: &str, name: &str, spec: &S) -> Result<()>
    where
        S: Serialize + DeserializeOwned + PartialEq + Debug + Sync,
    {
        let encoded = serde_json::to_string(spec)
            .map_err(|e| TransportError::OperationFailed(e.to_string()))?;

        let mut conn = self.connection().await?;

        // SETNX makes concurrent first declarations race-free.
        let created: bool = conn
            .set_nx(key, &encoded)
            .await
            .map_err(map_redis_error)?;
        if created {
            return Ok(());
        }

        let existing: Option<String> = conn.get(key).await.map_err(map_redis_error)?;
        let Some(existing) = existing else {
            return Ok(());
        };

        match serde_json::from_str::<S>(&existing) {
            Ok(stored) if stored == *spec => Ok(()),
            Ok(stored) => Err(TransportError::TopologyMismatch {
                name: name.to_string(),
                detail: format!("existing {:?}, requested {:?}", stored, spec),
            }),
            Err(e) => Err(TransportError::TopologyMismatch {
                name: name.to_string(),
                detail: format!("unreadable declaration: {}", e),
            }),
        }
    }

    async fn ensure_exists(&self, key: &str, missing: TransportError) -> Result<()> {
        let mut conn = self.connection().await?;
        let exists: bool = conn.exists(key).await.map_err(map_redis_error)?;
        if exists {
            Ok(())
        } else {
            Err(missing)
        }
    }
}

#[async_trait]
impl Transport for RedisTransport {
    async fn declare_exchange(&self, exchange: &ExchangeSpec) -> Result<()> {
        self.declare(&exchange_key(&exchange.name), &exchange.name, exchange)
            .await
    }

    async fn declare_queue(&self, queue: &QueueSpec) -> Result<()> {
        self.declare(&queue_key(&queue.name), &queue.name, queue)
            .await
    }

    async fn bind(&self, binding: &Binding) -> Result<()> {
        self.ensure_exists(
            &queue_key(&binding.queue),
            TransportError::QueueNotFound(binding.queue.clone()),
        )
        .await?;
        self.ensure_exists(
            &exchange_key(&binding.exchange),
            TransportError::ExchangeNotFound(binding.exchange.clone()),
        )
        .await?;

        let mut conn = self.connection().await?;
        conn.sadd::<_, _, ()>(bindings_key(&binding.exchange), &binding.queue)
            .await
            .map_err(map_redis_error)
    }

    async fn publish(&self, exchange: &str, _routing_key: &str, payload: &[u8]) -> Result<()> {
        let mut conn = self.connection().await?;

        let exists: bool = conn
            .exists(exchange_key(exchange))
            .await
            .map_err(map_redis_error)?;
        if !exists {
            return Err(TransportError::ExchangeNotFound(exchange.to_string()));
        }

        // Fanout: one copy per bound queue. Not atomic with the lookup, a
        // queue bound concurrently may miss this message.
        let queues: Vec<String> = conn
            .smembers(bindings_key(exchange))
            .await
            .map_err(map_redis_error)?;

        for queue in &queues {
            conn.lpush::<_, _, ()>(queue_list(queue), payload)
                .await
                .map_err(|e| TransportError::PublishFailed(e.to_string()))?;
        }

        tracing::trace!(exchange, queues = queues.len(), "Payload published");
        Ok(())
    }

    async fn subscribe(&self, queue: &str) -> Result<Subscription> {
        self.ensure_exists(
            &queue_key(queue),
            TransportError::QueueNotFound(queue.to_string()),
        )
        .await?;

        // BRPOP blocks its connection, so every consumer gets its own.
        let conn = self.connection().await?;
        let (tx, rx) = mpsc::channel(HANDOVER_CAPACITY);

        tokio::spawn(run_queue_consumer(conn, queue.to_string(), tx));

        Ok(Subscription::new(queue, rx))
    }
}

/// Moves payloads from a queue's Redis list to its subscription, one at a
/// time, until the subscription is dropped or Redis fails.
///
/// A slot in the hand-over channel is reserved before popping, so a payload
/// only leaves Redis when the subscription can take it right away. A payload
/// popped after the subscription went away is pushed back.
async fn run_queue_consumer(
    mut conn: MultiplexedConnection,
    queue: String,
    tx: mpsc::Sender<Vec<u8>>,
) {
    let list = queue_list(&queue);

    'consume: while let Ok(permit) = tx.reserve().await {
        let payload = loop {
            if tx.is_closed() {
                break 'consume;
            }
            let popped: redis::RedisResult<Option<(String, Vec<u8>)>> = redis::cmd("BRPOP")
                .arg(&list)
                .arg(POP_TIMEOUT_SECS)
                .query_async(&mut conn)
                .await;
            match popped {
                Ok(Some((_, payload))) => break payload,
                Ok(None) => continue,
                Err(err) => {
                    tracing::error!(%queue, error = %err, "Redis queue consumer failed");
                    break 'consume;
                }
            }
        };

        if tx.is_closed() {
            if let Err(err) = conn.rpush::<_, _, ()>(&list, &payload).await {
                tracing::error!(%queue, error = %err, "Failed to return undelivered payload, it is lost");
            }
            break;
        }
        permit.send(payload);
    }

    tracing::debug!(%queue, "Redis queue consumer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use cachesync_core::transport::{declare_topology, Topology};
    use serial_test::serial;
    use std::time::Duration;
    use uuid::Uuid;

    /// Helper to get Redis URL from environment.
    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    /// Skip test if Redis not available.
    async fn get_test_transport() -> Option<RedisTransport> {
        RedisTransport::new(&redis_url()).await.ok()
    }

    /// A topology with unique names so tests don't see each other.
    fn test_topology() -> Topology {
        let id = Uuid::new_v4();
        Topology::new(format!("test_exchange_{}", id), format!("test_queue_{}", id))
    }

    #[tokio::test]
    #[serial(env)]
    async fn test_redis_publish_and_receive() {
        let Some(transport) = get_test_transport().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let topology = test_topology();
        declare_topology(&transport, &topology).await.unwrap();

        let mut subscription = transport.subscribe(&topology.queue.name).await.unwrap();

        transport
            .publish(&topology.exchange.name, "", b"hello")
            .await
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), subscription.next()).await;
        match received {
            Ok(Some(payload)) => assert_eq!(payload, b"hello".to_vec()),
            Ok(None) => panic!("Subscription closed"),
            Err(_) => panic!("Timeout waiting for payload"),
        }
    }

    #[tokio::test]
    #[serial(env)]
    async fn test_redis_declare_is_idempotent() {
        let Some(transport) = get_test_transport().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let topology = test_topology();
        declare_topology(&transport, &topology).await.unwrap();
        declare_topology(&transport, &topology).await.unwrap();

        let mut exchange = topology.exchange.clone();
        exchange.durable = false;
        let err = transport.declare_exchange(&exchange).await.unwrap_err();
        assert!(matches!(err, TransportError::TopologyMismatch { .. }));
    }

    #[tokio::test]
    #[serial(env)]
    async fn test_redis_publish_to_undeclared_exchange() {
        let Some(transport) = get_test_transport().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let name = format!("missing_{}", Uuid::new_v4());
        let err = transport.publish(&name, "", b"x").await.unwrap_err();
        assert_eq!(err, TransportError::ExchangeNotFound(name));
    }

    #[tokio::test]
    #[serial(env)]
    async fn test_redis_subscribe_to_undeclared_queue() {
        let Some(transport) = get_test_transport().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let name = format!("missing_{}", Uuid::new_v4());
        let err = transport.subscribe(&name).await.unwrap_err();
        assert_eq!(err, TransportError::QueueNotFound(name));
    }

    #[tokio::test]
    #[serial(env)]
    async fn test_redis_queue_holds_payloads_until_subscribed() {
        let Some(transport) = get_test_transport().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let topology = test_topology();
        declare_topology(&transport, &topology).await.unwrap();
        let delete = br#"{"action":"delete","user":{"ID":42}}"#;
        transport
            .publish(&topology.exchange.name, "", delete)
            .await
            .unwrap();
        transport
            .publish(&topology.exchange.name, "", b"second")
            .await
            .unwrap();

        let mut subscription = transport.subscribe(&topology.queue.name).await.unwrap();

        for expected in [delete.to_vec(), b"second".to_vec()] {
            let received = tokio::time::timeout(Duration::from_secs(3), subscription.next())
                .await
                .expect("queued payload should be delivered");
            assert_eq!(received, Some(expected));
        }
    }

    #[tokio::test]
    #[serial(env)]
    async fn test_redis_dropped_subscription_leaves_payloads_queued() {
        let Some(transport) = get_test_transport().await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let topology = test_topology();
        declare_topology(&transport, &topology).await.unwrap();

        let subscription = transport.subscribe(&topology.queue.name).await.unwrap();
        drop(subscription);
        // Give the consumer a pop timeout to notice the subscription is gone.
        tokio::time::sleep(Duration::from_millis(1500)).await;

        transport
            .publish(&topology.exchange.name, "", b"kept")
            .await
            .unwrap();

        let mut conn = transport.connection().await.unwrap();
        let pending: Vec<Vec<u8>> = conn
            .lrange(queue_list(&topology.queue.name), 0, -1)
            .await
            .unwrap();
        assert_eq!(pending, vec![b"kept".to_vec()]);
    }
}
