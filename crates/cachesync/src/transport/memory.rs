//! In-memory fan-out transport.
//!
//! Each declared queue owns a FIFO buffer; publishing to an exchange appends
//! a copy of the payload to every queue bound to it. Payloads wait in the
//! buffer until a subscriber takes them, so nothing published to a bound
//! queue is lost while no consumer is attached.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, RwLock};

use cachesync_core::transport::{
    Binding, DeliverySource, ExchangeSpec, QueueSpec, Result, Subscription, Transport,
    TransportError,
};

#[derive(Debug)]
struct ExchangeState {
    spec: ExchangeSpec,
    queues: BTreeSet<String>,
}

/// Pending payloads of one queue.
#[derive(Debug, Default)]
struct QueueBuffer {
    items: Mutex<VecDeque<Vec<u8>>>,
    ready: Notify,
}

impl QueueBuffer {
    async fn push(&self, payload: Vec<u8>) {
        self.items.lock().await.push_back(payload);
        self.ready.notify_one();
    }

    /// Waits for the oldest payload. Cancel-safe: the payload is removed in
    /// the same poll that returns it.
    async fn pop(&self) -> Vec<u8> {
        loop {
            {
                let mut items = self.items.lock().await;
                if let Some(payload) = items.pop_front() {
                    if !items.is_empty() {
                        self.ready.notify_one();
                    }
                    return payload;
                }
            }
            self.ready.notified().await;
        }
    }

    async fn len(&self) -> usize {
        self.items.lock().await.len()
    }
}

/// Reads one queue's buffer on behalf of a subscription.
struct QueueReader {
    buffer: Arc<QueueBuffer>,
}

#[async_trait]
impl DeliverySource for QueueReader {
    async fn recv(&mut self) -> Option<Vec<u8>> {
        Some(self.buffer.pop().await)
    }
}

#[derive(Debug)]
struct QueueState {
    spec: QueueSpec,
    buffer: Arc<QueueBuffer>,
}

#[derive(Debug, Default)]
struct Broker {
    exchanges: HashMap<String, ExchangeState>,
    queues: HashMap<String, QueueState>,
}

/// In-memory transport implementation.
///
/// Clones share the same broker, so a publisher and a subscriber built from
/// clones of one instance talk to each other.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    broker: Arc<RwLock<Broker>>,
}

impl MemoryTransport {
    /// Creates an empty broker with no exchanges or queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of payloads waiting in a queue, `None` if it is not declared.
    pub async fn pending(&self, queue: &str) -> Option<usize> {
        let buffer = self.broker.read().await.queues.get(queue)?.buffer.clone();
        Some(buffer.len().await)
    }
}

fn mismatch<T: std::fmt::Debug>(name: &str, existing: &T, requested: &T) -> TransportError {
    TransportError::TopologyMismatch {
        name: name.to_string(),
        detail: format!("existing {:?}, requested {:?}", existing, requested),
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn declare_exchange(&self, exchange: &ExchangeSpec) -> Result<()> {
        let mut broker = self.broker.write().await;

        match broker.exchanges.get(&exchange.name) {
            Some(state) if state.spec == *exchange => Ok(()),
            Some(state) => Err(mismatch(&exchange.name, &state.spec, exchange)),
            None => {
                broker.exchanges.insert(
                    exchange.name.clone(),
                    ExchangeState {
                        spec: exchange.clone(),
                        queues: BTreeSet::new(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn declare_queue(&self, queue: &QueueSpec) -> Result<()> {
        let mut broker = self.broker.write().await;

        match broker.queues.get(&queue.name) {
            Some(state) if state.spec == *queue => Ok(()),
            Some(state) => Err(mismatch(&queue.name, &state.spec, queue)),
            None => {
                broker.queues.insert(
                    queue.name.clone(),
                    QueueState {
                        spec: queue.clone(),
                        buffer: Arc::default(),
                    },
                );
                Ok(())
            }
        }
    }

    async fn bind(&self, binding: &Binding) -> Result<()> {
        let mut broker = self.broker.write().await;

        if !broker.queues.contains_key(&binding.queue) {
            return Err(TransportError::QueueNotFound(binding.queue.clone()));
        }
        let exchange = broker
            .exchanges
            .get_mut(&binding.exchange)
            .ok_or_else(|| TransportError::ExchangeNotFound(binding.exchange.clone()))?;

        // Fanout exchanges ignore the routing key, so a binding is just the
        // queue name.
        exchange.queues.insert(binding.queue.clone());
        Ok(())
    }

    async fn publish(&self, exchange: &str, _routing_key: &str, payload: &[u8]) -> Result<()> {
        let broker = self.broker.read().await;

        let state = broker
            .exchanges
            .get(exchange)
            .ok_or_else(|| TransportError::ExchangeNotFound(exchange.to_string()))?;

        for queue in &state.queues {
            if let Some(queue_state) = broker.queues.get(queue) {
                queue_state.buffer.push(payload.to_vec()).await;
            }
        }

        tracing::trace!(exchange, queues = state.queues.len(), "Payload published");
        Ok(())
    }

    async fn subscribe(&self, queue: &str) -> Result<Subscription> {
        let broker = self.broker.read().await;

        let state = broker
            .queues
            .get(queue)
            .ok_or_else(|| TransportError::QueueNotFound(queue.to_string()))?;

        Ok(Subscription::new(
            queue,
            QueueReader {
                buffer: state.buffer.clone(),
            },
        ))
    }
}
