//! Event subscriber: drains the delivery queue into the apply engine.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use cachesync_core::cache::Cache;
use cachesync_core::event::{decode, EventSchema};
use cachesync_core::transport::{declare_topology, Result, Topology, Transport};

use crate::apply::{ApplyEngine, ApplyOutcome};

/// What happened to a single delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Applied(ApplyOutcome),
    /// The delivery was discarded. It will not be redelivered.
    Dropped { reason: &'static str },
}

/// Consumes one queue of a topology and applies every delivery to a cache.
pub struct EventSubscriber<T, C>
where
    T: Transport,
    C: Cache,
{
    transport: Arc<T>,
    topology: Topology,
    schema: EventSchema,
    engine: ApplyEngine<C>,
}

impl<T, C> EventSubscriber<T, C>
where
    T: Transport + 'static,
    C: Cache + 'static,
{
    pub fn new(transport: Arc<T>, topology: Topology, schema: EventSchema, cache: Arc<C>) -> Self {
        Self {
            transport,
            topology,
            schema,
            engine: ApplyEngine::new(cache, schema),
        }
    }

    /// Handles one delivery: decode, then apply.
    ///
    /// Never fails. Payloads that cannot be decoded or applied are logged with
    /// their reason and dropped.
    pub async fn process(&self, payload: &[u8]) -> ProcessOutcome {
        let event = match decode(&self.schema, payload) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(
                    reason = err.reason(),
                    error = %err,
                    bytes = payload.len(),
                    "Dropping undecodable change event"
                );
                return ProcessOutcome::Dropped {
                    reason: err.reason(),
                };
            }
        };

        match self.engine.apply(&event).await {
            Ok(outcome) => ProcessOutcome::Applied(outcome),
            Err(err) => {
                tracing::warn!(
                    reason = err.reason(),
                    error = %err,
                    action = %event.action,
                    entity_id = event.entity_id(),
                    "Dropping change event that could not be applied"
                );
                ProcessOutcome::Dropped {
                    reason: err.reason(),
                }
            }
        }
    }

    /// Declares the topology, subscribes to the queue and spawns the consume
    /// loop.
    ///
    /// Deliveries are processed one at a time in arrival order. The loop
    /// stops when `shutdown` fires or the subscription closes; deliveries
    /// already waiting when shutdown fires are drained first. A closed
    /// subscription ends the returned task, so callers can watch the handle.
    pub async fn start(self, mut shutdown: broadcast::Receiver<()>) -> Result<JoinHandle<()>> {
        declare_topology(self.transport.as_ref(), &self.topology).await?;
        let mut subscription = self.transport.subscribe(&self.topology.queue.name).await?;

        tracing::info!(
            exchange = %self.topology.exchange.name,
            queue = %self.topology.queue.name,
            "Subscriber started"
        );

        Ok(tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    delivery = subscription.next() => match delivery {
                        Some(payload) => {
                            let outcome = self.process(&payload).await;
                            tracing::trace!(?outcome, "Delivery processed");
                        }
                        None => {
                            tracing::error!(
                                queue = %subscription.queue(),
                                "Subscription closed by the transport, no longer consuming"
                            );
                            break;
                        }
                    },
                    _ = shutdown.recv() => {
                        tracing::info!(queue = %subscription.queue(), "Subscriber shutting down");
                        break;
                    }
                }
            }
        }))
    }
}
