use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Where a subscription pulls its deliveries from.
///
/// `recv` must be cancel-safe: a payload leaves the queue only in the poll
/// that returns it, so dropping a pending `recv` loses nothing.
#[async_trait]
pub trait DeliverySource: Send {
    /// Waits for the next payload, `None` once the queue is gone.
    async fn recv(&mut self) -> Option<Vec<u8>>;
}

#[async_trait]
impl DeliverySource for mpsc::Receiver<Vec<u8>> {
    async fn recv(&mut self) -> Option<Vec<u8>> {
        mpsc::Receiver::recv(self).await
    }
}

/// A live subscription to one queue.
///
/// Deliveries are auto-acknowledged: once [`Subscription::next`] hands a
/// payload over, the transport considers it delivered. Payloads published
/// while nobody is subscribed wait in the queue.
pub struct Subscription {
    queue: String,
    source: Box<dyn DeliverySource>,
}

impl Subscription {
    pub fn new(queue: impl Into<String>, source: impl DeliverySource + 'static) -> Self {
        Self {
            queue: queue.into(),
            source: Box::new(source),
        }
    }

    /// The queue this subscription reads from.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Waits for the next delivery.
    ///
    /// Returns `None` once the transport closes the subscription.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        self.source.recv().await
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}
