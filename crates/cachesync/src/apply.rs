//! Apply engine: executes planned cache commands against a cache backend.

use std::sync::Arc;

use thiserror::Error;

use cachesync_core::apply::{plan, CacheCommand};
use cachesync_core::cache::{Cache, CacheError};
use cachesync_core::event::{ChangeEvent, EncodeError, EventSchema};

/// Errors raised while applying an event to the cache.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("Failed to encode entity for cache: {0}")]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl ApplyError {
    /// Stable tag for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            ApplyError::Encode(_) => "encode_failed",
            ApplyError::Cache(_) => "cache_failed",
        }
    }
}

/// What an applied event did to the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The key now holds the event's snapshot.
    Upserted { key: String },
    /// The key is gone (or was never there).
    Removed { key: String },
}

/// Brings one cache replica in line with a stream of change events.
///
/// Every event turns into exactly one single-key command, so applying the
/// same event twice leaves the cache as applying it once. There is no
/// version check: the last event applied for a key wins.
pub struct ApplyEngine<C: Cache> {
    cache: Arc<C>,
    schema: EventSchema,
}

impl<C: Cache> ApplyEngine<C> {
    pub fn new(cache: Arc<C>, schema: EventSchema) -> Self {
        Self { cache, schema }
    }

    pub async fn apply(&self, event: &ChangeEvent) -> Result<ApplyOutcome, ApplyError> {
        match plan(&self.schema, event)? {
            CacheCommand::Set { key, value } => {
                self.cache.set(&key, &value).await?;
                tracing::debug!(key = %key, action = %event.action, "Cache record upserted");
                Ok(ApplyOutcome::Upserted { key })
            }
            CacheCommand::Delete { key } => {
                self.cache.delete(&key).await?;
                tracing::debug!(key = %key, "Cache record removed");
                Ok(ApplyOutcome::Removed { key })
            }
        }
    }
}
