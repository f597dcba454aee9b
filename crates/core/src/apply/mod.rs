//! Pure planning step of the apply engine.
//!
//! Turns a decoded change event into the single cache command that brings the
//! replica in line with it. Executing the command is the caller's job.

use crate::event::{serialize_entity, ChangeAction, ChangeEvent, EncodeError, EventSchema};

/// One single-key cache mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheCommand {
    /// Upsert `value` at `key`.
    Set { key: String, value: Vec<u8> },
    /// Remove `key`. A no-op when the key is absent.
    Delete { key: String },
}

/// Plans the cache mutation for an event.
///
/// Create and update share one meaning (overwrite with the full snapshot);
/// delete only needs the identity. Events carry no version, so whatever is
/// applied last wins.
pub fn plan(schema: &EventSchema, event: &ChangeEvent) -> Result<CacheCommand, EncodeError> {
    let key = schema.cache_key(event.entity_id());

    match event.action {
        ChangeAction::Create | ChangeAction::Update => Ok(CacheCommand::Set {
            key,
            value: serialize_entity(&event.entity)?,
        }),
        ChangeAction::Delete => Ok(CacheCommand::Delete { key }),
    }
}
