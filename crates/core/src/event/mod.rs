//! Change events and their wire codec.
//!
//! A change event is the unit of propagation between the record store and
//! the cache replicas: an action plus a full snapshot of the entity. The codec
//! is total on the decode side, every malformed payload maps to a typed
//! [`DecodeError`] the caller can log before dropping the delivery.

mod codec;
mod error;
mod schema;
mod types;

pub use codec::{decode, encode, serialize_entity};
pub use error::{DecodeError, EncodeError};
pub use schema::{EventSchema, ACTION_FIELD};
pub use types::{ChangeAction, ChangeEvent, Entity, EntitySnapshot};
