use crate::cache::cache_key;

/// Name of the payload field carrying the action.
pub const ACTION_FIELD: &str = "action";

/// Describes how one entity type appears on the wire and in the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSchema {
    /// Payload field holding the entity mapping (e.g. `"user"`).
    pub entity_field: &'static str,
    /// Field inside the entity mapping holding the integer identity.
    pub identity_field: &'static str,
    /// Prefix of derived cache keys.
    pub key_prefix: &'static str,
}

impl EventSchema {
    /// Schema of the `user` payload: `{"action": .., "user": {"ID": .., ..}}`.
    pub const USER: EventSchema = EventSchema {
        entity_field: "user",
        identity_field: "ID",
        key_prefix: "user",
    };

    /// Derives the cache key for an entity of this schema.
    pub fn cache_key(&self, id: u64) -> String {
        cache_key(self.key_prefix, id)
    }
}
