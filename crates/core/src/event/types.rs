use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use super::{DecodeError, EncodeError, EventSchema};

/// A record that can be propagated as a change event.
pub trait Entity: Serialize {
    /// The entity's integer identity, unique and immutable once assigned.
    fn id(&self) -> u64;
}

/// What happened to the entity. Closed set: anything else on the wire is a
/// decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    Create,
    Update,
    Delete,
}

impl ChangeAction {
    /// Wire representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeAction::Create => "create",
            ChangeAction::Update => "update",
            ChangeAction::Delete => "delete",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChangeAction {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(ChangeAction::Create),
            "update" => Ok(ChangeAction::Update),
            "delete" => Ok(ChangeAction::Delete),
            other => Err(DecodeError::UnknownAction(other.to_string())),
        }
    }
}

/// Full snapshot of an entity at mutation time.
///
/// `fields` is the entity mapping exactly as it travels on the wire,
/// identity field included. `id` is that identity already parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    id: u64,
    fields: Map<String, Value>,
}

impl EntitySnapshot {
    /// Builds a snapshot from an already validated identity and mapping.
    pub fn new(id: u64, fields: Map<String, Value>) -> Self {
        Self { id, fields }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// The unit of propagation: an action and the entity it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub action: ChangeAction,
    pub entity: EntitySnapshot,
}

impl ChangeEvent {
    pub fn new(action: ChangeAction, entity: EntitySnapshot) -> Self {
        Self { action, entity }
    }

    /// Snapshots a typed entity into a change event.
    ///
    /// The identity field named by `schema` is always written from
    /// [`Entity::id`], so the snapshot stays decodable even if the entity's
    /// own serialization names its key differently.
    pub fn from_entity<E: Entity>(
        schema: &EventSchema,
        action: ChangeAction,
        entity: &E,
    ) -> Result<Self, EncodeError> {
        let value =
            serde_json::to_value(entity).map_err(|e| EncodeError::Serialize(e.to_string()))?;
        let Value::Object(mut fields) = value else {
            return Err(EncodeError::NotAMapping);
        };

        let id = entity.id();
        fields.insert(schema.identity_field.to_string(), Value::from(id));

        Ok(Self::new(action, EntitySnapshot::new(id, fields)))
    }

    /// Identity of the entity this event is about.
    pub fn entity_id(&self) -> u64 {
        self.entity.id()
    }
}
