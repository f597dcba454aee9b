//! JSON wire codec for change events.
//!
//! Wire shape, with `user` standing for the schema's entity field:
//!
//! ```json
//! { "action": "create", "user": { "ID": 42, "Name": "A" } }
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Number, Value};

use super::{
    ChangeAction, ChangeEvent, DecodeError, EncodeError, EntitySnapshot, EventSchema, ACTION_FIELD,
};

/// Borrowed view of an event in wire shape, so encoding never clones the
/// entity mapping.
struct WirePayload<'a> {
    schema: &'a EventSchema,
    event: &'a ChangeEvent,
}

impl Serialize for WirePayload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(ACTION_FIELD, self.event.action.as_str())?;
        map.serialize_entry(self.schema.entity_field, self.event.entity.fields())?;
        map.end()
    }
}

/// Encodes a change event into its wire payload.
///
/// # Errors
///
/// Returns `EncodeError::NonScalarField` if any entity field holds a mapping
/// or a sequence. Entities are flat records of scalars.
pub fn encode(schema: &EventSchema, event: &ChangeEvent) -> Result<Vec<u8>, EncodeError> {
    ensure_scalar_fields(event.entity.fields())?;

    serde_json::to_vec(&WirePayload { schema, event })
        .map_err(|e| EncodeError::Serialize(e.to_string()))
}

/// Decodes a wire payload into a change event.
///
/// Checks run in a fixed order (action type, entity mapping, identity,
/// action value) and the first failure wins.
pub fn decode(schema: &EventSchema, bytes: &[u8]) -> Result<ChangeEvent, DecodeError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let Value::Object(mut payload) = value else {
        return Err(DecodeError::Malformed(
            "payload is not a mapping".to_string(),
        ));
    };

    let action = match payload.remove(ACTION_FIELD) {
        Some(Value::String(action)) => action,
        Some(_) => {
            return Err(DecodeError::InvalidField {
                field: ACTION_FIELD,
                expected: "string",
            })
        }
        None => return Err(DecodeError::MissingField(ACTION_FIELD)),
    };

    let fields = match payload.remove(schema.entity_field) {
        Some(Value::Object(fields)) => fields,
        Some(_) => {
            return Err(DecodeError::InvalidField {
                field: schema.entity_field,
                expected: "mapping",
            })
        }
        None => return Err(DecodeError::MissingField(schema.entity_field)),
    };

    let id = parse_identity(schema.identity_field, fields.get(schema.identity_field))?;
    let action = action.parse::<ChangeAction>()?;

    Ok(ChangeEvent::new(action, EntitySnapshot::new(id, fields)))
}

/// Serializes an entity snapshot into the opaque cache value.
pub fn serialize_entity(entity: &EntitySnapshot) -> Result<Vec<u8>, EncodeError> {
    serde_json::to_vec(entity.fields()).map_err(|e| EncodeError::Serialize(e.to_string()))
}

fn ensure_scalar_fields(fields: &Map<String, Value>) -> Result<(), EncodeError> {
    match fields
        .iter()
        .find(|(_, value)| matches!(value, Value::Array(_) | Value::Object(_)))
    {
        Some((name, _)) => Err(EncodeError::NonScalarField(name.clone())),
        None => Ok(()),
    }
}

/// Coerces the identity field to a non-negative integer.
///
/// JSON numbers with an integral value are accepted even when written as
/// floats (`42.0`), since some producers emit every number as a double.
fn parse_identity(field: &str, value: Option<&Value>) -> Result<u64, DecodeError> {
    let number = match value {
        Some(Value::Number(number)) => number,
        Some(other) => {
            return Err(DecodeError::BadIdentity(format!(
                "`{field}` is not numeric: {other}"
            )))
        }
        None => return Err(DecodeError::BadIdentity(format!("`{field}` is missing"))),
    };

    integral_u64(number).ok_or_else(|| {
        DecodeError::BadIdentity(format!("`{field}` is not a non-negative integer: {number}"))
    })
}

fn integral_u64(number: &Number) -> Option<u64> {
    if let Some(id) = number.as_u64() {
        return Some(id);
    }
    let float = number.as_f64()?;
    if float.is_finite() && float >= 0.0 && float.fract() == 0.0 && float < u64::MAX as f64 {
        Some(float as u64)
    } else {
        None
    }
}
