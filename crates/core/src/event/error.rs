use thiserror::Error;

/// Reasons a payload cannot be turned into a change event.
///
/// Every variant is terminal for the delivery: the subscriber logs it and
/// moves on, nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed payload: {0}")]
    Malformed(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Invalid field `{field}`: expected {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
    #[error("Bad identity: {0}")]
    BadIdentity(String),
    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

impl DecodeError {
    /// Stable tag for structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            DecodeError::Malformed(_) => "malformed",
            DecodeError::MissingField(_) => "missing_field",
            DecodeError::InvalidField { .. } => "invalid_field",
            DecodeError::BadIdentity(_) => "bad_identity",
            DecodeError::UnknownAction(_) => "unknown_action",
        }
    }
}

/// Errors raised while turning an entity or event into bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Failed to serialize: {0}")]
    Serialize(String),
    #[error("Entity does not serialize to a mapping")]
    NotAMapping,
    #[error("Entity field `{0}` is not a scalar value")]
    NonScalarField(String),
}
