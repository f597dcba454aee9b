use thiserror::Error;

/// Errors that can occur while talking to the fan-out transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Transport connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Transport operation failed: {0}")]
    OperationFailed(String),
    #[error("Exchange not found: {0}")]
    ExchangeNotFound(String),
    #[error("Queue not found: {0}")]
    QueueNotFound(String),
    #[error("{name} already declared with different parameters: {detail}")]
    TopologyMismatch { name: String, detail: String },
    #[error("Publish failed: {0}")]
    PublishFailed(String),
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
