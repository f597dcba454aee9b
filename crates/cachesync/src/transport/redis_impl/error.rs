//! Redis error mapping to TransportError.

use cachesync_core::transport::TransportError;

/// Maps Redis errors to TransportError.
pub fn map_redis_error(err: redis::RedisError) -> TransportError {
    if err.is_connection_refusal() || err.is_timeout() || err.is_connection_dropped() {
        TransportError::ConnectionFailed(err.to_string())
    } else {
        TransportError::OperationFailed(err.to_string())
    }
}
