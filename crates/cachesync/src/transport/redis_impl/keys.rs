//! Redis key names backing the transport topology and queues.

/// Key holding an exchange declaration.
pub fn exchange_key(exchange: &str) -> String {
    format!("cachesync:exchange:{}", exchange)
}

/// Key holding a queue declaration.
pub fn queue_key(queue: &str) -> String {
    format!("cachesync:queue:{}", queue)
}

/// Set of queue names bound to an exchange.
pub fn bindings_key(exchange: &str) -> String {
    format!("cachesync:bindings:{}", exchange)
}

/// List holding a queue's pending payloads, oldest at the right end.
pub fn queue_list(queue: &str) -> String {
    format!("cachesync:queue:{}:pending", queue)
}
