/// Returns the cache key for an entity: `"{prefix}-{id}"`.
///
/// # Examples
///
/// ```
/// use cachesync_core::cache::cache_key;
///
/// assert_eq!(cache_key("user", 7), "user-7");
/// ```
pub fn cache_key(prefix: &str, id: u64) -> String {
    format!("{}-{}", prefix, id)
}

/// Returns the cache key for a user.
pub fn user_key(user_id: u64) -> String {
    cache_key("user", user_id)
}
