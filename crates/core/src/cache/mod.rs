mod error;
mod keys;
mod traits;

pub use error::{CacheError, Result};
pub use keys::{cache_key, user_key};
pub use traits::Cache;
