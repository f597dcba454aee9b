mod types;

pub use types::{NewUser, User};
