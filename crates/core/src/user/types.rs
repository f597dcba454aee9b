use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::Entity;

/// A user record as owned by the record store.
///
/// Field names serialize in PascalCase (`ID`, `Name`, `CreatedAt`, ...) because
/// that is the shape every producer and consumer of the `user` wire payload
/// agrees on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct User {
    #[serde(rename = "ID")]
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker. Set by the store when the user is deleted.
    pub deleted_at: Option<DateTime<Utc>>,
    pub name: String,
    pub email: String,
}

impl User {
    /// Creates a user with the given identity, stamped with the current time.
    pub fn new(id: u64, name: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Sets the name for this user.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the email for this user.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// Returns true if the store has soft-deleted this user.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl Entity for User {
    fn id(&self) -> u64 {
        self.id
    }
}

/// Fields supplied by the caller when creating a user. The store assigns the
/// identity and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Materializes the record the store will persist under `id`.
    pub fn into_user(self, id: u64) -> User {
        User::new(id, self.name, self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_user_serializes_with_pascal_case_fields() {
        let user = User {
            created_at: fixed_timestamp(),
            updated_at: fixed_timestamp(),
            ..User::new(42, "A", "a@example.com")
        };

        let value = serde_json::to_value(&user).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["ID"], 42);
        assert_eq!(object["Name"], "A");
        assert_eq!(object["Email"], "a@example.com");
        assert!(object["DeletedAt"].is_null());
        assert_eq!(object["CreatedAt"], "2024-06-15T10:30:00Z");
        assert_eq!(object["UpdatedAt"], "2024-06-15T10:30:00Z");
    }

    #[test]
    fn test_user_deserializes_from_wire_shape() {
        let json = r#"{
            "ID": 7,
            "CreatedAt": "2024-06-15T10:30:00Z",
            "UpdatedAt": "2024-06-15T10:30:00Z",
            "DeletedAt": null,
            "Name": "Bob",
            "Email": "bob@example.com"
        }"#;

        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.id, 7);
        assert_eq!(user.name, "Bob");
        assert_eq!(user.created_at, fixed_timestamp());
        assert!(!user.is_deleted());
    }

    #[test]
    fn test_new_user_into_user() {
        let user = NewUser::new("Carol", "carol@example.com").into_user(3);

        assert_eq!(user.id, 3);
        assert_eq!(user.name, "Carol");
        assert_eq!(user.created_at, user.updated_at);
        assert!(user.deleted_at.is_none());
    }

    #[test]
    fn test_entity_id() {
        let user = User::new(99, "D", "d@example.com");
        assert_eq!(Entity::id(&user), 99);
    }
}
