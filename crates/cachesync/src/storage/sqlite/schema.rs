//! SQLite schema definitions and SQL query constants.
//!
//! Pure data, no I/O.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    email TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    deleted_at TEXT
);

CREATE INDEX IF NOT EXISTS idx_users_deleted_at ON users(deleted_at);
"#;

/// Selects a live user by id.
pub const SELECT_LIVE_USER: &str = r#"
SELECT id, name, email, created_at, updated_at, deleted_at
FROM users
WHERE id = ?1 AND deleted_at IS NULL
"#;

/// Selects a user by id regardless of soft-delete state.
pub const SELECT_ANY_USER: &str = r#"
SELECT id, name, email, created_at, updated_at, deleted_at
FROM users
WHERE id = ?1
"#;

pub const INSERT_USER: &str = r#"
INSERT INTO users (name, email, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4)
"#;

pub const UPDATE_USER: &str = r#"
UPDATE users
SET name = ?2, email = ?3, updated_at = ?4
WHERE id = ?1 AND deleted_at IS NULL
"#;

pub const SOFT_DELETE_USER: &str = r#"
UPDATE users
SET deleted_at = ?2
WHERE id = ?1 AND deleted_at IS NULL
"#;
