//! Row to domain type conversions for SQLite.

use chrono::{DateTime, Utc};
use rusqlite::Row;

use cachesync_core::user::User;

/// Parses an RFC 3339 datetime string stored in SQLite.
fn parse_datetime(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Formats a datetime for storage in SQLite.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Converts a user id to the signed rowid SQLite stores.
///
/// Ids above `i64::MAX` cannot exist in the table, so callers treat `None` as
/// not found.
pub fn to_rowid(id: u64) -> Option<i64> {
    i64::try_from(id).ok()
}

/// Converts a SQLite row to a `User`.
///
/// Expects columns in order: id, name, email, created_at, updated_at, deleted_at
pub fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let rowid: i64 = row.get(0)?;
    let id = u64::try_from(rowid).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Integer, Box::new(e))
    })?;
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;
    let deleted_at: Option<String> = row.get(5)?;

    Ok(User {
        id,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
        deleted_at: deleted_at.as_deref().map(parse_datetime).transpose()?,
    })
}
