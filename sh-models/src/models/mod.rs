//! Entity model definitions.

pub mod user;
pub mod doctor;
pub mod condition;
pub mod appointment;
pub mod message;
pub mod notification;
pub mod assessment;
pub mod test_result;
pub mod settings;

use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;

/// Current UTC time as a fixed-width RFC 3339 string.
///
/// Millisecond precision with a `Z` suffix keeps lexicographic order equal
/// to chronological order, which the `ORDER BY timestamp` queries rely on.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Read a TEXT column and parse it into a string-backed enum.
pub(crate) fn text_enum<T: FromStr>(row: &Row<'_>, column: &str) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    raw.parse::<T>().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            Type::Text,
            format!("invalid value '{raw}' in column {column}").into(),
        )
    })
}

/// Read a TEXT column holding JSON.
pub(crate) fn json_column<T: serde::de::DeserializeOwned>(
    row: &Row<'_>,
    column: &str,
) -> rusqlite::Result<T> {
    let raw: String = row.get(column)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_fixed_width() {
        let a = now_timestamp();
        assert!(a.ends_with('Z'));
        assert_eq!(a.len(), "2026-10-18T09:30:00.000Z".len());
    }
}
