//! CLI command implementations.

pub mod account;
pub mod doctors;
pub mod conditions;
pub mod assess;
pub mod appointments;
pub mod messages;
pub mod notifications;
pub mod results;
pub mod admin;
pub mod db;

use chrono::NaiveDate;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use sh_core::config::ConfigHandle;
use sh_core::error::{ShError, ShResult};
use sh_models::Database;

/// Open (and on first run create and seed) the configured database.
pub async fn init_database(config: &ConfigHandle) -> ShResult<Database> {
    let config = config.read().await;
    let db_path = config.effective_db_path()?;
    Database::init(&db_path, &config.database)
}

/// A table with the standard CLI look.
pub fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Pretty-print any serializable value as JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> ShResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a `YYYY-MM-DD` argument.
pub fn parse_date(raw: &str) -> ShResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ShError::Validation(format!("expected a date like 2026-10-19, got {raw}")))
}

/// Map an interactive prompt failure into the app error type.
pub fn prompt_error(e: dialoguer::Error) -> ShError {
    ShError::Internal(format!("prompt failed: {e}"))
}

/// Truncate a string to a maximum number of characters, appending an ellipsis if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    } else {
        s.chars().take(max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date(" 2026-10-19 ").unwrap(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert!(matches!(parse_date("19/10/2026"), Err(ShError::Validation(_))));
    }
}
