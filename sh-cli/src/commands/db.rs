//! Database management commands.

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;

use sh_core::error::ShResult;
use sh_services::ServiceRegistry;

use super::prompt_error;
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DbAction {
    /// Show database statistics.
    Stats,
    /// Run an integrity check.
    Check,
    /// Reset the database (WARNING: destroys all data).
    Reset {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the database file path.
    Path,
}

pub async fn run(registry: &ServiceRegistry, action: DbAction, format: OutputFormat) -> ShResult<()> {
    let db_path = registry.config.read().await.effective_db_path()?;
    let db = &registry.database;

    match action {
        DbAction::Stats => {
            let stats = db.stats()?;
            let file_size = std::fs::metadata(&db_path).ok().map(|m| m.len());

            let conn = db.conn()?;
            let journal_mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_else(|_| "unknown".to_string());
            let page_count: i64 = conn
                .query_row("PRAGMA page_count", [], |row| row.get(0))
                .unwrap_or(0);
            drop(conn);

            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "path": db_path.display().to_string(),
                    "tables": stats,
                    "file_size_bytes": file_size,
                    "journal_mode": journal_mode,
                    "page_count": page_count,
                })),
                OutputFormat::Text => {
                    let mut table = super::new_table(vec!["Table", "Rows"]);
                    table.add_row(vec!["users".to_string(), stats.users.to_string()]);
                    table.add_row(vec!["doctors".to_string(), stats.doctors.to_string()]);
                    table.add_row(vec!["appointments".to_string(), stats.appointments.to_string()]);
                    table.add_row(vec!["messages".to_string(), stats.messages.to_string()]);
                    table.add_row(vec!["notifications".to_string(), stats.notifications.to_string()]);
                    table.add_row(vec!["test_results".to_string(), stats.test_results.to_string()]);
                    println!("{table}");

                    println!();
                    println!("  Path:          {}", db_path.display());
                    if let Some(size) = file_size {
                        println!("  File size:     {:.1} KB", size as f64 / 1024.0);
                    }
                    println!("  Journal mode:  {journal_mode}");
                    println!("  Pages:         {page_count}");
                    Ok(())
                }
            }
        }
        DbAction::Check => {
            db.run_integrity_check()?;
            println!("  {} Integrity check passed.", style("OK").green().bold());
            Ok(())
        }
        DbAction::Reset { yes } => {
            let confirmed = yes
                || Confirm::new()
                    .with_prompt("This deletes every account, appointment and message. Continue?")
                    .default(false)
                    .interact()
                    .map_err(prompt_error)?;
            if !confirmed {
                println!("  Aborted.");
                return Ok(());
            }
            db.reset()?;
            println!("  {} Database reset; the doctor directory was re-seeded.", style("OK").green().bold());
            Ok(())
        }
        DbAction::Path => {
            println!("{}", db_path.display());
            Ok(())
        }
    }
}
