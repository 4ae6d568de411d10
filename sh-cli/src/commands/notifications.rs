//! Notification commands.

use clap::Subcommand;
use console::style;

use sh_core::error::ShResult;
use sh_services::ServiceRegistry;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum NotificationsAction {
    /// List notifications, newest first.
    List {
        /// Only unread ones.
        #[arg(short, long)]
        unread: bool,
    },
    /// Mark one notification read.
    Read {
        id: String,
    },
    /// Mark every notification read.
    ReadAll,
}

pub async fn run(
    registry: &ServiceRegistry,
    action: NotificationsAction,
    format: OutputFormat,
) -> ShResult<()> {
    let user = registry.auth().require_user()?;
    let notifications = registry.notifications();

    match action {
        NotificationsAction::List { unread } => {
            let mut list = notifications.list(&user)?;
            if unread {
                list.retain(|n| !n.read);
            }
            match format {
                OutputFormat::Json => super::print_json(&list),
                OutputFormat::Text => {
                    if list.is_empty() {
                        println!("You're all caught up.");
                        return Ok(());
                    }
                    for n in &list {
                        let marker = if n.read { style("  ").dim() } else { style("● ").cyan() };
                        println!(
                            "{marker}{}  {}",
                            style(&n.title).bold(),
                            style(notifications.display_time(n)).dim()
                        );
                        println!("  {}", n.message);
                        println!("  {}", style(format!("{} · {}", n.kind, n.id)).dim());
                    }
                    println!();
                    println!("  {} unread", notifications.unread_count(&user)?);
                    Ok(())
                }
            }
        }
        NotificationsAction::Read { id } => {
            notifications.mark_read(&user, &id)?;
            println!("  {} Marked read.", style("OK").green().bold());
            Ok(())
        }
        NotificationsAction::ReadAll => {
            let count = notifications.mark_all_read(&user)?;
            println!("  {} Marked {count} notification(s) read.", style("OK").green().bold());
            Ok(())
        }
    }
}
