//! Direct message commands.

use clap::Subcommand;
use console::style;

use sh_core::error::{ShError, ShResult};
use sh_services::notification::format_local;
use sh_services::ServiceRegistry;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum MessagesAction {
    /// List conversations, most recent first.
    Threads,
    /// Show a conversation and mark it read.
    Show {
        /// Account id of the other participant.
        user_id: String,
    },
    /// Send a message.
    Send {
        /// Account id of the recipient, or a catalog doctor id with --doctor.
        to: String,
        content: String,
        /// Treat `to` as a directory doctor id.
        #[arg(long)]
        doctor: bool,
    },
}

/// Turn a recipient argument into an account id.
fn resolve_recipient(registry: &ServiceRegistry, to: &str, doctor: bool) -> ShResult<String> {
    if !doctor {
        return Ok(to.to_string());
    }
    let entry = registry.directory().find(to)?;
    entry
        .user_id
        .ok_or_else(|| ShError::Validation(format!("{} has not linked an account yet", entry.name)))
}

pub async fn run(registry: &ServiceRegistry, action: MessagesAction, format: OutputFormat) -> ShResult<()> {
    let user = registry.auth().require_user()?;
    let messages = registry.messages();

    match action {
        MessagesAction::Threads => {
            let threads = messages.threads(&user)?;
            match format {
                OutputFormat::Json => super::print_json(&threads),
                OutputFormat::Text => {
                    if threads.is_empty() {
                        println!("No conversations yet.");
                        return Ok(());
                    }
                    let mut table = super::new_table(vec!["With", "Id", "Last message", "When", "Unread"]);
                    for t in &threads {
                        let unread = if t.unread_count > 0 {
                            style(t.unread_count.to_string()).bold().cyan().to_string()
                        } else {
                            String::new()
                        };
                        table.add_row(vec![
                            t.counterpart_name.clone(),
                            t.counterpart_id.clone(),
                            super::truncate(&t.last_message.content, 40),
                            format_local(&t.last_message.timestamp),
                            unread,
                        ]);
                    }
                    println!("{table}");
                    Ok(())
                }
            }
        }
        MessagesAction::Show { user_id } => {
            let conversation = messages.conversation(&user, &user_id)?;
            messages.mark_conversation_read(&user, &user_id)?;
            match format {
                OutputFormat::Json => super::print_json(&conversation),
                OutputFormat::Text => {
                    if conversation.is_empty() {
                        println!("No messages with {user_id}.");
                    }
                    for m in &conversation {
                        let who = if m.sender_id == user.id {
                            style("You".to_string()).green().bold()
                        } else {
                            style(m.sender_id.chars().take(8).collect::<String>()).cyan().bold()
                        };
                        println!(
                            "{} {}  {}",
                            style(format_local(&m.timestamp)).dim(),
                            who,
                            m.content
                        );
                    }
                    Ok(())
                }
            }
        }
        MessagesAction::Send { to, content, doctor } => {
            let recipient = resolve_recipient(registry, &to, doctor)?;
            let sent = messages.send(&user, &recipient, &content)?;
            match format {
                OutputFormat::Json => super::print_json(&sent),
                OutputFormat::Text => {
                    println!("  {} Message sent.", style("OK").green().bold());
                    Ok(())
                }
            }
        }
    }
}
