//! Super-admin console.

use clap::Subcommand;
use console::style;

use sh_core::error::ShResult;
use sh_models::{Role, User};
use sh_services::ServiceRegistry;

use crate::OutputFormat;

#[derive(Subcommand)]
pub enum AdminAction {
    /// List accounts, optionally by role.
    Users {
        #[arg(short, long)]
        role: Option<String>,
    },
    /// Re-enable an account.
    Activate {
        user_id: String,
    },
    /// Disable an account; it can no longer sign in.
    Deactivate {
        user_id: String,
    },
    /// Every appointment on the platform.
    Appointments,
    /// Platform overview.
    Stats,
}

fn print_user_change(user: &User, format: OutputFormat) -> ShResult<()> {
    match format {
        OutputFormat::Json => super::print_json(user),
        OutputFormat::Text => {
            let state = if user.active { style("active").green() } else { style("inactive").red() };
            println!("  {} {} is now {state}.", style("OK").green().bold(), user.email);
            Ok(())
        }
    }
}

pub async fn run(registry: &ServiceRegistry, action: AdminAction, format: OutputFormat) -> ShResult<()> {
    let actor = registry.auth().require_super_admin()?;
    let admin = registry.admin();

    match action {
        AdminAction::Users { role } => {
            let role: Option<Role> = role.map(|r| r.parse()).transpose()?;
            let users = admin.list_users(&actor, role)?;
            match format {
                OutputFormat::Json => super::print_json(&users),
                OutputFormat::Text => {
                    let mut table = super::new_table(vec!["Id", "Name", "Email", "Role", "Active", "Joined"]);
                    for u in &users {
                        table.add_row(vec![
                            u.id.clone(),
                            u.name.clone(),
                            u.email.clone(),
                            u.role.to_string(),
                            if u.active { "yes".into() } else { style("no").red().to_string() },
                            u.created_at.chars().take(10).collect(),
                        ]);
                    }
                    println!("{table}");
                    Ok(())
                }
            }
        }
        AdminAction::Activate { user_id } => {
            print_user_change(&admin.set_user_active(&actor, &user_id, true)?, format)
        }
        AdminAction::Deactivate { user_id } => {
            print_user_change(&admin.set_user_active(&actor, &user_id, false)?, format)
        }
        AdminAction::Appointments => {
            let appointments = admin.list_appointments(&actor)?;
            match format {
                OutputFormat::Json => super::print_json(&appointments),
                OutputFormat::Text => {
                    let mut table =
                        super::new_table(vec!["Id", "Patient", "Doctor", "Date", "Time", "Status"]);
                    for a in &appointments {
                        table.add_row(vec![
                            a.id.chars().take(8).collect(),
                            a.patient_name.clone(),
                            a.doctor_name.clone(),
                            a.date.to_string(),
                            a.time.clone(),
                            a.status.to_string(),
                        ]);
                    }
                    println!("{table}");
                    Ok(())
                }
            }
        }
        AdminAction::Stats => {
            let stats = admin.stats(&actor)?;
            match format {
                OutputFormat::Json => super::print_json(&stats),
                OutputFormat::Text => {
                    println!("{}", style("Users").bold());
                    for (role, count) in &stats.users_by_role {
                        println!("  {role:<12} {count}");
                    }
                    println!("  {:<12} {}", "inactive", stats.inactive_users);
                    println!("{}", style("Appointments").bold());
                    for (status, count) in &stats.appointments_by_status {
                        println!("  {status:<12} {count}");
                    }
                    println!("{}", style("Activity").bold());
                    println!("  {:<12} {}", "messages", stats.tables.messages);
                    println!("  {:<12} {}", "assessments", stats.tables.test_results);
                    println!("  {:<12} {}", "notifications", stats.tables.notifications);
                    Ok(())
                }
            }
        }
    }
}
