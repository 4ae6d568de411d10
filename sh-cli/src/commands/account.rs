//! Account commands: register, login, logout, whoami.

use clap::Subcommand;
use console::style;
use dialoguer::Password;

use sh_core::error::ShResult;
use sh_models::{Role, User};
use sh_services::ServiceRegistry;

use super::prompt_error;
use crate::OutputFormat;

/// Roles open to self-registration.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SignupRole {
    Patient,
    Doctor,
}

impl From<SignupRole> for Role {
    fn from(role: SignupRole) -> Self {
        match role {
            SignupRole::Patient => Role::Patient,
            SignupRole::Doctor => Role::Doctor,
        }
    }
}

#[derive(Subcommand)]
pub enum AccountAction {
    /// Create an account and sign in.
    Register {
        /// Full name.
        #[arg(short, long)]
        name: String,
        /// Email address.
        #[arg(short, long)]
        email: String,
        #[arg(short, long, default_value = "patient")]
        role: SignupRole,
        /// Password (prompted when omitted).
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in.
    Login {
        email: String,
        /// Password (prompted when omitted).
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out.
    Logout,
    /// Show the signed-in account.
    Whoami,
}

fn read_password(given: Option<String>, confirm: bool) -> ShResult<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Confirm password", "Passwords do not match");
    }
    prompt.interact().map_err(prompt_error)
}

fn print_user(user: &User, is_admin: bool, format: OutputFormat) -> ShResult<()> {
    match format {
        OutputFormat::Json => super::print_json(&serde_json::json!({
            "user": user,
            "super_admin": is_admin,
        })),
        OutputFormat::Text => {
            println!("  Name:   {}", style(&user.name).bold());
            println!("  Email:  {}", user.email);
            println!("  Role:   {}", user.role);
            println!("  Id:     {}", style(&user.id).dim());
            if is_admin {
                println!("  {}", style("Super admin").cyan());
            }
            Ok(())
        }
    }
}

pub async fn run(registry: &ServiceRegistry, action: AccountAction, format: OutputFormat) -> ShResult<()> {
    let auth = registry.auth();

    match action {
        AccountAction::Register { name, email, role, password } => {
            let password = read_password(password, true)?;
            let user = auth.register(&name, &email, &password, role.into())?;
            if let OutputFormat::Text = format {
                println!("  {} Welcome to SynergiHub, {}.", style("OK").green().bold(), user.name);
                if user.role == Role::Doctor {
                    println!(
                        "  Link your directory profile with {}",
                        style("synergihub doctors link <id>").cyan()
                    );
                }
            }
            print_user(&user, auth.is_super_admin(&user), format)
        }
        AccountAction::Login { email, password } => {
            let password = read_password(password, false)?;
            let user = auth.login(&email, &password)?;
            println!("  {} Signed in as {}.", style("OK").green().bold(), user.name);
            Ok(())
        }
        AccountAction::Logout => {
            if auth.logout()? {
                println!("  {} Signed out.", style("OK").green().bold());
            } else {
                println!("  Nobody is signed in.");
            }
            Ok(())
        }
        AccountAction::Whoami => match auth.current_user()? {
            Some(user) => print_user(&user, auth.is_super_admin(&user), format),
            None => {
                println!("  Not signed in.");
                Ok(())
            }
        },
    }
}
