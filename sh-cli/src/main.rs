//! SynergiHub CLI - Command-line front end for the SynergiHub platform.
//!
//! Patients browse specialists, take the self-assessment, book and manage
//! appointments and message their doctors. Doctors manage their schedule and
//! review assessments. Super admins moderate accounts. All state lives in a
//! local SQLite database; the signed-in account persists between runs.

mod commands;

use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

use sh_core::config::{AppConfig, ConfigHandle};
use sh_core::error::ShResult;
use sh_core::logging;
use sh_services::event_bus::event_label;
use sh_services::ServiceRegistry;

/// SynergiHub - mental-health telemedicine from the terminal.
#[derive(Parser)]
#[command(
    name = "synergihub",
    version,
    about = "SynergiHub telemedicine CLI",
    long_about = "A command-line interface for SynergiHub.\n\
                   Find a specialist, take the symptom assessment, book consultations and talk to your doctor."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output for scripting.
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account, log in or out, show who is signed in.
    Account {
        #[command(subcommand)]
        action: commands::account::AccountAction,
    },
    /// Browse and search the specialist directory.
    Doctors {
        #[command(subcommand)]
        action: commands::doctors::DoctorsAction,
    },
    /// List the conditions SynergiHub specialists treat.
    Conditions,
    /// Take the symptom self-assessment.
    Assess {
        #[command(subcommand)]
        action: commands::assess::AssessAction,
    },
    /// Book and manage appointments.
    Appointments {
        #[command(subcommand)]
        action: commands::appointments::AppointmentsAction,
    },
    /// Direct messages.
    Messages {
        #[command(subcommand)]
        action: commands::messages::MessagesAction,
    },
    /// In-app notifications.
    Notifications {
        #[command(subcommand)]
        action: commands::notifications::NotificationsAction,
    },
    /// Assessments sent to doctors.
    Results {
        #[command(subcommand)]
        action: commands::results::ResultsAction,
    },
    /// Super-admin console.
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
    /// Database management commands.
    Db {
        #[command(subcommand)]
        action: commands::db::DbAction,
    },
}

fn load_config(path: Option<&str>) -> ShResult<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from_file(std::path::Path::new(path)),
        None => AppConfig::load_default(),
    }
}

#[tokio::main]
async fn main() -> ShResult<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let log_dir = config
        .effective_log_dir()
        .unwrap_or_else(|_| std::path::PathBuf::from("logs"));
    let level_override = cli.verbose.then_some("debug");
    let log_guard = match logging::init_logging(&config.logging, &log_dir, level_override) {
        Ok(guard) => Some(guard),
        Err(e) => {
            logging::init_console_logging(level_override.unwrap_or(config.logging.level.as_str()));
            warn!("file logging unavailable ({e}), logging to stderr only");
            None
        }
    };

    let config_handle = ConfigHandle::new(config);
    info!(
        "SynergiHub CLI v{} on {}",
        sh_core::constants::APP_VERSION,
        sh_core::Platform::current()
    );

    let database = commands::init_database(&config_handle).await?;
    let mut registry = ServiceRegistry::new(config_handle, database);
    registry.register_all();
    registry.init_all().await?;

    // Surface service events in verbose mode.
    let mut events = registry.event_bus().subscribe();

    let result = match cli.command {
        Commands::Account { action } => commands::account::run(&registry, action, cli.format).await,
        Commands::Doctors { action } => commands::doctors::run(&registry, action, cli.format).await,
        Commands::Conditions => commands::conditions::run(&registry, cli.format).await,
        Commands::Assess { action } => commands::assess::run(&registry, action, cli.format).await,
        Commands::Appointments { action } => {
            commands::appointments::run(&registry, action, cli.format).await
        }
        Commands::Messages { action } => commands::messages::run(&registry, action, cli.format).await,
        Commands::Notifications { action } => {
            commands::notifications::run(&registry, action, cli.format).await
        }
        Commands::Results { action } => commands::results::run(&registry, action, cli.format).await,
        Commands::Admin { action } => commands::admin::run(&registry, action, cli.format).await,
        Commands::Db { action } => commands::db::run(&registry, action, cli.format).await,
    };

    while let Ok(event) = events.try_recv() {
        debug!("event {}: {event:?}", event_label(&event));
    }

    registry.shutdown_all().await?;
    match result {
        Err(e) if e.is_user_error() => {
            eprintln!("{} {e}", console::style("error:").red().bold());
            drop(log_guard);
            std::process::exit(1);
        }
        other => other,
    }
}
