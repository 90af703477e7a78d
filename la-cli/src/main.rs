//! Life Assistant CLI - bot runner and administration tool.
//!
//! `life-assistant run` starts the reminder delivery loop against Telegram.
//! Every other command works directly on the local database, which makes
//! the binary usable for setup, scripting and debugging without a bot token.

mod commands;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use tracing::info;

use la_core::config::{self, AppConfig, ConfigHandle};
use la_core::error::LaResult;
use la_core::logging;

/// Life Assistant - reminders, todos, finances and a chat assistant for Telegram.
#[derive(Parser)]
#[command(
    name = "life-assistant",
    version,
    about = "Life assistant Telegram bot and admin CLI",
    long_about = "Runs the life assistant bot and manages its local data.\n\
                  Settings come from config.toml, then .env and the process environment."
)]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

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
    /// Prepare data/log directories, seed .env and create the database.
    Init {
        /// Directory to prepare (defaults to the current directory).
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Start the bot: services plus the reminder delivery loop.
    Run,
    /// Inspect the effective configuration.
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Database management commands.
    Db {
        #[command(subcommand)]
        action: commands::db::DbAction,
    },
    /// Users and subscriptions.
    Users {
        #[command(subcommand)]
        action: commands::users::UsersAction,
    },
    /// Manage reminders.
    Reminders {
        #[command(subcommand)]
        action: commands::reminders::RemindersAction,
    },
    /// Manage the todo list.
    Todos {
        #[command(subcommand)]
        action: commands::todos::TodosAction,
    },
    /// Record transactions and show reports.
    Finance {
        #[command(subcommand)]
        action: commands::finance::FinanceAction,
    },
    /// Chat log, mood and history search.
    Chat {
        #[command(subcommand)]
        action: commands::chat::ChatAction,
    },
    /// Payment ledger.
    Payments {
        #[command(subcommand)]
        action: commands::payments::PaymentsAction,
    },
    /// Ask the assistant a question in the context of a chat.
    Ask {
        /// Chat whose history is used as context. Group ids are negative.
        #[arg(long, allow_hyphen_values = true)]
        chat: i64,
        /// User asking the question.
        #[arg(long)]
        user: i64,
        /// Display name of the user.
        #[arg(long)]
        username: Option<String>,
        /// The question.
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{} {e}", style("error:").red().bold());
        // 2 for bad input, 1 for everything else
        std::process::exit(if e.is_user_error() { 2 } else { 1 });
    }
}

async fn run(cli: Cli) -> LaResult<()> {
    // Environment first so config loading sees it
    config::load_env_file(Path::new(".env"))?;
    let config = AppConfig::load(cli.config.as_deref())?;

    let log_level = if cli.verbose { "debug".to_string() } else { config.logging.level.clone() };

    // init starts logging itself, once the workspace directories exist
    let _guard = match cli.command {
        Commands::Init { .. } => None,
        _ => Some(logging::init_logging(
            &log_level,
            &config.log_file_path(Path::new("")),
            config.logging.json_output,
        )?),
    };

    info!("{} v{}", la_core::constants::APP_NAME, la_core::constants::APP_VERSION);

    let config_handle = ConfigHandle::new(config);

    match cli.command {
        Commands::Init { root } => {
            commands::init::run(config_handle, root, &log_level, cli.format).await
        }
        Commands::Run => commands::run::run(config_handle).await,
        Commands::Config { action } => {
            commands::config::run(config_handle, action, cli.config, cli.format).await
        }
        Commands::Db { action } => commands::db::run(config_handle, action, cli.format).await,
        Commands::Users { action } => commands::users::run(config_handle, action, cli.format).await,
        Commands::Reminders { action } => {
            commands::reminders::run(config_handle, action, cli.format).await
        }
        Commands::Todos { action } => commands::todos::run(config_handle, action, cli.format).await,
        Commands::Finance { action } => {
            commands::finance::run(config_handle, action, cli.format).await
        }
        Commands::Chat { action } => commands::chat::run(config_handle, action, cli.format).await,
        Commands::Payments { action } => {
            commands::payments::run(config_handle, action, cli.format).await
        }
        Commands::Ask { chat, user, username, question } => {
            commands::ask::run(config_handle, chat, user, username, question.join(" "), cli.format).await
        }
    }
}
