//! Chat commands - log messages, mood, search and history.

use clap::Subcommand;
use console::style;

use la_core::config::ConfigHandle;
use la_core::constants::{DEFAULT_MOOD_WINDOW, DEFAULT_SEARCH_LIMIT};
use la_core::error::LaResult;
use la_models::ChatLog;
use la_services::{ChatMonitorService, EventBus};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ChatAction {
    /// Append a message to the chat log.
    Log {
        #[arg(short, long, allow_hyphen_values = true)]
        chat: i64,
        #[arg(short, long)]
        user: i64,
        #[arg(long)]
        username: Option<String>,
        /// Record the message as an assistant reply.
        #[arg(long)]
        bot: bool,
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    /// Keyword mood of a user's recent messages.
    Mood {
        #[arg(short, long)]
        user: i64,
        #[arg(short, long, default_value_t = DEFAULT_MOOD_WINDOW as usize)]
        limit: usize,
    },
    /// Search a chat's history.
    Search {
        #[arg(short, long, allow_hyphen_values = true)]
        chat: i64,
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT as usize)]
        limit: usize,
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Show the latest messages of a chat.
    History {
        #[arg(short, long, allow_hyphen_values = true)]
        chat: i64,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

fn print_logs(logs: &[ChatLog], format: OutputFormat) {
    match format {
        OutputFormat::Json => super::print_json(logs),
        OutputFormat::Text => {
            if logs.is_empty() {
                println!("No messages.");
                return;
            }
            for log in logs {
                let who = if log.is_bot {
                    style(log.speaker()).cyan().bold()
                } else {
                    style(log.speaker()).bold()
                };
                println!(
                    "  {} {who}: {}",
                    style(super::display_ts(&log.created_at)).dim(),
                    super::truncate(&log.message, 200)
                );
            }
        }
    }
}

pub async fn run(config: ConfigHandle, action: ChatAction, format: OutputFormat) -> LaResult<()> {
    let db = super::init_database(&config).await?;
    let svc = ChatMonitorService::new(db, EventBus::default());

    match action {
        ChatAction::Log { chat, user, username, bot, message } => {
            let log = svc.log_message(chat, user, username.as_deref(), &message.join(" "), bot)?;
            match format {
                OutputFormat::Json => super::print_json(&log),
                OutputFormat::Text => println!(
                    "  {} logged message #{}",
                    style("OK").green().bold(),
                    log.id.unwrap_or_default()
                ),
            }
        }
        ChatAction::Mood { user, limit } => {
            let report = svc.analyze_mood(user, Some(limit))?;
            match format {
                OutputFormat::Json => super::print_json(&report),
                OutputFormat::Text => {
                    println!("{}", style("Chat Mood").bold().underlined());
                    println!("  Messages:  {}", report.total_messages);
                    println!("  Positive:  {}", report.positive);
                    println!("  Negative:  {}", report.negative);
                    println!("  Mood:      {}", report.mood);
                }
            }
        }
        ChatAction::Search { chat, limit, query } => {
            let hits = svc.search(chat, &query.join(" "), limit)?;
            print_logs(&hits, format);
        }
        ChatAction::History { chat, limit } => {
            print_logs(&svc.history(chat, limit)?, format);
        }
    }
    Ok(())
}
