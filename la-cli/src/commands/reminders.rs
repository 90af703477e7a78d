//! Reminder commands - add, list, complete, delete, and show due reminders.

use clap::Subcommand;
use console::style;

use la_core::config::ConfigHandle;
use la_core::error::LaResult;
use la_models::{time, Reminder};
use la_services::{EventBus, ReminderService};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum RemindersAction {
    /// Add a reminder, e.g. `через 2 часа проверить почту` or `завтра 09:00 совещание`.
    Add {
        #[arg(short, long)]
        user: i64,
        /// Chat to deliver to (defaults to the user's private chat).
        #[arg(short, long, allow_hyphen_values = true)]
        chat: Option<i64>,
        /// Time phrase followed by the reminder text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// List a user's reminders.
    List {
        #[arg(short, long)]
        user: i64,
        /// Include completed reminders.
        #[arg(short, long)]
        all: bool,
    },
    /// Mark a reminder done.
    Done {
        #[arg(short, long)]
        user: i64,
        id: i64,
    },
    /// Delete a reminder.
    Delete {
        #[arg(short, long)]
        user: i64,
        id: i64,
    },
    /// Show reminders due now across all users.
    Due,
}

fn print_reminders(reminders: &[Reminder], format: OutputFormat) {
    match format {
        OutputFormat::Json => super::print_json(reminders),
        OutputFormat::Text => {
            if reminders.is_empty() {
                println!("No reminders.");
                return;
            }
            let mut table = super::new_table(vec!["ID", "User", "Chat", "Due", "Text", "Done"]);
            for r in reminders {
                table.add_row(vec![
                    r.id.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
                    r.user_id.to_string(),
                    r.target_chat().to_string(),
                    super::display_ts(&r.due_date),
                    super::truncate(&r.text, 40),
                    if r.completed { "✓" } else { "" }.to_string(),
                ]);
            }
            println!("{table}");
            println!("\n{} reminder(s).", reminders.len());
        }
    }
}

pub async fn run(config: ConfigHandle, action: RemindersAction, format: OutputFormat) -> LaResult<()> {
    let db = super::init_database(&config).await?;
    let svc = ReminderService::new(db, EventBus::default());

    match action {
        RemindersAction::Add { user, chat, text } => {
            let reminder = svc.add_from_text(user, chat, &text.join(" "), time::now())?;
            match format {
                OutputFormat::Json => super::print_json(&reminder),
                OutputFormat::Text => println!(
                    "  {} reminder #{} set for {}: {}",
                    style("OK").green().bold(),
                    reminder.id.unwrap_or_default(),
                    super::display_ts(&reminder.due_date),
                    reminder.text
                ),
            }
        }
        RemindersAction::List { user, all } => {
            print_reminders(&svc.list(user, all)?, format);
        }
        RemindersAction::Done { user, id } => {
            svc.complete(user, id)?;
            println!("  {} reminder #{id} completed", style("OK").green().bold());
        }
        RemindersAction::Delete { user, id } => {
            svc.delete(user, id)?;
            println!("  {} reminder #{id} deleted", style("OK").green().bold());
        }
        RemindersAction::Due => {
            print_reminders(&svc.due(&time::now())?, format);
        }
    }
    Ok(())
}
