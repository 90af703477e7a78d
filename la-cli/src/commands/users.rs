//! User and subscription commands.

use clap::Subcommand;
use console::style;

use la_core::config::ConfigHandle;
use la_core::error::LaResult;
use la_models::{time, User};
use la_services::{EventBus, SubscriptionService};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum UsersAction {
    /// Register a user (no-op when already known).
    Add {
        /// Telegram user id.
        user: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
    /// Extend a user's subscription.
    Subscribe {
        user: i64,
        /// Number of months to add.
        #[arg(short, long, default_value = "1")]
        months: u32,
    },
    /// Show a user's subscription status.
    Status { user: i64 },
    /// List all users.
    List,
}

pub async fn run(config: ConfigHandle, action: UsersAction, format: OutputFormat) -> LaResult<()> {
    let db = super::init_database(&config).await?;
    let bot = config.read().await.bot.clone();
    let svc = SubscriptionService::new(db, EventBus::default(), &bot);
    let today = time::now().date();

    match action {
        UsersAction::Add { user, username, first_name, last_name } => {
            let mut u = User::new(user).with_names(first_name, last_name);
            if let Some(name) = username {
                u = u.with_username(name.trim_start_matches('@'));
            }
            let created = svc.register_user(&u)?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "user_id": user,
                    "created": created,
                })),
                OutputFormat::Text if created => {
                    println!("  {} registered user {user}", style("OK").green().bold())
                }
                OutputFormat::Text => println!("  user {user} already registered"),
            }
        }
        UsersAction::Subscribe { user, months } => {
            let end = svc.extend(user, months, today)?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "user_id": user,
                    "subscription_end": time::format_date(&end),
                })),
                OutputFormat::Text => println!(
                    "  {} subscription of {user} active until {}",
                    style("OK").green().bold(),
                    end.format("%d.%m.%Y")
                ),
            }
        }
        UsersAction::Status { user } => {
            let status = svc.status(user, today)?;
            match format {
                OutputFormat::Json => super::print_json(&status),
                OutputFormat::Text => {
                    let label = if status.active {
                        style("active").green().bold()
                    } else {
                        style("inactive").red().bold()
                    };
                    println!("  User {user}: {label}");
                    if status.is_admin {
                        println!("  Administrator, subscription not required");
                    }
                    if let Some(end) = status.end {
                        println!("  Ends:      {}", end.format("%d.%m.%Y"));
                        println!("  Days left: {}", status.days_left);
                    }
                }
            }
        }
        UsersAction::List => {
            let users = svc.list_users()?;
            match format {
                OutputFormat::Json => super::print_json(&users),
                OutputFormat::Text => {
                    if users.is_empty() {
                        println!("No users.");
                        return Ok(());
                    }
                    let mut table = super::new_table(vec!["ID", "Name", "Subscription End", "Active"]);
                    for u in &users {
                        let active = u.subscription_end.map(|e| e > today).unwrap_or(false)
                            || u.user_id == bot.admin_id;
                        table.add_row(vec![
                            u.user_id.to_string(),
                            super::truncate(&u.display_name(), 30),
                            u.subscription_end
                                .map(|e| e.format("%d.%m.%Y").to_string())
                                .unwrap_or_else(|| "-".to_string()),
                            if active { "yes" } else { "no" }.to_string(),
                        ]);
                    }
                    println!("{table}");
                    println!("\n{} user(s).", users.len());
                }
            }
        }
    }
    Ok(())
}
