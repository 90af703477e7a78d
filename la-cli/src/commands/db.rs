//! Database management commands.

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;

use la_core::config::ConfigHandle;
use la_core::constants::DB_SCHEMA_VERSION;
use la_core::error::LaResult;
use la_models::{migrations, schema};
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum DbAction {
    /// Show database statistics.
    Stats,
    /// Run an integrity check.
    Check,
    /// Apply pending schema migrations.
    Migrate,
    /// Apply the secondary index script (safe to repeat).
    Indexes {
        /// Print the SQL instead of applying it.
        #[arg(long)]
        print: bool,
    },
    /// Reset the database (WARNING: destroys all data).
    Reset {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the database file path.
    Path,
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

pub async fn run(config: ConfigHandle, action: DbAction, format: OutputFormat) -> LaResult<()> {
    let db_path = super::database_path(&config).await?;

    match action {
        DbAction::Stats => {
            let db = super::init_database(&config).await?;
            let stats = db.stats()?;
            let file_size = std::fs::metadata(&db_path).ok().map(|m| m.len());

            let conn = db.conn()?;
            let journal_mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_else(|_| "unknown".to_string());
            let version = migrations::get_schema_version(&conn)?;

            match format {
                OutputFormat::Json => {
                    super::print_json(&serde_json::json!({
                        "path": db_path.display().to_string(),
                        "tables": stats,
                        "schema_version": version,
                        "file_size_bytes": file_size,
                        "journal_mode": journal_mode,
                    }));
                }
                OutputFormat::Text => {
                    println!("{}", style("Database Statistics").bold().underlined());
                    println!("  Path:          {}", db_path.display());
                    println!("  Journal mode:  {journal_mode}");
                    println!("  Schema:        v{version}");
                    if let Some(size) = file_size {
                        println!("  Size:          {}", format_bytes(size));
                    }
                    println!();

                    let mut table = super::new_table(vec!["Table", "Row Count"]);
                    for (name, count) in [
                        ("users", stats.users),
                        ("reminders", stats.reminders),
                        ("todos", stats.todos),
                        ("finances", stats.finances),
                        ("chat_logs", stats.chat_logs),
                        ("payments", stats.payments),
                    ] {
                        table.add_row(vec![name.to_string(), count.to_string()]);
                    }
                    println!("{table}");
                }
            }
        }
        DbAction::Check => {
            println!("  {} Running integrity check...", style("...").dim());
            let db = super::init_database(&config).await?;
            match db.run_integrity_check() {
                Ok(()) => println!("  {} Integrity check passed.", style("OK").green().bold()),
                Err(e) => {
                    println!("  {} Integrity check failed: {e}", style("FAIL").red().bold());
                    return Err(e);
                }
            }

            let conn = db.conn()?;
            for index in schema::SECONDARY_INDEXES {
                let present = schema::list_indexes(&conn, index.table)?
                    .iter()
                    .any(|n| n == index.name);
                if present {
                    println!("  {} index {}", style("OK").green().bold(), index.name);
                } else {
                    println!(
                        "  {} index {} missing, run `life-assistant db indexes`",
                        style("WARN").yellow().bold(),
                        index.name
                    );
                }
            }
        }
        DbAction::Migrate => {
            // Database::init already migrates; report where that left us.
            let db = super::init_database(&config).await?;
            let conn = db.conn()?;
            migrations::run_migrations(&conn)?;
            let version = migrations::get_schema_version(&conn)?;
            match format {
                OutputFormat::Json => super::print_json(&serde_json::json!({
                    "schema_version": version,
                    "latest": DB_SCHEMA_VERSION,
                })),
                OutputFormat::Text => println!(
                    "  {} schema at version {version} (latest {DB_SCHEMA_VERSION})",
                    style("OK").green().bold()
                ),
            }
        }
        DbAction::Indexes { print } => {
            if print {
                print!("{}", schema::secondary_index_script());
                return Ok(());
            }
            let db = super::init_database(&config).await?;
            let applied = db.ensure_secondary_indexes()?;
            match format {
                OutputFormat::Json => super::print_json(&applied),
                OutputFormat::Text => {
                    for name in applied {
                        println!("  {} {name}", style("OK").green().bold());
                    }
                }
            }
        }
        DbAction::Reset { yes } => {
            println!("  {} This will delete ALL data.", style("WARNING").red().bold());
            println!("  Database: {}", db_path.display());

            let confirmed = yes
                || Confirm::new()
                    .with_prompt("  Are you sure you want to reset the database?")
                    .default(false)
                    .interact()
                    .unwrap_or(false);

            if !confirmed {
                println!("  Reset cancelled.");
                return Ok(());
            }

            let db = super::init_database(&config).await?;
            db.reset()?;
            println!("  {} Database reset complete.", style("OK").green().bold());
        }
        DbAction::Path => match format {
            OutputFormat::Json => {
                super::print_json(&serde_json::json!({"path": db_path.display().to_string()}));
            }
            OutputFormat::Text => println!("{}", db_path.display()),
        },
    }

    Ok(())
}
