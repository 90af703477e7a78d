//! Init command - prepare a fresh workspace.

use std::path::PathBuf;

use console::style;
use tracing::info;

use la_core::config::ConfigHandle;
use la_core::error::LaResult;
use la_core::logging;
use la_models::Database;
use la_services::{EnvSeed, WorkspaceSetup};
use crate::OutputFormat;

/// Create directories, seed `.env` and make sure the database exists.
pub async fn run(
    config: ConfigHandle,
    root: Option<PathBuf>,
    log_level: &str,
    format: OutputFormat,
) -> LaResult<()> {
    let root = match root {
        Some(r) => r,
        None => std::env::current_dir()?,
    };
    let snapshot = config.snapshot().await;
    let report = WorkspaceSetup::new(&root, &snapshot.setup).run()?;

    let _guard = logging::init_logging(
        log_level,
        &snapshot.log_file_path(&root),
        snapshot.logging.json_output,
    )?;
    info!("workspace ready at {}", root.display());

    let db_path = {
        let rel = super::database_path(&config).await?;
        if rel.is_absolute() { rel } else { root.join(rel) }
    };
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db_config = config.read().await.database.clone();
    let db = Database::init(&db_path, &db_config)?;
    db.run_integrity_check()?;

    match format {
        OutputFormat::Json => {
            super::print_json(&serde_json::json!({
                "setup": report,
                "database": db_path.display().to_string(),
            }));
        }
        OutputFormat::Text => {
            for line in report.status_lines() {
                println!("  {} {line}", style("OK").green().bold());
            }
            println!("  {} database ready at {}", style("OK").green().bold(), db_path.display());
            if report.env != EnvSeed::AlreadyPresent {
                println!();
                println!(
                    "  Next: set TELEGRAM_TOKEN, YANDEX_API_KEY and YANDEX_FOLDER_ID in {}, then run {}",
                    report.env_path.display(),
                    style("life-assistant run").cyan()
                );
            }
        }
    }
    Ok(())
}
