//! Config commands - show the effective configuration.

use std::path::PathBuf;

use clap::Subcommand;
use console::style;

use la_core::config::{AppConfig, ConfigHandle};
use la_core::error::LaResult;
use crate::OutputFormat;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration with secrets masked.
    Show,
    /// Show which config file is in use.
    Path,
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let tail: String = secret.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("****{tail}")
}

fn redacted(config: &AppConfig) -> AppConfig {
    let mut c = config.clone();
    c.bot.telegram_token = mask(&c.bot.telegram_token);
    c.assistant.api_key = mask(&c.assistant.api_key);
    c
}

pub async fn run(
    config: ConfigHandle,
    action: ConfigAction,
    explicit: Option<PathBuf>,
    format: OutputFormat,
) -> LaResult<()> {
    match action {
        ConfigAction::Show => {
            let cfg = redacted(&config.snapshot().await);
            match format {
                OutputFormat::Json => super::print_json(&cfg),
                OutputFormat::Text => {
                    let text = toml::to_string_pretty(&cfg).unwrap_or_default();
                    println!("{text}");
                }
            }
        }
        ConfigAction::Path => {
            let path = explicit.or_else(AppConfig::discover_config_file);
            match format {
                OutputFormat::Json => {
                    super::print_json(&serde_json::json!({
                        "path": path.as_ref().map(|p| p.display().to_string()),
                    }));
                }
                OutputFormat::Text => match path {
                    Some(p) => println!("{}", p.display()),
                    None => println!(
                        "  {} no config file found, using defaults and environment",
                        style("INFO").cyan().bold()
                    ),
                },
            }
        }
    }
    Ok(())
}
