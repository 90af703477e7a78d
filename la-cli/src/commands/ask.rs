//! Ask command - one assistant round trip from the terminal.

use std::sync::Arc;

use console::style;

use la_api::YandexGptClient;
use la_core::config::ConfigHandle;
use la_core::error::LaResult;
use la_services::{AssistantService, ChatMonitorService, EventBus};
use crate::OutputFormat;

pub async fn run(
    config: ConfigHandle,
    chat: i64,
    user: i64,
    username: Option<String>,
    question: String,
    format: OutputFormat,
) -> LaResult<()> {
    let cfg = config.snapshot().await;
    cfg.require_assistant()?;

    let db = super::init_database(&config).await?;
    let bus = EventBus::default();
    let monitor = ChatMonitorService::new(db, bus.clone());

    // The question is part of the chat, exactly as if it had been typed there.
    monitor.log_message(chat, user, username.as_deref(), &question, false)?;

    let client = YandexGptClient::new(&cfg.assistant)?;
    let mut assistant = AssistantService::new(
        Arc::new(client),
        monitor,
        bus,
        cfg.assistant.context_messages as usize,
    );
    if !cfg.bot.bot_username.is_empty() {
        assistant = assistant.with_bot_name(cfg.bot.bot_username.clone());
    }

    if matches!(format, OutputFormat::Text) {
        println!("  {} thinking...", style("...").dim());
    }
    let answer = assistant.ask(chat, user, username.as_deref(), &question).await?;

    match format {
        OutputFormat::Json => super::print_json(&serde_json::json!({ "answer": answer })),
        OutputFormat::Text => println!("\n{answer}"),
    }
    Ok(())
}
