//! Run command - start services and the reminder delivery loop.

use std::sync::Arc;

use console::style;
use tracing::{debug, info, warn};

use la_api::TelegramClient;
use la_core::config::ConfigHandle;
use la_core::error::LaResult;
use la_services::event_bus::event_label;
use la_services::{ReminderScheduler, ReminderService, ServiceRegistry};

/// Run until Ctrl-C.
pub async fn run(config: ConfigHandle) -> LaResult<()> {
    let cfg = config.snapshot().await;
    cfg.require_telegram()?;
    if cfg.require_assistant().is_err() {
        warn!("YandexGPT credentials missing, the assistant is disabled");
    }

    let db = super::init_database(&config).await?;
    if cfg.database.integrity_check_on_startup {
        db.run_integrity_check()?;
    }

    let telegram = TelegramClient::new(&cfg.bot)?;
    let me = telegram.get_me().await?;
    let username = me.username.clone().unwrap_or_default();
    info!("connected to Telegram as @{username} (id {})", me.id);

    let mut registry = ServiceRegistry::new(config.clone(), db.clone());
    registry.register_all().await;
    registry.init_all().await?;

    let bus = registry.event_bus().clone();
    let mut events = bus.subscribe();
    let event_log = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!("event: {}", event_label(&event));
        }
    });

    let reminders = ReminderService::new(db, bus.clone());
    let mut scheduler = ReminderScheduler::new(reminders, Arc::new(telegram), bus, &cfg.scheduler);
    scheduler.start();

    println!(
        "  {} @{username} is running, press Ctrl-C to stop.",
        style("OK").green().bold()
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("could not listen for Ctrl-C: {e}");
    }

    info!("shutting down");
    scheduler.stop().await;
    registry.shutdown_all().await?;
    event_log.abort();
    println!("  {} stopped.", style("OK").green().bold());
    Ok(())
}
