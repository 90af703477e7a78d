//! Background delivery of due reminders.
//!
//! A single tokio task wakes on a fixed interval, sends every pending
//! reminder whose due time has passed and marks it completed. A reminder
//! whose send fails stays pending and is retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use la_api::MessageSender;
use la_core::config::SchedulerConfig;
use la_core::constants::REMINDER_HEADER;
use la_core::error::LaResult;
use la_models::Reminder;

use crate::event_bus::{AppEvent, EventBus};
use crate::reminder::ReminderService;

/// Counts from one scheduler pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Text sent to the chat when a reminder fires.
pub fn format_reminder(reminder: &Reminder) -> String {
    format!("{REMINDER_HEADER}\n\n{}", reminder.text)
}

struct Inner {
    reminders: ReminderService,
    sender: Arc<dyn MessageSender>,
    event_bus: EventBus,
}

impl Inner {
    async fn tick(&self, now: NaiveDateTime) -> LaResult<TickReport> {
        let due = self.reminders.due(&now)?;
        let mut report = TickReport::default();

        for reminder in due {
            let Some(id) = reminder.id else { continue };
            let chat_id = reminder.target_chat();

            match self.sender.send_text(chat_id, &format_reminder(&reminder)).await {
                Ok(()) => {
                    // The message is out; a failed write only means a repeat next tick
                    if let Err(e) = self.reminders.mark_delivered(id) {
                        error!("delivered reminder {id} but could not mark it completed: {e}");
                    }
                    info!("delivered reminder {id} to chat {chat_id}");
                    self.event_bus.emit(AppEvent::ReminderDelivered {
                        reminder_id: id,
                        chat_id,
                    });
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!("failed to deliver reminder {id} to chat {chat_id}: {e}");
                    self.event_bus.emit(AppEvent::ReminderFailed {
                        reminder_id: id,
                        error: e.to_string(),
                    });
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

/// Periodic reminder dispatcher.
pub struct ReminderScheduler {
    inner: Arc<Inner>,
    first_delay: Duration,
    interval: Duration,
    stop_tx: Option<watch::Sender<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl ReminderScheduler {
    pub fn new(
        reminders: ReminderService,
        sender: Arc<dyn MessageSender>,
        event_bus: EventBus,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                reminders,
                sender,
                event_bus,
            }),
            first_delay: Duration::from_secs(config.first_delay_secs),
            interval: Duration::from_secs(config.interval_secs.max(1)),
            stop_tx: None,
            handle: None,
        }
    }

    /// Run one pass as of `now`.
    pub async fn tick(&self, now: NaiveDateTime) -> LaResult<TickReport> {
        self.inner.tick(now).await
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Spawn the background loop. Calling it while running does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let mut ticker = interval_at(Instant::now() + self.first_delay, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "reminder scheduler started (first run in {}s, then every {}s)",
            self.first_delay.as_secs(),
            self.interval.as_secs()
        );

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match inner.tick(la_models::time::now()).await {
                            Ok(report) if report.delivered + report.failed > 0 => {
                                info!("reminder pass: {} delivered, {} failed", report.delivered, report.failed);
                            }
                            Ok(_) => {}
                            Err(e) => error!("reminder pass failed: {e}"),
                        }
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("reminder scheduler stopped");
        });

        self.stop_tx = Some(stop_tx);
        self.handle = Some(handle);
    }

    /// Signal the loop to stop and wait for it to finish its current pass.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(true);
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!("reminder scheduler task ended abnormally: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use la_core::error::LaError;
    use la_models::Database;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(i64, String)>>,
        fail_chat: Option<i64>,
    }

    #[async_trait]
    impl MessageSender for Recorder {
        async fn send_text(&self, chat_id: i64, text: &str) -> LaResult<()> {
            if self.fail_chat == Some(chat_id) {
                return Err(LaError::Http("chat unreachable".into()));
            }
            self.sent.lock().unwrap().push((chat_id, text.to_string()));
            Ok(())
        }
    }

    fn at(s: &str) -> NaiveDateTime {
        la_models::time::parse_ts(s).unwrap()
    }

    fn setup(recorder: Arc<Recorder>) -> (ReminderScheduler, ReminderService, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("t.db"), &Default::default()).unwrap();
        let bus = EventBus::new(16);
        let reminders = ReminderService::new(db, bus.clone());
        let scheduler =
            ReminderScheduler::new(reminders.clone(), recorder, bus, &SchedulerConfig::default());
        (scheduler, reminders, dir)
    }

    #[tokio::test]
    async fn test_tick_delivers_and_completes() {
        let recorder = Arc::new(Recorder::default());
        let (scheduler, reminders, _dir) = setup(recorder.clone());
        reminders.add(5, Some(-100), "позвонить маме", at("2025-01-01 09:00:00")).unwrap();
        reminders.add(6, None, "later", at("2025-01-02 09:00:00")).unwrap();

        let report = scheduler.tick(at("2025-01-01 09:00:30")).await.unwrap();
        assert_eq!(report, TickReport { delivered: 1, failed: 0 });

        let sent = recorder.sent.lock().unwrap().clone();
        assert_eq!(sent, vec![(-100, "🔔 Напоминание\n\nпозвонить маме".to_string())]);

        let again = scheduler.tick(at("2025-01-01 09:01:30")).await.unwrap();
        assert_eq!(again, TickReport::default());
    }

    #[tokio::test]
    async fn test_failed_delivery_stays_pending() {
        let recorder = Arc::new(Recorder {
            fail_chat: Some(7),
            ..Recorder::default()
        });
        let (scheduler, reminders, _dir) = setup(recorder);
        reminders.add(7, None, "unreachable", at("2025-01-01 09:00:00")).unwrap();

        let report = scheduler.tick(at("2025-01-01 10:00:00")).await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(reminders.due(&at("2025-01-01 10:00:00")).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_completion_write_failure_does_not_stop_tick() {
        let dir = TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("t.db"), &Default::default()).unwrap();
        let bus = EventBus::new(16);
        let reminders = ReminderService::new(db.clone(), bus.clone());
        reminders.add(1, None, "first", at("2025-01-01 09:00:00")).unwrap();
        reminders.add(2, None, "second", at("2025-01-01 09:05:00")).unwrap();

        db.conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reminders_read_only BEFORE UPDATE ON reminders
                 BEGIN SELECT RAISE(ABORT, 'read only'); END;",
            )
            .unwrap();

        let recorder = Arc::new(Recorder::default());
        let scheduler =
            ReminderScheduler::new(reminders.clone(), recorder.clone(), bus, &SchedulerConfig::default());

        let report = scheduler.tick(at("2025-01-01 10:00:00")).await.unwrap();
        assert_eq!(report, TickReport { delivered: 2, failed: 0 });
        assert_eq!(recorder.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let recorder = Arc::new(Recorder::default());
        let (mut scheduler, _reminders, _dir) = setup(recorder);
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.stop().await;
        assert!(!scheduler.is_running());
    }
}
