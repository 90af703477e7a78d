//! Reminder management: creation from free text, listing, closing.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use la_core::error::{LaError, LaResult};
use la_models::Database;
use la_models::Reminder;

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{Service, ServiceState};
use crate::time_parse;

/// Service for creating and managing one-shot reminders.
#[derive(Clone)]
pub struct ReminderService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl ReminderService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    /// Store a reminder with an explicit due time.
    pub fn add(
        &self,
        user_id: i64,
        chat_id: Option<i64>,
        text: &str,
        due: NaiveDateTime,
    ) -> LaResult<Reminder> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LaError::Validation("reminder text is empty".into()));
        }

        let conn = self.database.conn()?;
        let mut reminder = Reminder::new(user_id, chat_id, text, due);
        let id = reminder.insert(&conn)?;

        info!("reminder {id} created for user {user_id}, due {due}");
        self.event_bus.emit(AppEvent::ReminderCreated {
            reminder_id: id,
            user_id,
            due,
        });
        Ok(reminder)
    }

    /// Store a reminder written as `<time phrase> <text>`.
    ///
    /// ```text
    /// через 2 часа проверить почту
    /// завтра 09:00 совещание
    /// ```
    pub fn add_from_text(
        &self,
        user_id: i64,
        chat_id: Option<i64>,
        input: &str,
        now: NaiveDateTime,
    ) -> LaResult<Reminder> {
        let words: Vec<&str> = input.split_whitespace().collect();
        let (due, text) = time_parse::split_time_and_text(&words, now).ok_or_else(|| {
            LaError::Parse(
                "unrecognized time; use 18:30, 2024-12-25 18:30, через 2 часа or завтра 09:00"
                    .into(),
            )
        })?;
        debug!("parsed reminder time {due} from '{input}'");
        self.add(user_id, chat_id, &text, due)
    }

    /// A user's reminders ordered by due date.
    pub fn list(&self, user_id: i64, show_completed: bool) -> LaResult<Vec<Reminder>> {
        let conn = self.database.conn()?;
        Reminder::list_for_user(&conn, user_id, show_completed)
    }

    /// Mark one of the user's reminders done.
    pub fn complete(&self, user_id: i64, reminder_id: i64) -> LaResult<()> {
        let conn = self.database.conn()?;
        if !Reminder::mark_completed(&conn, reminder_id, Some(user_id))? {
            return Err(LaError::NotFound(format!("reminder {reminder_id}")));
        }
        self.event_bus.emit(AppEvent::ReminderClosed {
            reminder_id,
            deleted: false,
        });
        Ok(())
    }

    /// Delete one of the user's reminders.
    pub fn delete(&self, user_id: i64, reminder_id: i64) -> LaResult<()> {
        let conn = self.database.conn()?;
        if !Reminder::delete(&conn, reminder_id, user_id)? {
            return Err(LaError::NotFound(format!("reminder {reminder_id}")));
        }
        self.event_bus.emit(AppEvent::ReminderClosed {
            reminder_id,
            deleted: true,
        });
        Ok(())
    }

    /// Pending reminders due at or before `now`, across all users.
    pub fn due(&self, now: &NaiveDateTime) -> LaResult<Vec<Reminder>> {
        let conn = self.database.conn()?;
        Reminder::list_due(&conn, now)
    }

    /// Mark a reminder completed after delivery, regardless of owner.
    pub fn mark_delivered(&self, reminder_id: i64) -> LaResult<bool> {
        let conn = self.database.conn()?;
        Reminder::mark_completed(&conn, reminder_id, None)
    }
}

impl Service for ReminderService {
    fn name(&self) -> &str {
        "reminders"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> LaResult<()> {
        self.state = ServiceState::Initializing;
        let pending = self.due(&la_models::time::now())?.len();
        if pending > 0 {
            info!("{pending} reminder(s) already overdue at startup");
        }
        self.state = ServiceState::Running;
        Ok(())
    }

    fn shutdown(&mut self) -> LaResult<()> {
        self.state = ServiceState::Stopped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service() -> (ReminderService, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("t.db"), &Default::default()).unwrap();
        (ReminderService::new(db, EventBus::new(16)), dir)
    }

    fn at(s: &str) -> NaiveDateTime {
        la_models::time::parse_ts(s).unwrap()
    }

    #[test]
    fn test_add_from_text() {
        let (svc, _dir) = service();
        let r = svc
            .add_from_text(1, Some(10), "через 2 часа проверить почту", at("2025-01-10 12:00:00"))
            .unwrap();
        assert_eq!(r.text, "проверить почту");
        assert_eq!(r.due_date, at("2025-01-10 14:00:00"));
        assert!(r.id.is_some());
    }

    #[test]
    fn test_add_from_text_rejects_unknown_time() {
        let (svc, _dir) = service();
        let err = svc.add_from_text(1, None, "когда-нибудь потом", at("2025-01-10 12:00:00"));
        assert!(matches!(err, Err(LaError::Parse(_))));
    }

    #[test]
    fn test_add_requires_text() {
        let (svc, _dir) = service();
        let err = svc.add_from_text(1, None, "18:30", at("2025-01-10 12:00:00"));
        assert!(matches!(err, Err(LaError::Validation(_))));
    }

    #[test]
    fn test_complete_and_delete_are_scoped() {
        let (svc, _dir) = service();
        let r = svc.add(1, None, "x", at("2025-01-10 12:00:00")).unwrap();
        let id = r.id.unwrap();

        assert!(matches!(svc.complete(2, id), Err(LaError::NotFound(_))));
        svc.complete(1, id).unwrap();
        assert!(svc.list(1, false).unwrap().is_empty());
        assert!(matches!(svc.delete(2, id), Err(LaError::NotFound(_))));
        svc.delete(1, id).unwrap();
        assert!(svc.list(1, true).unwrap().is_empty());
    }

    #[test]
    fn test_due() {
        let (svc, _dir) = service();
        svc.add(1, None, "a", at("2025-01-10 12:00:00")).unwrap();
        svc.add(2, None, "b", at("2025-01-10 13:00:00")).unwrap();
        assert_eq!(svc.due(&at("2025-01-10 12:30:00")).unwrap().len(), 1);
        assert_eq!(svc.due(&at("2025-01-10 13:00:00")).unwrap().len(), 2);
    }
}
