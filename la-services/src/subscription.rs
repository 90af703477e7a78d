//! User registration and subscription bookkeeping.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::info;

use la_core::config::BotConfig;
use la_core::error::{LaError, LaResult};
use la_models::{Database, User};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{Service, ServiceState};

/// Snapshot of a user's subscription.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatus {
    pub user_id: i64,
    pub is_admin: bool,
    pub active: bool,
    pub end: Option<NaiveDate>,
    /// Days until `end`, never negative.
    pub days_left: i64,
}

/// Registers users and manages their paid period.
pub struct SubscriptionService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
    admin_id: i64,
    days_per_month: i64,
}

impl SubscriptionService {
    pub fn new(database: Database, event_bus: EventBus, config: &BotConfig) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
            admin_id: config.admin_id,
            days_per_month: config.subscription_days_per_month.max(1),
        }
    }

    /// Store a user unless already known. Returns `true` for a new user.
    pub fn register_user(&self, user: &User) -> LaResult<bool> {
        let conn = self.database.conn()?;
        let inserted = user.upsert_ignore(&conn)?;
        if inserted {
            info!("registered user {}", user.user_id);
            self.event_bus.emit(AppEvent::UserRegistered { user_id: user.user_id });
        }
        Ok(inserted)
    }

    /// Extend a subscription by whole months.
    ///
    /// The new period starts from the later of the current end date and
    /// `today`, so an expired subscription does not swallow paid days.
    /// Unknown users are registered first.
    pub fn extend(&self, user_id: i64, months: u32, today: NaiveDate) -> LaResult<NaiveDate> {
        if months == 0 {
            return Err(LaError::Validation("months must be at least 1".into()));
        }

        let extension = self
            .days_per_month
            .checked_mul(i64::from(months))
            .and_then(Duration::try_days)
            .ok_or_else(|| LaError::Validation(format!("{months} month(s) is out of range")))?;
        let new_end = self.database.transaction(|conn| {
            User::new(user_id).upsert_ignore(conn)?;
            let current = User::find(conn, user_id)?
                .and_then(|u| u.subscription_end)
                .unwrap_or(today);
            let start = current.max(today);
            let new_end = start
                .checked_add_signed(extension)
                .ok_or_else(|| LaError::Validation("subscription end out of range".into()))?;
            User::set_subscription_end(conn, user_id, new_end)?;
            Ok(new_end)
        })?;

        info!("extended subscription of user {user_id} by {months} month(s) to {new_end}");
        self.event_bus.emit(AppEvent::SubscriptionExtended { user_id, new_end });
        Ok(new_end)
    }

    /// Admin is always active; everyone else needs an end date after `today`.
    pub fn is_active(&self, user_id: i64, today: NaiveDate) -> LaResult<bool> {
        Ok(self.status(user_id, today)?.active)
    }

    /// Full subscription status. Unknown users are reported inactive.
    pub fn status(&self, user_id: i64, today: NaiveDate) -> LaResult<SubscriptionStatus> {
        let conn = self.database.conn()?;
        let end = User::find(&conn, user_id)?.and_then(|u| u.subscription_end);
        let is_admin = user_id == self.admin_id;
        let active = is_admin || end.map(|e| e > today).unwrap_or(false);
        let days_left = end.map(|e| (e - today).num_days().max(0)).unwrap_or(0);

        Ok(SubscriptionStatus {
            user_id,
            is_admin,
            active,
            end,
            days_left,
        })
    }

    /// All known users.
    pub fn list_users(&self) -> LaResult<Vec<User>> {
        let conn = self.database.conn()?;
        User::list(&conn)
    }
}

impl Service for SubscriptionService {
    fn name(&self) -> &str {
        "subscription"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> LaResult<()> {
        self.state = ServiceState::Running;
        info!("subscription service initialized (admin id {})", self.admin_id);
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

    fn service() -> (SubscriptionService, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("t.db"), &Default::default()).unwrap();
        let config = BotConfig {
            admin_id: 1,
            ..BotConfig::default()
        };
        (SubscriptionService::new(db, EventBus::new(16), &config), dir)
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_extend_from_today_when_never_subscribed() {
        let (svc, _dir) = service();
        let end = svc.extend(42, 1, day("2025-01-01")).unwrap();
        assert_eq!(end, day("2025-01-31"));
    }

    #[test]
    fn test_extend_stacks_on_active_period() {
        let (svc, _dir) = service();
        svc.extend(42, 1, day("2025-01-01")).unwrap();
        let end = svc.extend(42, 2, day("2025-01-10")).unwrap();
        assert_eq!(end, day("2025-04-01"));
    }

    #[test]
    fn test_extend_overflow_is_rejected() {
        let dir = TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("t.db"), &Default::default()).unwrap();
        let config = BotConfig {
            subscription_days_per_month: i64::MAX / 2,
            ..BotConfig::default()
        };
        let svc = SubscriptionService::new(db, EventBus::new(16), &config);

        let err = svc.extend(42, 3, day("2025-01-01")).unwrap_err();
        assert!(matches!(err, LaError::Validation(_)));
        assert_eq!(svc.status(42, day("2025-01-01")).unwrap().end, None);

        // a day count that fits i64 but not the calendar
        let err = svc.extend(42, 1, day("2025-01-01")).unwrap_err();
        assert!(matches!(err, LaError::Validation(_)));
    }

    #[test]
    fn test_extend_after_expiry_starts_today() {
        let (svc, _dir) = service();
        svc.extend(42, 1, day("2024-01-01")).unwrap();
        let end = svc.extend(42, 1, day("2025-06-01")).unwrap();
        assert_eq!(end, day("2025-07-01"));
    }

    #[test]
    fn test_zero_months_rejected() {
        let (svc, _dir) = service();
        assert!(matches!(svc.extend(42, 0, day("2025-01-01")), Err(LaError::Validation(_))));
    }

    #[test]
    fn test_active_boundary() {
        let (svc, _dir) = service();
        svc.extend(42, 1, day("2025-01-01")).unwrap();
        assert!(svc.is_active(42, day("2025-01-30")).unwrap());
        assert!(!svc.is_active(42, day("2025-01-31")).unwrap());

        let status = svc.status(42, day("2025-01-21")).unwrap();
        assert_eq!(status.days_left, 10);
    }

    #[test]
    fn test_admin_always_active() {
        let (svc, _dir) = service();
        assert!(svc.is_active(1, day("2030-01-01")).unwrap());
        assert!(!svc.is_active(2, day("2030-01-01")).unwrap());
    }

    #[tokio::test]
    async fn test_register_emits_once() {
        let (svc, _dir) = service();
        let mut rx = svc.event_bus.subscribe();
        assert!(svc.register_user(&User::new(7)).unwrap());
        assert!(!svc.register_user(&User::new(7)).unwrap());
        assert!(matches!(rx.recv().await.unwrap(), AppEvent::UserRegistered { user_id: 7 }));
        assert!(rx.try_recv().is_err());
    }
}
