//! Payment bookkeeping. Rows are recorded and updated by hand or by an
//! operator; no payment provider is contacted.

use tracing::info;

use la_core::error::{LaError, LaResult};
use la_models::models::payment::status;
use la_models::{Database, Payment};

use crate::event_bus::{AppEvent, EventBus};
use crate::service::{Service, ServiceState};

const KNOWN_STATUSES: &[&str] = &[status::PENDING, status::SUCCEEDED, status::CANCELED];

fn check_status(value: &str) -> LaResult<&str> {
    let value = value.trim();
    if KNOWN_STATUSES.contains(&value) {
        Ok(value)
    } else {
        Err(LaError::Validation(format!(
            "unknown payment status '{value}', expected one of {}",
            KNOWN_STATUSES.join(", ")
        )))
    }
}

pub struct PaymentLedgerService {
    state: ServiceState,
    database: Database,
    event_bus: EventBus,
}

impl PaymentLedgerService {
    pub fn new(database: Database, event_bus: EventBus) -> Self {
        Self {
            state: ServiceState::Created,
            database,
            event_bus,
        }
    }

    /// Write a payment row.
    pub fn record(&self, user_id: i64, amount: f64, payment_id: &str, status: &str) -> LaResult<Payment> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LaError::Validation(format!("amount must be positive, got {amount}")));
        }
        let payment_id = payment_id.trim();
        if payment_id.is_empty() {
            return Err(LaError::Validation("payment id is empty".into()));
        }
        let status = check_status(status)?;

        let mut payment = Payment::new(user_id, amount, payment_id, status);
        let conn = self.database.conn()?;
        payment.insert(&conn)?;

        info!("recorded payment {payment_id} for user {user_id} ({status})");
        self.event_bus.emit(AppEvent::PaymentRecorded {
            payment_id: payment_id.to_string(),
            user_id,
            status: status.to_string(),
        });
        Ok(payment)
    }

    pub fn list(&self, user_id: i64) -> LaResult<Vec<Payment>> {
        let conn = self.database.conn()?;
        Payment::list_for_user(&conn, user_id)
    }

    pub fn find(&self, payment_id: &str) -> LaResult<Option<Payment>> {
        let conn = self.database.conn()?;
        Payment::find_by_payment_id(&conn, payment_id)
    }

    /// Change the status of every row with this provider id.
    pub fn set_status(&self, payment_id: &str, status: &str) -> LaResult<usize> {
        let status = check_status(status)?;
        let conn = self.database.conn()?;
        let touched = Payment::update_status(&conn, payment_id, status)?;
        if touched == 0 {
            return Err(LaError::NotFound(format!("payment {payment_id}")));
        }

        info!("payment {payment_id} is now {status}");
        self.event_bus.emit(AppEvent::PaymentStatusChanged {
            payment_id: payment_id.to_string(),
            status: status.to_string(),
        });
        Ok(touched)
    }
}

impl Service for PaymentLedgerService {
    fn name(&self) -> &str {
        "payments"
    }

    fn state(&self) -> ServiceState {
        self.state
    }

    fn init(&mut self) -> LaResult<()> {
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

    fn service() -> (PaymentLedgerService, TempDir) {
        let dir = TempDir::new().unwrap();
        let db = Database::init(&dir.path().join("t.db"), &Default::default()).unwrap();
        (PaymentLedgerService::new(db, EventBus::new(16)), dir)
    }

    #[test]
    fn test_record_and_list() {
        let (svc, _dir) = service();
        svc.record(1, 500.0, "pay-1", "pending").unwrap();
        svc.record(1, 500.0, "pay-2", "succeeded").unwrap();
        svc.record(2, 500.0, "pay-3", "pending").unwrap();

        let mine = svc.list(1).unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().any(|p| p.is_succeeded()));
    }

    #[test]
    fn test_record_validation() {
        let (svc, _dir) = service();
        assert!(matches!(svc.record(1, 0.0, "p", "pending"), Err(LaError::Validation(_))));
        assert!(matches!(svc.record(1, 10.0, " ", "pending"), Err(LaError::Validation(_))));
        assert!(matches!(svc.record(1, 10.0, "p", "refunded"), Err(LaError::Validation(_))));
    }

    #[test]
    fn test_set_status() {
        let (svc, _dir) = service();
        svc.record(1, 500.0, "pay-1", "pending").unwrap();

        assert_eq!(svc.set_status("pay-1", "succeeded").unwrap(), 1);
        assert!(svc.find("pay-1").unwrap().unwrap().is_succeeded());
        assert!(matches!(svc.set_status("missing", "canceled"), Err(LaError::NotFound(_))));
    }
}
