//! Typed event bus for intra-service communication.
//!
//! Uses a tokio broadcast channel so services can announce state changes
//! without knowing who listens. Every subscriber gets every event.

use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use chrono::{NaiveDate, NaiveDateTime};

/// Application-level state changes.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A user was seen for the first time.
    UserRegistered {
        user_id: i64,
    },
    /// A subscription end date moved forward.
    SubscriptionExtended {
        user_id: i64,
        new_end: NaiveDate,
    },
    /// A reminder was stored.
    ReminderCreated {
        reminder_id: i64,
        user_id: i64,
        due: NaiveDateTime,
    },
    /// A reminder was delivered by the scheduler and marked completed.
    ReminderDelivered {
        reminder_id: i64,
        chat_id: i64,
    },
    /// Delivery failed; the reminder stays pending for the next tick.
    ReminderFailed {
        reminder_id: i64,
        error: String,
    },
    /// A reminder was completed or deleted by its owner.
    ReminderClosed {
        reminder_id: i64,
        deleted: bool,
    },
    /// A todo was added.
    TodoAdded {
        todo_id: i64,
        user_id: i64,
        priority: i64,
    },
    /// A todo was completed.
    TodoCompleted {
        todo_id: i64,
        user_id: i64,
    },
    /// A todo was deleted.
    TodoDeleted {
        todo_id: i64,
        user_id: i64,
    },
    /// An income or expense entry was recorded.
    TransactionRecorded {
        entry_id: i64,
        user_id: i64,
        amount: f64,
        is_income: bool,
    },
    /// A chat message was written to the log.
    ChatMessageLogged {
        chat_id: i64,
        user_id: i64,
        is_bot: bool,
    },
    /// The assistant answered a question.
    AssistantAnswered {
        chat_id: i64,
        user_id: i64,
    },
    /// A payment row was written.
    PaymentRecorded {
        payment_id: String,
        user_id: i64,
        status: String,
    },
    /// A payment row changed status.
    PaymentStatusChanged {
        payment_id: String,
        status: String,
    },
}

/// Application-wide event bus backed by a tokio broadcast channel.
///
/// Slow subscribers that fall behind receive a `Lagged` error and may miss
/// events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<AppEvent>>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Subscribe to receive application events.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: AppEvent) {
        let label = event_label(&event);
        match self.sender.send(event) {
            Ok(count) => {
                debug!("event_bus: emitted {label} to {count} subscriber(s)");
            }
            Err(_) => {
                debug!("event_bus: no subscribers for {label}");
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Human-readable label for an event (for logging).
pub fn event_label(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::UserRegistered { .. } => "UserRegistered",
        AppEvent::SubscriptionExtended { .. } => "SubscriptionExtended",
        AppEvent::ReminderCreated { .. } => "ReminderCreated",
        AppEvent::ReminderDelivered { .. } => "ReminderDelivered",
        AppEvent::ReminderFailed { .. } => "ReminderFailed",
        AppEvent::ReminderClosed { .. } => "ReminderClosed",
        AppEvent::TodoAdded { .. } => "TodoAdded",
        AppEvent::TodoCompleted { .. } => "TodoCompleted",
        AppEvent::TodoDeleted { .. } => "TodoDeleted",
        AppEvent::TransactionRecorded { .. } => "TransactionRecorded",
        AppEvent::ChatMessageLogged { .. } => "ChatMessageLogged",
        AppEvent::AssistantAnswered { .. } => "AssistantAnswered",
        AppEvent::PaymentRecorded { .. } => "PaymentRecorded",
        AppEvent::PaymentStatusChanged { .. } => "PaymentStatusChanged",
    }
}
