//! Life Assistant Services - Business logic and service layer.
//!
//! This crate provides the service trait, the service registry, the event
//! bus and all concrete services:
//! - Workspace setup (data/log directories, `.env` seeding)
//! - Subscriptions (registration, extension, activity checks)
//! - Reminders (natural time parsing, due scanning, background delivery)
//! - Todo list (priorities, due dates)
//! - Finances (income/expense ledger, period reports)
//! - Chat monitoring (message log, mood, search, assistant triggers)
//! - Assistant (YandexGPT answers with chat context)
//! - Payment ledger (record keeping only)

pub mod service;
pub mod registry;
pub mod event_bus;
pub mod setup;
pub mod subscription;
pub mod time_parse;
pub mod reminder;
pub mod scheduler;
pub mod todo;
pub mod finance;
pub mod chat_monitor;
pub mod assistant;
pub mod payment_ledger;

// Re-export key types
pub use service::{Service, ServiceState};
pub use registry::ServiceRegistry;
pub use event_bus::{AppEvent, EventBus};
pub use setup::{EnvSeed, SetupReport, WorkspaceSetup};
pub use subscription::{SubscriptionService, SubscriptionStatus};
pub use reminder::ReminderService;
pub use scheduler::{ReminderScheduler, TickReport};
pub use todo::TodoService;
pub use finance::{FinanceService, FinancialReport, ReportPeriod};
pub use chat_monitor::{ChatMonitorService, MoodReport};
pub use assistant::AssistantService;
pub use payment_ledger::PaymentLedgerService;
