//! Service registry for dependency injection and lifecycle management.
//!
//! The registry holds the shared infrastructure (configuration, database,
//! event bus) and every registered service. It initializes services in
//! registration order and shuts them down in reverse.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use la_core::config::ConfigHandle;
use la_core::error::{LaError, LaResult};
use la_models::Database;

use crate::chat_monitor::ChatMonitorService;
use crate::event_bus::EventBus;
use crate::finance::FinanceService;
use crate::payment_ledger::PaymentLedgerService;
use crate::reminder::ReminderService;
use crate::service::{Service, ServiceState};
use crate::subscription::SubscriptionService;
use crate::todo::TodoService;

/// Central registry that owns the application services.
pub struct ServiceRegistry {
    /// Application configuration.
    pub config: ConfigHandle,
    /// Database connection pool.
    pub database: Database,
    /// Application-level event bus.
    pub event_bus: EventBus,
    /// Registered services in initialization order.
    services: Vec<(String, Arc<RwLock<Box<dyn Service>>>)>,
}

impl ServiceRegistry {
    pub fn new(config: ConfigHandle, database: Database) -> Self {
        Self {
            config,
            database,
            event_bus: EventBus::default(),
            services: Vec::new(),
        }
    }

    /// Register a service. Services are initialized in registration order.
    pub fn register<S: Service + 'static>(&mut self, service: S) {
        let name = service.name().to_string();
        info!("registered service: {name}");
        self.services.push((name, Arc::new(RwLock::new(Box::new(service)))));
    }

    /// Register the default services.
    ///
    /// Initialization order:
    /// 1. Subscription (config, database, event_bus)
    /// 2. Reminders (database, event_bus)
    /// 3. Todos (database, event_bus)
    /// 4. Finance (database, event_bus)
    /// 5. ChatMonitor (database, event_bus)
    /// 6. Payments (database, event_bus)
    pub async fn register_all(&mut self) {
        let bot = self.config.read().await.bot.clone();
        let db = self.database.clone();
        let bus = self.event_bus.clone();

        self.register(SubscriptionService::new(db.clone(), bus.clone(), &bot));
        self.register(ReminderService::new(db.clone(), bus.clone()));
        self.register(TodoService::new(db.clone(), bus.clone()));
        self.register(FinanceService::new(db.clone(), bus.clone()));
        self.register(ChatMonitorService::new(db.clone(), bus.clone()));
        self.register(PaymentLedgerService::new(db, bus));

        info!("registered {} default services", self.services.len());
    }

    /// Initialize all registered services in order. Stops at the first failure.
    pub async fn init_all(&self) -> LaResult<()> {
        info!("initializing {} services", self.services.len());

        for (name, service) in &self.services {
            info!("initializing service: {name}");
            let mut svc = service.write().await;
            if let Err(e) = svc.init() {
                error!("failed to initialize service {name}: {e}");
                return Err(LaError::ServiceInit(format!("{name}: {e}")));
            }
        }

        info!("all services initialized");
        Ok(())
    }

    /// Shut down all services in reverse order. Errors are logged and the
    /// remaining services are still shut down.
    pub async fn shutdown_all(&self) -> LaResult<()> {
        info!("shutting down services");

        for (name, service) in self.services.iter().rev() {
            info!("shutting down service: {name}");
            let mut svc = service.write().await;
            if let Err(e) = svc.shutdown() {
                error!("error shutting down service {name}: {e}");
            }
        }

        info!("all services shut down");
        Ok(())
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Name, state and health of every service.
    pub async fn health_check(&self) -> Vec<(String, ServiceState, bool)> {
        let mut results = Vec::new();
        for (name, service) in &self.services {
            let svc = service.read().await;
            results.push((name.clone(), svc.state(), svc.is_healthy()));
        }
        results
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }
}
