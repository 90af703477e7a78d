//! Service trait and lifecycle management.
//!
//! All services implement the `Service` trait which provides a standard
//! lifecycle (init, shutdown) and health checking interface.

use la_core::error::LaResult;

/// Lifecycle state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    /// Service has been created but not initialized.
    Created,
    /// Service is initializing.
    Initializing,
    /// Service is running and ready.
    Running,
    /// Service is shutting down.
    ShuttingDown,
    /// Service has been stopped.
    Stopped,
    /// Service encountered a fatal error.
    Failed,
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Initializing => write!(f, "initializing"),
            Self::Running => write!(f, "running"),
            Self::ShuttingDown => write!(f, "shutting_down"),
            Self::Stopped => write!(f, "stopped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Standard lifecycle for every assistant service.
///
/// Services are initialized in registration order by the `ServiceRegistry`
/// and shut down in reverse.
pub trait Service: Send + Sync {
    /// Human-readable name of this service.
    fn name(&self) -> &str;

    /// Current state of this service.
    fn state(&self) -> ServiceState;

    /// Initialize the service. Called once during application startup.
    fn init(&mut self) -> LaResult<()>;

    /// Gracefully shut down the service. Called during application teardown.
    fn shutdown(&mut self) -> LaResult<()>;

    /// Health check. Returns true if the service is operational.
    fn is_healthy(&self) -> bool {
        self.state() == ServiceState::Running
    }
}
