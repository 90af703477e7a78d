//! Life Assistant Core - Foundation types, error handling, configuration, and logging.
//!
//! This crate provides the shared foundation used by all other crates:
//! - Application configuration (TOML file plus environment overrides)
//! - Global error type covering all error categories
//! - Structured logging with tracing
//! - Platform directories and common constants

pub mod config;
pub mod error;
pub mod logging;
pub mod platform;
pub mod constants;

// Re-export commonly used items at the crate root
pub use config::{AppConfig, ConfigHandle};
pub use error::{LaError, LaResult};
pub use logging::init_logging;
