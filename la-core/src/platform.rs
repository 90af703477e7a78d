//! OS-specific directories.

use std::path::PathBuf;
use crate::error::{LaError, LaResult};

/// Per-user configuration directory for the application.
///
/// - Windows: `%APPDATA%/LifeAssistant`
/// - macOS: `~/Library/Application Support/LifeAssistant`
/// - Linux: `~/.config/LifeAssistant`
pub fn config_dir() -> LaResult<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| LaError::Config("could not determine config directory".into()))?;
    Ok(base.join(crate::constants::APP_NAME))
}
