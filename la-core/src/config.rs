//! Application configuration management.
//!
//! Configuration is read from a TOML file (every section optional) and then
//! overlaid with environment variables, which may come from a `.env` file
//! loaded by `dotenvy`. Environment values always win over the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LaError, LaResult};
use crate::platform;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Telegram bot and subscription settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// YandexGPT assistant settings.
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Reminder scheduler settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Workspace layout used by `init`.
    #[serde(default)]
    pub setup: SetupConfig,
}

/// Telegram bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot API token issued by BotFather.
    #[serde(default)]
    pub telegram_token: String,

    /// Bot username without the leading `@`.
    #[serde(default)]
    pub bot_username: String,

    /// Telegram user id that always has an active subscription.
    #[serde(default = "default_admin_id")]
    pub admin_id: i64,

    /// Monthly subscription price in rubles.
    #[serde(default = "default_subscription_price")]
    pub subscription_price: f64,

    /// Days granted per purchased subscription month.
    #[serde(default = "default_days_per_month")]
    pub subscription_days_per_month: i64,

    /// Bot API request timeout in milliseconds.
    #[serde(default = "default_api_timeout")]
    pub api_timeout_ms: u64,

    /// Bot API origin. Overridable for a local Bot API server.
    #[serde(default = "default_telegram_api")]
    pub api_base_url: String,
}

/// YandexGPT configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub folder_id: String,

    /// Completion endpoint URL.
    #[serde(default = "default_assistant_endpoint")]
    pub endpoint: String,

    /// Model path appended to `gpt://<folder_id>/`.
    #[serde(default = "default_assistant_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_api_timeout")]
    pub timeout_ms: u64,

    /// Number of recent chat messages sent along as context.
    #[serde(default = "default_context_messages")]
    pub context_messages: u32,
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL. Only `sqlite://` URLs are supported.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Enable WAL (Write-Ahead Logging) mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Run integrity check on startup.
    #[serde(default = "default_true")]
    pub integrity_check_on_startup: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path. Rotated daily next to this path.
    #[serde(default = "default_log_file")]
    pub file: String,

    /// Enable JSON structured logging output in the file.
    #[serde(default)]
    pub json_output: bool,
}

/// Reminder scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between due-reminder scans.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Delay before the first scan after startup.
    #[serde(default = "default_first_delay_secs")]
    pub first_delay_secs: u64,
}

/// Local workspace layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_logs_dir")]
    pub logs_dir: String,

    /// Environment file seeded from the template.
    #[serde(default = "default_env_file")]
    pub env_file: String,

    #[serde(default = "default_env_template")]
    pub env_template: String,
}

// Default value functions for serde

fn default_admin_id() -> i64 {
    86_458_589
}

fn default_subscription_price() -> f64 {
    500.0
}

fn default_days_per_month() -> i64 {
    30
}

fn default_api_timeout() -> u64 {
    30_000
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

fn default_assistant_endpoint() -> String {
    "https://llm.api.cloud.yandex.net/foundationModels/v1/completion".to_string()
}

fn default_assistant_model() -> String {
    "yandexgpt/latest".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_context_messages() -> u32 {
    15
}

fn default_database_url() -> String {
    "sqlite:///data/bot_database.db".to_string()
}

fn default_true() -> bool {
    true
}

fn default_pool_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/bot.log".to_string()
}

fn default_interval_secs() -> u64 {
    60
}

fn default_first_delay_secs() -> u64 {
    10
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_logs_dir() -> String {
    "logs".to_string()
}

fn default_env_file() -> String {
    ".env".to_string()
}

fn default_env_template() -> String {
    ".env.example".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_token: String::new(),
            bot_username: String::new(),
            admin_id: default_admin_id(),
            subscription_price: default_subscription_price(),
            subscription_days_per_month: default_days_per_month(),
            api_timeout_ms: default_api_timeout(),
            api_base_url: default_telegram_api(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            folder_id: String::new(),
            endpoint: default_assistant_endpoint(),
            model: default_assistant_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_ms: default_api_timeout(),
            context_messages: default_context_messages(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            wal_mode: true,
            pool_size: default_pool_size(),
            integrity_check_on_startup: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
            json_output: false,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            first_delay_secs: default_first_delay_secs(),
        }
    }
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            logs_dir: default_logs_dir(),
            env_file: default_env_file(),
            env_template: default_env_template(),
        }
    }
}

impl AppConfig {
    /// Load configuration and apply process environment overrides.
    ///
    /// With an explicit `path` the file must exist. Otherwise `./config.toml`
    /// is tried, then the platform config directory, then defaults.
    pub fn load(path: Option<&Path>) -> LaResult<Self> {
        let mut config = match path {
            Some(p) => Self::load_from_file(p)?,
            None => match Self::discover_config_file() {
                Some(found) => Self::load_from_file(&found)?,
                None => Self::default(),
            },
        };
        config.apply_env_overrides_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path without env overrides.
    pub fn load_from_file(path: &Path) -> LaResult<Self> {
        debug!("loading config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Find the first existing config file among the default locations.
    pub fn discover_config_file() -> Option<PathBuf> {
        let local = PathBuf::from("config.toml");
        if local.exists() {
            return Some(local);
        }
        platform::config_dir()
            .ok()
            .map(|dir| dir.join("config.toml"))
            .filter(|p| p.exists())
    }

    /// Overlay values from an environment lookup function.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> LaResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("TELEGRAM_TOKEN") {
            self.bot.telegram_token = v;
        }
        if let Some(v) = get("BOT_USERNAME") {
            self.bot.bot_username = v.trim_start_matches('@').to_string();
        }
        if let Some(v) = get("ADMIN_ID") {
            self.bot.admin_id = parse_env("ADMIN_ID", &v)?;
        }
        if let Some(v) = get("SUBSCRIPTION_PRICE") {
            self.bot.subscription_price = parse_env("SUBSCRIPTION_PRICE", &v)?;
        }
        if let Some(v) = get("YANDEX_API_KEY") {
            self.assistant.api_key = v;
        }
        if let Some(v) = get("YANDEX_FOLDER_ID") {
            self.assistant.folder_id = v;
        }
        if let Some(v) = get("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.logging.level = v.to_lowercase();
        }
        if let Some(v) = get("LOG_FILE") {
            self.logging.file = v;
        }
        Ok(())
    }

    /// Resolve the SQLite file path from the database URL.
    ///
    /// `sqlite:///data/x.db` is relative (`data/x.db`), `sqlite:////srv/x.db`
    /// is absolute. Other schemes are rejected.
    pub fn effective_db_path(&self) -> LaResult<PathBuf> {
        sqlite_path_from_url(&self.database.url)
    }

    /// Path of the configured log file. Relative paths resolve against `root`.
    pub fn log_file_path(&self, root: &Path) -> PathBuf {
        let file = Path::new(&self.logging.file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            root.join(file)
        }
    }

    /// Ensure the values needed to talk to Telegram are present.
    pub fn require_telegram(&self) -> LaResult<()> {
        if self.bot.telegram_token.trim().is_empty() {
            return Err(LaError::MissingConfig("TELEGRAM_TOKEN".into()));
        }
        Ok(())
    }

    /// Ensure the values needed to call YandexGPT are present.
    pub fn require_assistant(&self) -> LaResult<()> {
        let mut missing = Vec::new();
        if self.assistant.api_key.trim().is_empty() {
            missing.push("YANDEX_API_KEY");
        }
        if self.assistant.folder_id.trim().is_empty() {
            missing.push("YANDEX_FOLDER_ID");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LaError::MissingConfig(missing.join(", ")))
        }
    }

    /// Whether a Telegram token has been configured.
    pub fn is_telegram_configured(&self) -> bool {
        self.require_telegram().is_ok()
    }
}

/// Load a `.env` file into the process environment.
///
/// Variables already set in the environment are not overwritten. A missing
/// file is not an error; a malformed one is.
pub fn load_env_file(path: &Path) -> LaResult<bool> {
    if !path.exists() {
        debug!("no env file at {}", path.display());
        return Ok(false);
    }
    dotenvy::from_path(path)
        .map_err(|e| LaError::Config(format!("failed to load {}: {e}", path.display())))?;
    debug!("loaded environment from {}", path.display());
    Ok(true)
}

/// Convert a `sqlite://` URL into a filesystem path.
pub fn sqlite_path_from_url(url: &str) -> LaResult<PathBuf> {
    let trimmed = url.trim();
    let rest = trimmed
        .strip_prefix("sqlite://")
        .ok_or_else(|| LaError::Config(format!("unsupported database url: {trimmed}")))?;

    // sqlite:///relative and sqlite:////absolute
    let path = rest.strip_prefix('/').unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        return Err(LaError::Config(format!("database url has no file path: {trimmed}")));
    }
    Ok(PathBuf::from(path))
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> LaResult<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| LaError::Config(format!("invalid value for {key}: {value}")))
}

/// Thread-safe configuration holder for shared access across services.
#[derive(Clone)]
pub struct ConfigHandle {
    inner: Arc<RwLock<AppConfig>>,
}

impl ConfigHandle {
    /// Create a new configuration handle.
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Read the configuration.
    pub async fn read(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.read().await
    }

    /// Write/update the configuration.
    pub async fn write(&self) -> tokio::sync::RwLockWriteGuard<'_, AppConfig> {
        self.inner.write().await
    }

    /// Clone the current configuration out of the lock.
    pub async fn snapshot(&self) -> AppConfig {
        self.inner.read().await.clone()
    }
}
