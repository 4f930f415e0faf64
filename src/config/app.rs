//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! cinema-queue service, including environment variable loading, TOML file
//! loading and validation.

use crate::types::{EntryId, DEFAULT_TICKET_BASE, MAX_TICKET_BASE};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub queue: QueueSettings,
    pub messages: MessageSettings,
    pub persistence: PersistenceSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Interface the HTTP server binds to
    pub host: String,
    /// Port for the queue API, health and metrics endpoints
    pub http_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Queue behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// First ticket number of every session
    pub ticket_id_base: EntryId,
    /// How many served customers the history view shows by default
    pub history_display_limit: usize,
    /// Every n-th served customer triggers a celebration
    pub celebration_interval: usize,
}

/// Decorative message settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageSettings {
    /// Attach a message to served tickets
    pub enabled: bool,
    /// Upper bound on a generator call, in milliseconds
    pub timeout_ms: u64,
}

/// History snapshot settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceSettings {
    /// Write the served history here after every serve
    pub history_snapshot_path: Option<PathBuf>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "cinema-queue".to_string(),
            log_level: "info".to_string(),
            host: "0.0.0.0".to_string(),
            http_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            ticket_id_base: DEFAULT_TICKET_BASE,
            history_display_limit: 6,
            celebration_interval: 5,
        }
    }
}

impl Default for MessageSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 1500,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("Invalid {} value: {}", key, value)),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still win
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(host) = env::var("HTTP_HOST") {
            self.service.host = host;
        }
        if let Some(port) = parse_var("HTTP_PORT")? {
            self.service.http_port = port;
        }
        if let Some(timeout) = parse_var("SHUTDOWN_TIMEOUT_SECONDS")? {
            self.service.shutdown_timeout_seconds = timeout;
        }

        // Queue settings
        if let Some(base) = parse_var("TICKET_ID_BASE")? {
            self.queue.ticket_id_base = base;
        }
        if let Some(limit) = parse_var("HISTORY_DISPLAY_LIMIT")? {
            self.queue.history_display_limit = limit;
        }
        if let Some(interval) = parse_var("CELEBRATION_INTERVAL")? {
            self.queue.celebration_interval = interval;
        }

        // Message settings
        if let Some(enabled) = parse_var("MESSAGES_ENABLED")? {
            self.messages.enabled = enabled;
        }
        if let Some(timeout) = parse_var("MESSAGE_TIMEOUT_MS")? {
            self.messages.timeout_ms = timeout;
        }

        // Persistence settings
        if let Ok(path) = env::var("HISTORY_SNAPSHOT_PATH") {
            self.persistence.history_snapshot_path = Some(PathBuf::from(path));
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get message generator timeout as Duration
    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.messages.timeout_ms)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate server settings
    if config.service.http_port == 0 {
        return Err(anyhow!("HTTP port cannot be 0"));
    }
    if config.service.host.is_empty() {
        return Err(anyhow!("HTTP host cannot be empty"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate queue settings
    if config.queue.ticket_id_base > MAX_TICKET_BASE {
        return Err(anyhow!(
            "Ticket id base {} exceeds maximum {}",
            config.queue.ticket_id_base,
            MAX_TICKET_BASE
        ));
    }
    if config.queue.history_display_limit == 0 {
        return Err(anyhow!("History display limit must be greater than 0"));
    }
    if config.queue.celebration_interval == 0 {
        return Err(anyhow!("Celebration interval must be greater than 0"));
    }

    // Validate message settings
    if config.messages.timeout_ms == 0 {
        return Err(anyhow!("Message timeout must be greater than 0"));
    }

    if let Some(path) = &config.persistence.history_snapshot_path {
        if path.as_os_str().is_empty() {
            return Err(anyhow!("History snapshot path cannot be empty"));
        }
    }

    Ok(())
}
