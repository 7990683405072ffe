//! # Sync Configuration
//!
//! Configuration management for the sync orchestrator.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TANDEM_DEVICE_ID=abc-123                                           │
//! │     TANDEM_MAX_CONCURRENT_PASSES=4                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/tandem-sync/sync.toml (Linux)                            │
//! │     ~/Library/Application Support/org.tandem.tandem-sync/sync.toml     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     auto-generated device_id, sequential passes                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [device]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Work Laptop"
//!
//! [client]
//! user_agent = "tandem-sync/0.1.0"
//! connect_timeout_secs = 10
//! request_timeout_secs = 60
//!
//! [sync]
//! max_concurrent_passes = 1
//! initial_backoff_ms = 500
//! max_backoff_secs = 3600
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Device Configuration
// =============================================================================

/// Configuration for this device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Unique device identifier, used as the process-wide platform id.
    /// Auto-generated on first run if not provided.
    pub id: String,

    /// Human-readable device name.
    #[serde(default = "default_device_name")]
    pub name: String,
}

fn default_device_name() -> String {
    "Tandem Device".to_string()
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig {
            id: Uuid::new_v4().to_string(),
            name: default_device_name(),
        }
    }
}

// =============================================================================
// Client Settings
// =============================================================================

/// Settings for the shared network client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// User agent prefix. The platform id is appended at client creation.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// TCP/TLS connect timeout (seconds).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long idle pooled connections are kept (seconds).
    #[serde(default = "default_pool_idle_timeout")]
    pub pool_idle_timeout_secs: u64,
}

fn default_user_agent() -> String {
    format!("tandem-sync/{}", env!("CARGO_PKG_VERSION"))
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_request_timeout() -> u64 {
    60
}
fn default_pool_idle_timeout() -> u64 {
    90
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            pool_idle_timeout_secs: default_pool_idle_timeout(),
        }
    }
}

impl ClientSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }
}

// =============================================================================
// Sync Settings
// =============================================================================

/// Invocation behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Passes that may run at once within one invocation.
    /// 1 processes pairs sequentially.
    #[serde(default = "default_max_concurrent_passes")]
    pub max_concurrent_passes: usize,

    /// First back-off suggested after a soft-failed invocation (milliseconds).
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound for suggested back-off (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
}

fn default_max_concurrent_passes() -> usize {
    1
}
fn default_initial_backoff() -> u64 {
    500
}
fn default_max_backoff() -> u64 {
    3600
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            max_concurrent_passes: default_max_concurrent_passes(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
        }
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Device-specific configuration.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Shared network client settings.
    #[serde(default)]
    pub client: ClientSettings,

    /// Invocation behavior settings.
    #[serde(default)]
    pub sync: SyncSettings,
}

impl SyncConfig {
    /// Creates a new config with defaults and a generated device ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| SyncError::ConfigLoadFailed(e.to_string()))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SyncError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.device.id.trim().is_empty() {
            return Err(SyncError::MissingDeviceId);
        }

        if self.sync.max_concurrent_passes == 0 {
            return Err(SyncError::InvalidConfig(
                "max_concurrent_passes must be greater than 0".into(),
            ));
        }

        if self.client.connect_timeout_secs == 0 || self.client.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "client timeouts must be greater than 0".into(),
            ));
        }

        if self.sync.initial_backoff_ms > self.sync.max_backoff_secs.saturating_mul(1000) {
            return Err(SyncError::InvalidConfig(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_secs ({})",
                self.sync.initial_backoff_ms, self.sync.max_backoff_secs
            )));
        }

        Ok(())
    }

    /// Applies overrides looked up by environment variable name.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(id) = lookup("TANDEM_DEVICE_ID") {
            debug!(device_id = %id, "Overriding device ID from environment");
            self.device.id = id;
        }

        if let Some(name) = lookup("TANDEM_DEVICE_NAME") {
            self.device.name = name;
        }

        if let Some(agent) = lookup("TANDEM_USER_AGENT") {
            self.client.user_agent = agent;
        }

        if let Some(passes) = lookup("TANDEM_MAX_CONCURRENT_PASSES") {
            match passes.parse::<usize>() {
                Ok(n) => {
                    debug!(passes = n, "Overriding pass concurrency from environment");
                    self.sync.max_concurrent_passes = n;
                }
                Err(_) => warn!(value = %passes, "Ignoring invalid TANDEM_MAX_CONCURRENT_PASSES"),
            }
        }

        if let Some(timeout) = lookup("TANDEM_REQUEST_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) => self.client.request_timeout_secs = secs,
                Err(_) => warn!(value = %timeout, "Ignoring invalid TANDEM_REQUEST_TIMEOUT_SECS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "tandem", "tandem-sync")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Returns the device ID.
    pub fn device_id(&self) -> &str {
        &self.device.id
    }

    /// Returns the pass concurrency limit.
    pub fn max_concurrent_passes(&self) -> usize {
        self.sync.max_concurrent_passes
    }
}
