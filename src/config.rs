//! Configuration types for feed polling, delivery, and trigger scheduling.

use crate::error::{AlertError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Remote feed settings.
    pub feed: FeedConfig,
    /// Sync attempt and retry settings.
    pub sync: SyncConfig,
    /// Periodic and exact-time trigger settings.
    pub schedule: ScheduleConfig,
    /// Seen-identity store settings.
    pub store: StoreConfig,
    /// Notification rendering settings.
    pub notify: NotifyConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Remote feed configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Endpoint returning a JSON array of alerts.
    pub url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Custom User-Agent header (None = crate default).
    pub user_agent: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:1855/api/pokemon".to_owned(),
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

/// Sync attempt configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Attempts per trigger fire before the fire is reported as failed.
    pub max_retries: u32,
    /// Base delay between attempts; doubles after each retry.
    pub retry_backoff_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: crate::sync::MAX_RETRIES,
            retry_backoff_secs: 30,
        }
    }
}

/// Trigger path configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Cadence of the coarse periodic path.
    pub periodic_interval_secs: u64,
    /// Cadence of the exact-time path.
    pub exact_interval_secs: u64,
    /// Floor applied to every exact-time arm.
    pub exact_min_delay_secs: u64,
    /// Whether the exact-time path is permitted on this host.
    pub exact_enabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            periodic_interval_secs: 15 * 60,
            exact_interval_secs: 10 * 60,
            exact_min_delay_secs: 60,
            exact_enabled: true,
        }
    }
}

/// Seen-identity store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store file location (None = `app_dirs::seen_store_file()`).
    pub path: Option<PathBuf>,
    /// Maximum number of identities retained.
    pub max_seen: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_seen: crate::store::MAX_SEEN,
        }
    }
}

/// Notification rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Upper bound on the current-location lookup used for distance chips.
    pub location_timeout_ms: u64,
    /// Upper bound on posting a single notification.
    pub per_alert_budget_ms: u64,
    /// Fixed home latitude used when no live location source exists.
    pub home_latitude: Option<f64>,
    /// Fixed home longitude used when no live location source exists.
    pub home_longitude: Option<f64>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            location_timeout_ms: 5000,
            per_alert_budget_ms: 10_000,
            home_latitude: None,
            home_longitude: None,
        }
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Also write a daily-rolling log file under `app_dirs::logs_dir()`.
    pub file: bool,
}

impl SyncConfig {
    /// Base retry backoff as a [`Duration`].
    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }
}

impl NotifyConfig {
    /// Location lookup bound as a [`Duration`].
    #[must_use]
    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }

    /// Per-notification posting bound as a [`Duration`].
    #[must_use]
    pub fn per_alert_budget(&self) -> Duration {
        Duration::from_millis(self.per_alert_budget_ms)
    }
}

impl AlertConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AlertError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AlertError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validates this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.feed.url)
            .map_err(|e| AlertError::Config(format!("feed.url is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AlertError::Config(format!(
                "feed.url must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.feed.timeout_secs == 0 {
            return Err(AlertError::Config(
                "feed.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.sync.max_retries == 0 {
            return Err(AlertError::Config(
                "sync.max_retries must be at least 1".into(),
            ));
        }
        if self.schedule.periodic_interval_secs == 0 || self.schedule.exact_interval_secs == 0 {
            return Err(AlertError::Config(
                "schedule intervals must be greater than 0".into(),
            ));
        }
        if self.store.max_seen == 0 {
            return Err(AlertError::Config(
                "store.max_seen must be at least 1".into(),
            ));
        }
        if self.notify.home_latitude.is_some() != self.notify.home_longitude.is_some() {
            return Err(AlertError::Config(
                "notify.home_latitude and notify.home_longitude must be set together".into(),
            ));
        }
        Ok(())
    }

    /// Resolved seen-store location.
    #[must_use]
    pub fn seen_store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(crate::app_dirs::seen_store_file)
    }
}
