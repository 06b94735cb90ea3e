//! Centralized filesystem paths for alertsync.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data | `~/Library/Application Support/alertsync/` | `~/.local/share/alertsync/` |
//! | Config | `~/Library/Application Support/alertsync/` | `~/.config/alertsync/` |
//!
//! # Environment Overrides
//!
//! - `ALERTSYNC_DATA_DIR` overrides [`data_dir`]
//! - `ALERTSYNC_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Holds the seen-identity store and log files.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ALERTSYNC_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("alertsync"))
        .unwrap_or_else(|| PathBuf::from("/tmp/alertsync-data"))
}

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ALERTSYNC_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("alertsync"))
        .unwrap_or_else(|| PathBuf::from("/tmp/alertsync-config"))
}

/// Log file directory (`data_dir()/logs/`).
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Seen-identity store path (`data_dir()/seen_alerts.json`).
#[must_use]
pub fn seen_store_file() -> PathBuf {
    data_dir().join("seen_alerts.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_dir_is_nonempty() {
        assert!(!data_dir().as_os_str().is_empty());
    }

    #[test]
    fn config_file_ends_with_config_toml() {
        let path = config_file();
        let s = path.to_string_lossy();
        assert!(s.ends_with("config.toml"), "config_file: {s}");
    }

    #[test]
    fn seen_store_file_ends_with_json() {
        let path = seen_store_file();
        let s = path.to_string_lossy();
        assert!(s.ends_with("seen_alerts.json"), "seen_store_file: {s}");
    }

    #[test]
    fn logs_dir_is_subpath_of_data_dir() {
        let logs = logs_dir();
        let data = data_dir();
        assert!(
            logs.starts_with(&data),
            "logs_dir ({}) should start with data_dir ({})",
            logs.display(),
            data.display()
        );
    }

    #[test]
    fn config_dir_override_via_env() {
        let key = "ALERTSYNC_CONFIG_DIR";
        let original = std::env::var_os(key);

        // SAFETY: no other test in this crate reads or writes this variable.
        unsafe { std::env::set_var(key, "/custom/config") };
        let result = config_dir();
        assert_eq!(result, PathBuf::from("/custom/config"));

        match original {
            Some(val) => unsafe { std::env::set_var(key, val) },
            None => unsafe { std::env::remove_var(key) },
        }
    }
}
