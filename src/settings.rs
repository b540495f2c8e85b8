//! Deployment settings for the notification subsystem.
//!
//! Values come from environment variables with sane defaults, or from an
//! optional JSON settings file under the user config directory. Malformed
//! values never abort startup: they fall back to the default with a logged
//! warning.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Base URL of the web app used to build canonical links.
pub const ENV_WEBAPP_URL: &str = "SYNC_NOTIFIER_WEBAPP_URL";
/// Timeout in seconds for webhook deliveries.
pub const ENV_WEBHOOK_TIMEOUT_SECS: &str = "SYNC_NOTIFIER_WEBHOOK_TIMEOUT_SECS";

pub const DEFAULT_WEBAPP_URL: &str = "http://localhost:8000";
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 30;

/// Deployment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Web app base URL, used by `WebUrlHelper`
    pub webapp_url: String,
    /// Timeout for a single webhook POST
    pub webhook_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            webapp_url: DEFAULT_WEBAPP_URL.to_string(),
            webhook_timeout_secs: DEFAULT_WEBHOOK_TIMEOUT_SECS,
        }
    }
}

impl Settings {
    /// Load settings from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let webapp_url = env::var(ENV_WEBAPP_URL)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_WEBAPP_URL.to_string());
        let webhook_timeout_secs = parse_u64(
            ENV_WEBHOOK_TIMEOUT_SECS,
            env::var(ENV_WEBHOOK_TIMEOUT_SECS).ok(),
            DEFAULT_WEBHOOK_TIMEOUT_SECS,
        );

        Self {
            webapp_url,
            webhook_timeout_secs,
        }
    }

    /// Load settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Detect settings: a config file under the home directory wins over the
    /// environment.
    pub fn detect() -> Self {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".config/sync-notifier/settings.json");
            if config_path.exists() {
                match Self::from_file(&config_path) {
                    Ok(settings) => return settings,
                    Err(e) => {
                        warn!(path = %config_path.display(), error = %e, "Ignoring unreadable settings file");
                    }
                }
            }
        }
        Self::from_env()
    }
}

/// Parse an integer setting, keeping the default on malformed input.
fn parse_u64(name: &str, raw: Option<String>, default: u64) -> u64 {
    match raw {
        Some(value) => match value.trim().parse::<u64>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(setting = name, value = %value, "Malformed integer setting, using default");
                default
            }
        },
        None => default,
    }
}
