//! Configuration types for opsdeck
//!
//! Defines `Settings` (the `config.toml` model) and its sections.

use std::time::Duration;

use opsdeck_core::prelude::*;
use opsdeck_core::{DeviceConfig, DeviceId, DeviceStore};
use serde::{Deserialize, Serialize};
use url::Url;

/// Smallest accepted telemetry poll period.
pub const MIN_POLL_INTERVAL_MS: u64 = 1000;

/// Application settings (`config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub monitor: MonitorSettings,

    #[serde(default)]
    pub devices: DeviceDefaults,
}

/// Where the backend lives
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackendSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

impl BackendSettings {
    /// Parse and validate `base_url`. Only http and https are accepted.
    pub fn url(&self) -> Result<Url> {
        let url = Url::parse(self.base_url.trim()).map_err(|e| {
            Error::config_invalid(format!("backend.base_url '{}': {}", self.base_url, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(Error::config_invalid(format!(
                "backend.base_url must use http or https, got '{}'",
                other
            ))),
        }
    }
}

/// Telemetry polling behavior
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MonitorSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_true")]
    pub auto_refresh: bool,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            auto_refresh: true,
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl MonitorSettings {
    /// Poll period, clamped to [`MIN_POLL_INTERVAL_MS`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

/// Starting values for the two device forms
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct DeviceDefaults {
    #[serde(default)]
    pub device1: DeviceConfig,

    #[serde(default)]
    pub device2: DeviceConfig,
}

impl DeviceDefaults {
    pub fn get(&self, id: DeviceId) -> &DeviceConfig {
        match id {
            DeviceId::Device1 => &self.device1,
            DeviceId::Device2 => &self.device2,
        }
    }

    pub fn get_mut(&mut self, id: DeviceId) -> &mut DeviceConfig {
        match id {
            DeviceId::Device1 => &mut self.device1,
            DeviceId::Device2 => &mut self.device2,
        }
    }

    pub fn to_store(&self) -> DeviceStore {
        DeviceStore::new(self.device1.clone(), self.device2.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.backend.base_url, "http://localhost:5000");
        assert_eq!(settings.monitor.poll_interval_ms, 5000);
        assert!(settings.monitor.auto_refresh);
        assert_eq!(settings.devices.device1, DeviceConfig::default());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[monitor]
auto_refresh = false

[devices.device2]
host = "10.42.0.7"
username = "ops"
"#,
        )
        .unwrap();

        assert!(!settings.monitor.auto_refresh);
        assert_eq!(settings.monitor.poll_interval_ms, 5000);
        assert_eq!(settings.devices.device2.host, "10.42.0.7");
        assert_eq!(settings.devices.device2.directory, "");
        assert_eq!(settings.backend.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_poll_interval_is_clamped() {
        let monitor = MonitorSettings {
            poll_interval_ms: 10,
            auto_refresh: true,
        };
        assert_eq!(monitor.poll_interval(), Duration::from_millis(1000));

        let monitor = MonitorSettings {
            poll_interval_ms: 7500,
            auto_refresh: true,
        };
        assert_eq!(monitor.poll_interval(), Duration::from_millis(7500));
    }

    #[test]
    fn test_backend_url_validation() {
        let ok = BackendSettings {
            base_url: "https://ops.example.com/backend".into(),
        };
        assert_eq!(ok.url().unwrap().host_str(), Some("ops.example.com"));

        let bad = BackendSettings {
            base_url: "not a url".into(),
        };
        assert!(bad.url().unwrap_err().is_fatal());

        let wrong_scheme = BackendSettings {
            base_url: "ftp://example.com".into(),
        };
        assert!(wrong_scheme.url().is_err());
    }

    #[test]
    fn test_device_defaults_to_store() {
        let defaults = DeviceDefaults {
            device1: DeviceConfig::new("a", "b", "c", "d"),
            device2: DeviceConfig::default(),
        };
        let store = defaults.to_store();
        assert_eq!(store.get(DeviceId::Device1).host, "c");
    }
}
