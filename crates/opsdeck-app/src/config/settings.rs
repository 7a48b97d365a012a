//! Settings loading and the default config file

use std::path::{Path, PathBuf};

use opsdeck_core::prelude::*;

use super::types::Settings;

pub const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable that replaces `backend.base_url`.
pub const BACKEND_URL_ENV_VAR: &str = "OPSDECK_BACKEND_URL";

/// `<config_dir>/opsdeck/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("opsdeck").join(CONFIG_FILENAME))
}

/// Load settings from `path` (or the default location), then apply
/// environment overrides.
///
/// A missing or unreadable file falls back to defaults; it never fails.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let mut settings = match path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(config_path) => read_settings_file(&config_path),
        None => {
            debug!("No config directory available, using defaults");
            Settings::default()
        }
    };
    apply_env_overrides(&mut settings);
    settings
}

fn read_settings_file(config_path: &Path) -> Settings {
    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Apply `OPSDECK_BACKEND_URL` if set and non-empty.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(url) = std::env::var(BACKEND_URL_ENV_VAR) {
        let url = url.trim();
        if !url.is_empty() {
            debug!("Backend URL overridden by {}", BACKEND_URL_ENV_VAR);
            settings.backend.base_url = url.to_string();
        }
    }
}

/// Write a commented default config to `path` unless a file already exists.
///
/// Returns `true` if a file was created.
pub fn init_config_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;
    }

    std::fs::write(path, generate_default_config())
        .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
    info!("Created default config at {:?}", path);
    Ok(true)
}

fn generate_default_config() -> &'static str {
    r#"# opsdeck configuration

[backend]
base_url = "http://localhost:5000"   # OPSDECK_BACKEND_URL overrides this

[monitor]
poll_interval_ms = 5000   # Telemetry refresh period (minimum 1000)
auto_refresh = true       # Poll periodically while the monitor view is open

# Initial values for the device forms. Leave the password empty to type it
# in at runtime.
[devices.device1]
username = ""
password = ""
host = ""
directory = ""

[devices.device2]
username = ""
password = ""
host = ""
directory = ""
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_load_settings_defaults() {
        std::env::remove_var(BACKEND_URL_ENV_VAR);
        let dir = tempdir().unwrap();
        let settings = load_settings(Some(&dir.path().join("missing.toml")));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    #[serial]
    fn test_load_settings_custom() {
        std::env::remove_var(BACKEND_URL_ENV_VAR);
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            r#"
[backend]
base_url = "http://10.42.0.1:5000"

[monitor]
poll_interval_ms = 2000
"#,
        )
        .unwrap();

        let settings = load_settings(Some(&path));
        assert_eq!(settings.backend.base_url, "http://10.42.0.1:5000");
        assert_eq!(settings.monitor.poll_interval_ms, 2000);
        assert!(settings.monitor.auto_refresh);
    }

    #[test]
    #[serial]
    fn test_load_settings_invalid_toml() {
        std::env::remove_var(BACKEND_URL_ENV_VAR);
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[monitor\nthis is not toml").unwrap();

        assert_eq!(load_settings(Some(&path)), Settings::default());
    }

    #[test]
    #[serial]
    fn test_env_override_replaces_base_url() {
        let dir = tempdir().unwrap();
        std::env::set_var(BACKEND_URL_ENV_VAR, "https://backend.internal");
        let settings = load_settings(Some(&dir.path().join("missing.toml")));
        std::env::remove_var(BACKEND_URL_ENV_VAR);

        assert_eq!(settings.backend.base_url, "https://backend.internal");
    }

    #[test]
    #[serial]
    fn test_blank_env_override_is_ignored() {
        let dir = tempdir().unwrap();
        std::env::set_var(BACKEND_URL_ENV_VAR, "   ");
        let settings = load_settings(Some(&dir.path().join("missing.toml")));
        std::env::remove_var(BACKEND_URL_ENV_VAR);

        assert_eq!(settings.backend.base_url, "http://localhost:5000");
    }

    #[test]
    #[serial]
    fn test_init_config_file_writes_parsable_defaults() {
        std::env::remove_var(BACKEND_URL_ENV_VAR);
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);

        assert!(init_config_file(&path).unwrap());
        assert_eq!(load_settings(Some(&path)), Settings::default());
    }

    #[test]
    fn test_init_config_file_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[monitor]\nauto_refresh = false\n").unwrap();

        assert!(!init_config_file(&path).unwrap());
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("auto_refresh = false"));
    }
}
