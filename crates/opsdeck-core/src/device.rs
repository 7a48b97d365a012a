//! Device targets and their connection configuration.
//!
//! The console addresses exactly two named targets. Each has a mutable
//! [`DeviceConfig`] edited by the operator; requests never borrow it but take
//! an owned snapshot at dispatch time, so edits made while a request is in
//! flight cannot leak into that request.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the two named remote endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceId {
    #[default]
    Device1,
    Device2,
}

impl DeviceId {
    pub const ALL: [DeviceId; 2] = [DeviceId::Device1, DeviceId::Device2];

    /// Wire name (`device1` / `device2`).
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceId::Device1 => "device1",
            DeviceId::Device2 => "device2",
        }
    }

    /// The other target.
    pub fn other(&self) -> DeviceId {
        match self {
            DeviceId::Device1 => DeviceId::Device2,
            DeviceId::Device2 => DeviceId::Device1,
        }
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "device1" | "d1" | "1" => Ok(DeviceId::Device1),
            "device2" | "d2" | "2" => Ok(DeviceId::Device2),
            other => Err(format!("unknown device '{}'", other)),
        }
    }
}

/// Connection settings for one device target.
///
/// Field names match the backend wire contract: `username` is the identity,
/// `password` the credential, `host` the address and `directory` the working
/// directory.
#[derive(Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub directory: String,
}

impl DeviceConfig {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
        directory: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            host: host.into(),
            directory: directory.into(),
        }
    }

    /// Set a single field by name.
    pub fn set(&mut self, field: DeviceField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DeviceField::Username => self.username = value,
            DeviceField::Password => self.password = value,
            DeviceField::Host => self.host = value,
            DeviceField::Directory => self.directory = value,
        }
    }

    pub fn get(&self, field: DeviceField) -> &str {
        match field {
            DeviceField::Username => &self.username,
            DeviceField::Password => &self.password,
            DeviceField::Host => &self.host,
            DeviceField::Directory => &self.directory,
        }
    }
}

// Credentials must never reach log files.
impl fmt::Debug for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("directory", &self.directory)
            .finish()
    }
}

/// Editable fields of a [`DeviceConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceField {
    Username,
    Password,
    Host,
    Directory,
}

impl FromStr for DeviceField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "username" | "user" => Ok(DeviceField::Username),
            "password" | "pass" => Ok(DeviceField::Password),
            "host" => Ok(DeviceField::Host),
            "directory" | "dir" => Ok(DeviceField::Directory),
            other => Err(format!("unknown device field '{}'", other)),
        }
    }
}

/// Immutable copy of both device configs, taken at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DevicePair {
    pub device1: DeviceConfig,
    pub device2: DeviceConfig,
}

impl DevicePair {
    pub fn get(&self, id: DeviceId) -> &DeviceConfig {
        match id {
            DeviceId::Device1 => &self.device1,
            DeviceId::Device2 => &self.device2,
        }
    }
}

/// Holder for the two live device configs.
///
/// Pure data: the orchestration layer mutates it on operator edits and reads
/// snapshots from it when dispatching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceStore {
    device1: DeviceConfig,
    device2: DeviceConfig,
}

impl DeviceStore {
    pub fn new(device1: DeviceConfig, device2: DeviceConfig) -> Self {
        Self { device1, device2 }
    }

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

    pub fn set_field(&mut self, id: DeviceId, field: DeviceField, value: impl Into<String>) {
        self.get_mut(id).set(field, value);
    }

    /// Owned copy of one config.
    pub fn snapshot(&self, id: DeviceId) -> DeviceConfig {
        self.get(id).clone()
    }

    /// Owned copy of both configs.
    pub fn snapshot_pair(&self) -> DevicePair {
        DevicePair {
            device1: self.device1.clone(),
            device2: self.device2.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DeviceStore {
        DeviceStore::new(
            DeviceConfig::new("alice", "s3cret", "10.0.0.5", "/home/alice"),
            DeviceConfig::new("bob", "hunter2", "10.0.0.6", ""),
        )
    }

    #[test]
    fn test_snapshot_is_immune_to_later_edits() {
        let mut store = store();
        let pair = store.snapshot_pair();

        store.set_field(DeviceId::Device1, DeviceField::Host, "192.168.1.1");
        store.set_field(DeviceId::Device2, DeviceField::Directory, "/tmp");

        assert_eq!(pair.device1.host, "10.0.0.5");
        assert_eq!(pair.device2.directory, "");
        assert_eq!(store.get(DeviceId::Device1).host, "192.168.1.1");
    }

    #[test]
    fn test_set_field_touches_only_target_device() {
        let mut store = store();
        store.set_field(DeviceId::Device2, DeviceField::Username, "carol");

        assert_eq!(store.get(DeviceId::Device2).username, "carol");
        assert_eq!(store.get(DeviceId::Device1).username, "alice");
    }

    #[test]
    fn test_debug_redacts_password() {
        let cfg = DeviceConfig::new("alice", "s3cret", "10.0.0.5", "/");
        let dbg = format!("{:?}", cfg);
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn test_serializes_with_wire_field_names() {
        let cfg = DeviceConfig::new("u", "p", "h", "d");
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"username": "u", "password": "p", "host": "h", "directory": "d"})
        );
    }

    #[test]
    fn test_device_id_parsing_and_wire_name() {
        assert_eq!("device2".parse::<DeviceId>().unwrap(), DeviceId::Device2);
        assert_eq!("D1".parse::<DeviceId>().unwrap(), DeviceId::Device1);
        assert!("device3".parse::<DeviceId>().is_err());
        assert_eq!(
            serde_json::to_string(&DeviceId::Device1).unwrap(),
            "\"device1\""
        );
        assert_eq!(DeviceId::Device1.other(), DeviceId::Device2);
    }

    #[test]
    fn test_device_field_parsing() {
        assert_eq!("dir".parse::<DeviceField>().unwrap(), DeviceField::Directory);
        assert_eq!("Host".parse::<DeviceField>().unwrap(), DeviceField::Host);
        assert!("port".parse::<DeviceField>().is_err());
    }
}
