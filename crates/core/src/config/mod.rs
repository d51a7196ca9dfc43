use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{NodeRole, Result, WaveSyncError};

/// Port used by the synchronisation transport when none is configured.
pub const DEFAULT_PORT: u16 = 4978;

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub node: NodeConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.node.validate()?;
        Ok(config)
    }
}

/// Verbosity forwarded to the bridge and used as the default log filter.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = WaveSyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "error" => Ok(Self::Error),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(WaveSyncError::config(format!(
                "unknown log level `{other}`, expected `error`, `info` or `debug`"
            ))),
        }
    }
}

/// Construction options for a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub network_interface: String,
    pub channel: u32,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub mode: NodeRole,
    #[serde(default)]
    pub log_level: LogLevel,
    #[serde(default)]
    pub enable_clock_sync: bool,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl NodeConfig {
    /// Receiver configuration on `network_interface` with every other option
    /// at its default.
    pub fn new(network_interface: impl Into<String>, channel: u32) -> Self {
        Self {
            network_interface: network_interface.into(),
            channel,
            port: DEFAULT_PORT,
            mode: NodeRole::default(),
            log_level: LogLevel::default(),
            enable_clock_sync: false,
        }
    }

    pub fn with_mode(mut self, mode: NodeRole) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn with_clock_sync(mut self, enable: bool) -> Self {
        self.enable_clock_sync = enable;
        self
    }

    /// Options are only checked for presence, never for range.
    pub fn validate(&self) -> Result<()> {
        if self.network_interface.trim().is_empty() {
            return Err(WaveSyncError::config("network interface must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_defaults_from_json() {
        let config = AppConfig::from_json(r#"{"node": {"network_interface": "eth0", "channel": 3}}"#)
            .unwrap();

        assert_eq!(config.node, NodeConfig::new("eth0", 3));
        assert_eq!(config.node.port, 4978);
        assert_eq!(config.node.mode, NodeRole::Receiver);
        assert_eq!(config.node.log_level, LogLevel::Info);
        assert!(!config.node.enable_clock_sync);
    }

    #[test]
    fn reads_explicit_values() {
        let config = AppConfig::from_json(
            r#"{"node": {
                "network_interface": "wlan0",
                "channel": 1,
                "port": 5000,
                "mode": "controller",
                "log_level": "debug",
                "enable_clock_sync": true
            }}"#,
        )
        .unwrap();

        assert_eq!(config.node.mode, NodeRole::Controller);
        assert_eq!(config.node.log_level, LogLevel::Debug);
        assert_eq!(config.node.port, 5000);
        assert!(config.node.enable_clock_sync);
    }

    #[test]
    fn rejects_missing_interface() {
        let err = AppConfig::from_json(r#"{"node": {"network_interface": " ", "channel": 0}}"#)
            .unwrap_err();
        assert!(matches!(err, WaveSyncError::Config(_)));

        let err = AppConfig::from_json(r#"{"node": {"channel": 0}}"#).unwrap_err();
        assert!(matches!(err, WaveSyncError::Json(_)));
    }

    #[test]
    fn parses_log_levels() {
        assert_eq!("error".parse::<LogLevel>().unwrap(), LogLevel::Error);
        assert!("trace".parse::<LogLevel>().is_err());
    }
}
