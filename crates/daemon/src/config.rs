// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.
//!
//! A flat sectioned key/value file, default `/etc/gpu-controller.conf`:
//!
//! ```text
//! [controller]
//! tail_threshold_ms = 100.0
//! persistence_windows = 3
//!
//! [placement]
//! numa_weight = 2.0
//! ```
//!
//! A missing file means all defaults; a value that does not parse or sits
//! outside its constraint is a fatal startup error.

use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/gpu-controller.conf";

/// Configuration errors. All fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{key} {constraint}, got {value}")]
    OutOfRange {
        key: &'static str,
        constraint: &'static str,
        value: String,
    },
}

/// Daemon log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Parsed daemon configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    // [controller]
    pub tail_threshold_ms: f64,
    pub persistence_windows: u32,
    pub cooldown_observations: u32,
    pub poll_interval_sec: f64,
    pub log_level: LogLevel,

    // [placement]
    pub numa_weight: f64,
    pub pcie_weight: f64,
    pub enable_mig_reconfiguration: bool,
    pub max_cgroup_io_limit_mbps: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tail_threshold_ms: 100.0,
            persistence_windows: 3,
            cooldown_observations: 10,
            poll_interval_sec: 30.0,
            log_level: LogLevel::Info,
            numa_weight: 2.0,
            pcie_weight: 1.5,
            enable_mig_reconfiguration: true,
            max_cgroup_io_limit_mbps: 1000,
        }
    }
}

impl DaemonConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(ConfigError::Unreadable {
                    path: path.display().to_string(),
                    source: err,
                });
            }
        };

        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse file content without validation.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut section = String::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_ascii_lowercase();
                continue;
            }

            let Some((key, value)) = split_key_value(line) else {
                debug!(line, "ignoring unrecognised config line");
                continue;
            };

            config.apply(&section, &key, &value)?;
        }

        Ok(config)
    }

    fn apply(&mut self, section: &str, key: &str, value: &str) -> Result<(), ConfigError> {
        match (section, key) {
            ("controller", "tail_threshold_ms") => {
                self.tail_threshold_ms = parse_num(key_name(section, key), value)?;
            }
            ("controller", "persistence_windows") => {
                self.persistence_windows = parse_num(key_name(section, key), value)?;
            }
            ("controller", "cooldown_observations") => {
                self.cooldown_observations = parse_num(key_name(section, key), value)?;
            }
            ("controller", "poll_interval_sec") => {
                self.poll_interval_sec = parse_num(key_name(section, key), value)?;
            }
            ("controller", "log_level") => {
                self.log_level =
                    LogLevel::parse(value).ok_or_else(|| ConfigError::InvalidValue {
                        key: "controller.log_level",
                        value: value.to_string(),
                    })?;
            }
            ("placement", "numa_weight") => {
                self.numa_weight = parse_num(key_name(section, key), value)?;
            }
            ("placement", "pcie_weight") => {
                self.pcie_weight = parse_num(key_name(section, key), value)?;
            }
            ("placement", "enable_mig_reconfiguration") => {
                self.enable_mig_reconfiguration =
                    parse_bool(value).ok_or_else(|| ConfigError::InvalidValue {
                        key: "placement.enable_mig_reconfiguration",
                        value: value.to_string(),
                    })?;
            }
            ("placement", "max_cgroup_io_limit_mbps") => {
                self.max_cgroup_io_limit_mbps = parse_num(key_name(section, key), value)?;
            }
            _ => {
                debug!(section, key, "ignoring unknown config key");
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let out_of_range = |key, constraint, value: String| {
            Err(ConfigError::OutOfRange {
                key,
                constraint,
                value,
            })
        };

        if self.tail_threshold_ms <= 0.0 {
            return out_of_range(
                "controller.tail_threshold_ms",
                "must be positive",
                self.tail_threshold_ms.to_string(),
            );
        }
        if self.persistence_windows < 1 {
            return out_of_range(
                "controller.persistence_windows",
                "must be >= 1",
                self.persistence_windows.to_string(),
            );
        }
        if self.cooldown_observations < 1 {
            return out_of_range(
                "controller.cooldown_observations",
                "must be >= 1",
                self.cooldown_observations.to_string(),
            );
        }
        if self.poll_interval_sec <= 0.0 {
            return out_of_range(
                "controller.poll_interval_sec",
                "must be positive",
                self.poll_interval_sec.to_string(),
            );
        }
        if self.numa_weight < 0.0 {
            return out_of_range(
                "placement.numa_weight",
                "must be non-negative",
                self.numa_weight.to_string(),
            );
        }
        if self.pcie_weight < 0.0 {
            return out_of_range(
                "placement.pcie_weight",
                "must be non-negative",
                self.pcie_weight.to_string(),
            );
        }
        if self.max_cgroup_io_limit_mbps == 0 {
            return out_of_range(
                "placement.max_cgroup_io_limit_mbps",
                "must be positive",
                self.max_cgroup_io_limit_mbps.to_string(),
            );
        }
        Ok(())
    }
}

/// `key = value` or `key: value`.
fn split_key_value(line: &str) -> Option<(String, String)> {
    let (key, value) = line
        .split_once('=')
        .or_else(|| line.split_once(':'))?;
    let key = key.trim().to_ascii_lowercase();
    let value = value.trim().to_string();
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

fn key_name(section: &str, key: &str) -> &'static str {
    match (section, key) {
        ("controller", "tail_threshold_ms") => "controller.tail_threshold_ms",
        ("controller", "persistence_windows") => "controller.persistence_windows",
        ("controller", "cooldown_observations") => "controller.cooldown_observations",
        ("controller", "poll_interval_sec") => "controller.poll_interval_sec",
        ("placement", "numa_weight") => "placement.numa_weight",
        ("placement", "pcie_weight") => "placement.pcie_weight",
        ("placement", "max_cgroup_io_limit_mbps") => "placement.max_cgroup_io_limit_mbps",
        _ => "unknown",
    }
}

fn parse_num<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

/// Boolean forms accepted by the flat config format.
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
