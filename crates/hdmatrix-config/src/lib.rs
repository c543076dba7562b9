//! Shared configuration for HDMI matrix coordinators.
//!
//! TOML device profiles, environment overrides and translation to
//! `hdmatrix_core::CoordinatorConfig`. The core crate never reads files;
//! hosts load a [`Config`] here and hand the resulting settings in.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use hdmatrix_core::{CoordinatorConfig, DEFAULT_PORT, DEFAULT_REFRESH_INTERVAL_SECS, PowerRefreshPolicy};

/// Prefix for environment overrides. Nested keys are separated by `__`,
/// e.g. `HDMATRIX_DEFAULTS__REFRESH_INTERVAL_SECS=10`.
pub const ENV_PREFIX: &str = "HDMATRIX_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no device named '{name}' in config")]
    UnknownDevice { name: String },

    #[error("no device selected and no default_device configured")]
    NoDefaultDevice,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Device used when a host does not name one.
    pub default_device: Option<String>,

    /// Settings applied to every device unless its profile overrides them.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named matrices.
    #[serde(default)]
    pub devices: HashMap<String, DeviceProfile>,
}

#[derive(Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    /// Seconds between scheduled refreshes. 0 disables polling.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    #[serde(default)]
    pub power_refresh: PowerRefreshPolicy,

    #[serde(default = "default_wake_on_start")]
    pub wake_on_start: bool,

    /// Pause after the wake-up command before the device is queried.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval(),
            power_refresh: PowerRefreshPolicy::default(),
            wake_on_start: default_wake_on_start(),
            settle_delay_secs: default_settle_delay(),
        }
    }
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}
fn default_wake_on_start() -> bool {
    true
}
fn default_settle_delay() -> u64 {
    2
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

/// A named matrix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceProfile {
    /// Host name or IP address (e.g., "192.168.1.50").
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Override the polling interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval_secs: Option<u64>,

    /// Override the power refresh policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_refresh: Option<PowerRefreshPolicy>,

    /// Override whether the matrix is powered on at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_on_start: Option<bool>,
}

impl DeviceProfile {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            refresh_interval_secs: None,
            power_refresh: None,
            wake_on_start: None,
        }
    }
}

impl Config {
    /// Pick a device profile by name, falling back to `default_device`.
    pub fn device(&self, name: Option<&str>) -> Result<(&str, &DeviceProfile), ConfigError> {
        let name = name
            .or(self.default_device.as_deref())
            .ok_or(ConfigError::NoDefaultDevice)?;

        self.devices
            .get_key_value(name)
            .map(|(name, profile)| (name.as_str(), profile))
            .ok_or_else(|| ConfigError::UnknownDevice { name: name.into() })
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "hdmatrix", "hdmatrix").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hdmatrix");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment. A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `CoordinatorConfig` from a profile, filling gaps from `defaults`.
pub fn profile_to_coordinator_config(
    profile: &DeviceProfile,
    defaults: &Defaults,
) -> Result<CoordinatorConfig, ConfigError> {
    let host = profile.host.trim();
    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: "must not be empty".into(),
        });
    }
    if host.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("'{host}' contains whitespace"),
        });
    }
    if profile.port == 0 {
        return Err(ConfigError::Validation {
            field: "port".into(),
            reason: "must be between 1 and 65535".into(),
        });
    }

    Ok(CoordinatorConfig {
        host: host.to_owned(),
        port: profile.port,
        refresh_interval_secs: profile
            .refresh_interval_secs
            .unwrap_or(defaults.refresh_interval_secs),
        power_refresh: profile.power_refresh.unwrap_or(defaults.power_refresh),
        wake_on_start: profile.wake_on_start.unwrap_or(defaults.wake_on_start),
        settle_delay: Duration::from_secs(defaults.settle_delay_secs),
    })
}

/// Resolve a named (or the default) device straight to a `CoordinatorConfig`.
pub fn device_config(cfg: &Config, name: Option<&str>) -> Result<CoordinatorConfig, ConfigError> {
    let (_, profile) = cfg.device(name)?;
    profile_to_coordinator_config(profile, &cfg.defaults)
}
