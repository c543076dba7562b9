// ── Runtime coordinator configuration ──
//
// Describes which matrix to talk to and how often to poll it.
// Never touches disk: `hdmatrix-config` builds a `CoordinatorConfig`
// and hands it in.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::device_id;

/// TCP port the matrix control protocol listens on.
pub const DEFAULT_PORT: u16 = 4001;

/// Seconds between scheduled refresh ticks.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 30;

/// What happens to cached power state after a successful power command.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PowerRefreshPolicy {
    /// Request an out-of-band refresh right away.
    #[default]
    Immediate,
    /// Leave it to the next scheduled tick.
    NextTick,
}

/// Configuration for a single matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Host name or IP address of the matrix.
    pub host: String,
    pub port: u16,
    /// How often to poll the device (seconds). 0 = never.
    pub refresh_interval_secs: u64,
    pub power_refresh: PowerRefreshPolicy,
    /// Power the matrix on during `start()`, before reading its identity.
    pub wake_on_start: bool,
    /// Pause after the wake-up command so the device can finish booting.
    pub settle_delay: Duration,
}

impl CoordinatorConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// `host:port`, as used in log lines and connection errors.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Stable identifier derived from the host.
    pub fn device_id(&self) -> String {
        device_id(&self.host)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_secs > 0).then(|| Duration::from_secs(self.refresh_interval_secs))
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: DEFAULT_PORT,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            power_refresh: PowerRefreshPolicy::default(),
            wake_on_start: true,
            settle_delay: Duration::from_secs(2),
        }
    }
}
