// Shared fixtures for hdmatrix-core integration tests: a scriptable
// in-memory matrix and a probe that records how it was driven.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use hdmatrix_api::{Error, MatrixDriver, VideoStatus};
use hdmatrix_core::{Coordinator, CoordinatorConfig};

pub const HOST: &str = "192.168.1.50";
pub const DEVICE_ID: &str = "avgear_matrix_192_168_1_50";

// ── Device model ────────────────────────────────────────────────────

pub struct Device {
    pub name: String,
    pub model: String,
    pub version: String,
    pub powered: bool,
    pub routes: VideoStatus,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            name: "TMX44PRO-Lobby".into(),
            model: "TMX44PRO AVK".into(),
            version: "2.4.1".into(),
            powered: true,
            routes: [(1, 1), (2, 2), (3, 3), (4, 4)].into_iter().collect(),
        }
    }
}

/// Everything a test can observe about (or inject into) the mock driver.
#[derive(Default)]
pub struct Probe {
    pub device: Mutex<Device>,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<String>>,
    /// Every call (including `connect`) fails with a link error.
    pub unreachable: AtomicBool,
    /// Power and routing commands are answered with `false`.
    pub nack: AtomicBool,
    pub latency: Mutex<Option<Duration>>,
}

impl Probe {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn set_nack(&self, nack: bool) {
        self.nack.store(nack, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    pub fn with_device<R>(&self, f: impl FnOnce(&mut Device) -> R) -> R {
        f(&mut self.device.lock().unwrap())
    }
}

// ── Mock driver ─────────────────────────────────────────────────────

pub struct MockDriver {
    probe: Arc<Probe>,
}

impl MockDriver {
    pub fn new() -> (Self, Arc<Probe>) {
        let probe = Arc::new(Probe::default());
        (
            Self {
                probe: Arc::clone(&probe),
            },
            probe,
        )
    }

    async fn call(&self, name: &str) -> Result<(), Error> {
        self.probe.calls.lock().unwrap().push(name.to_owned());
        let latency = *self.probe.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.probe.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Disconnected);
        }
        Ok(())
    }

    fn ack(&self) -> bool {
        !self.probe.nack.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MatrixDriver for MockDriver {
    async fn connect(&mut self) -> Result<(), Error> {
        if self.probe.unreachable.load(Ordering::SeqCst) {
            return Err(Error::Connect {
                addr: format!("{HOST}:4001"),
                reason: "connection refused".into(),
            });
        }
        self.probe.connects.fetch_add(1, Ordering::SeqCst);
        let now = self.probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_in_flight.fetch_max(now, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.probe.disconnects.fetch_add(1, Ordering::SeqCst);
        self.probe.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }

    async fn power_on(&mut self) -> Result<bool, Error> {
        self.call("power_on").await?;
        let ack = self.ack();
        if ack {
            self.probe.with_device(|d| d.powered = true);
        }
        Ok(ack)
    }

    async fn power_off(&mut self) -> Result<bool, Error> {
        self.call("power_off").await?;
        let ack = self.ack();
        if ack {
            self.probe.with_device(|d| d.powered = false);
        }
        Ok(ack)
    }

    async fn is_powered_on(&mut self) -> Result<bool, Error> {
        self.call("is_powered_on").await?;
        Ok(self.probe.with_device(|d| d.powered))
    }

    async fn get_device_name(&mut self) -> Result<String, Error> {
        self.call("get_device_name").await?;
        Ok(self.probe.with_device(|d| d.name.clone()))
    }

    async fn get_device_type(&mut self) -> Result<String, Error> {
        self.call("get_device_type").await?;
        Ok(self.probe.with_device(|d| d.model.clone()))
    }

    async fn get_device_version(&mut self) -> Result<String, Error> {
        self.call("get_device_version").await?;
        Ok(self.probe.with_device(|d| d.version.clone()))
    }

    async fn get_video_status_parsed(&mut self) -> Result<VideoStatus, Error> {
        self.call("get_video_status_parsed").await?;
        Ok(self.probe.with_device(|d| d.routes.clone()))
    }

    async fn output_on(&mut self, _output: u8) -> Result<bool, Error> {
        self.call("output_on").await?;
        Ok(self.ack())
    }

    async fn route_input_to_output(&mut self, input: u8, output: u8) -> Result<bool, Error> {
        self.call("route_input_to_output").await?;
        let ack = self.ack();
        if ack {
            self.probe.with_device(|d| d.routes.insert(output, input));
        }
        Ok(ack)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Config with polling and wake-up disabled, so tests drive every refresh.
pub fn quiet_config() -> CoordinatorConfig {
    CoordinatorConfig {
        refresh_interval_secs: 0,
        wake_on_start: false,
        ..CoordinatorConfig::new(HOST)
    }
}

pub fn coordinator(config: CoordinatorConfig) -> (Coordinator, Arc<Probe>) {
    let (driver, probe) = MockDriver::new();
    (Coordinator::new(config, driver), probe)
}

/// Like [`coordinator`], but lets the test script the device before
/// anything talks to it.
pub fn coordinator_with(
    config: CoordinatorConfig,
    setup: impl FnOnce(&mut Device),
) -> (Coordinator, Arc<Probe>) {
    let (driver, probe) = MockDriver::new();
    probe.with_device(setup);
    (Coordinator::new(config, driver), probe)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
