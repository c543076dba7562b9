// ── Coordinator ──
//
// Full lifecycle management for one matrix: identity bootstrap, periodic
// refresh, serialized command execution and cache reconciliation.

use std::sync::Arc;
use std::time::Duration;

use hdmatrix_api::MatrixDriver;
use tokio::sync::{Mutex, Notify, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::{CoordinatorConfig, PowerRefreshPolicy};
use crate::connection::ConnectionGuard;
use crate::error::CoreError;
use crate::event::MatrixEvent;
use crate::model::{Capabilities, DeviceIdentity, MatrixState, PowerState, RoutingTable};
use crate::store::{StateCache, check_route};
use crate::stream::StateStream;

const COMMAND_CHANNEL_SIZE: usize = 16;
const EVENT_CHANNEL_SIZE: usize = 64;

// ── Lifecycle ────────────────────────────────────────────────────

/// Coordinator lifecycle, observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Constructed; bootstrap has not completed. Commands are rejected.
    Init,
    /// Background tasks running; commands accepted.
    Steady,
    /// Shut down; the connection has been released.
    Stopped,
}

// ── Coordinator ──────────────────────────────────────────────────

/// The main entry point for control surfaces.
///
/// Cheaply cloneable via `Arc<CoordinatorInner>`. Owns the state cache and
/// the only handle to the driver; every device call goes through the
/// connection guard, so refresh ticks and commands never interleave on
/// the wire.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    cache: Arc<StateCache>,
    link: ConnectionGuard,
    lifecycle: watch::Sender<Lifecycle>,
    event_tx: broadcast::Sender<MatrixEvent>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    refresh_requested: Notify,
    /// Held while fetching identity so concurrent first callers do one round trip.
    bootstrap: Mutex<()>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Create a coordinator for one matrix. Does NOT talk to the device --
    /// call [`start()`](Self::start) to bootstrap and spawn background tasks.
    pub fn new(config: CoordinatorConfig, driver: impl MatrixDriver + 'static) -> Self {
        let (lifecycle, _) = watch::channel(Lifecycle::Init);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                cache: Arc::new(StateCache::new()),
                link: ConnectionGuard::new(Box::new(driver)),
                lifecycle,
                event_tx,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                refresh_requested: Notify::new(),
                bootstrap: Mutex::new(()),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Access the underlying state cache.
    pub fn cache(&self) -> &Arc<StateCache> {
        &self.inner.cache
    }

    pub fn device_id(&self) -> String {
        self.inner.config.device_id()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Bring the coordinator from `Init` to `Steady`.
    ///
    /// Optionally wakes the matrix, fetches its identity, performs an
    /// initial refresh, then spawns the command processor and refresh
    /// loop. Device failures along the way are logged and degrade the
    /// cached state; they do not fail startup.
    pub async fn start(&self) -> Result<(), CoreError> {
        let mut handles = self.inner.task_handles.lock().await;

        let lifecycle = *self.inner.lifecycle.borrow();
        match lifecycle {
            Lifecycle::Init => {}
            Lifecycle::Steady => return Ok(()),
            Lifecycle::Stopped => return Err(CoreError::Stopped),
        }

        let config = &self.inner.config;
        info!(address = %config.address(), "starting matrix coordinator");

        if config.wake_on_start {
            self.wake().await;
        }

        let identity = self.fetch_device_info().await;
        let caps = self.inner.cache.capabilities();
        info!(
            name = %identity.name,
            model = %identity.model,
            firmware = %identity.firmware_version,
            inputs = caps.inputs,
            outputs = caps.outputs,
            "device info loaded"
        );

        if let Err(e) = self.refresh().await {
            warn!(error = %e, "initial refresh failed; state stays unknown until the next tick");
        }

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let coordinator = self.clone();
            handles.push(tokio::spawn(command_processor_task(coordinator, rx)));
        }

        let coordinator = self.clone();
        let cancel = self.inner.cancel.clone();
        handles.push(tokio::spawn(refresh_task(
            coordinator,
            config.refresh_interval(),
            cancel,
        )));

        self.inner.lifecycle.send_replace(Lifecycle::Steady);
        info!("matrix coordinator ready");
        Ok(())
    }

    /// Stop background tasks and release the device connection.
    ///
    /// Commands still queued are answered with [`CoreError::Stopped`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner.link.close().await;
        self.inner.lifecycle.send_replace(Lifecycle::Stopped);
        info!("matrix coordinator stopped");
    }

    /// Power the matrix on ahead of bootstrap so it answers identity queries.
    async fn wake(&self) {
        match self.inner.link.with_connection(|d| d.power_on()).await {
            Ok(true) => {
                debug!(delay = ?self.inner.config.settle_delay, "matrix woken; waiting for it to settle");
                tokio::time::sleep(self.inner.config.settle_delay).await;
            }
            Ok(false) => warn!("matrix did not acknowledge wake-up"),
            Err(e) => warn!(error = %e, "wake-up failed (non-fatal)"),
        }
    }

    // ── Bootstrap ────────────────────────────────────────────────

    /// Return the device identity, fetching it on first use.
    ///
    /// Performs at most one device round trip per coordinator lifetime
    /// (until [`invalidate_device_info()`](Self::invalidate_device_info)).
    /// If the device cannot be queried, an identity with `"Unknown"`
    /// fields is cached instead and capabilities fall back to the default.
    pub async fn fetch_device_info(&self) -> Arc<DeviceIdentity> {
        if let Some(identity) = self.inner.cache.identity() {
            return identity;
        }

        let _bootstrap = self.inner.bootstrap.lock().await;
        if let Some(identity) = self.inner.cache.identity() {
            return identity;
        }

        let library_version = self.inner.link.library_version().to_owned();
        let fetched = self
            .inner
            .link
            .with_connection(|d| {
                Box::pin(async move {
                    let name = d.get_device_name().await?;
                    let model = d.get_device_type().await?;
                    let version = d.get_device_version().await?;
                    Ok((name, model, version))
                })
            })
            .await;

        let identity = match fetched {
            Ok((name, model, version)) => {
                DeviceIdentity::new(name, model.trim(), version, library_version)
            }
            Err(e) => {
                warn!(error = %e, "could not read device info; using placeholders");
                DeviceIdentity::unknown(library_version)
            }
        };

        self.inner.cache.set_identity(identity)
    }

    /// Forget the cached identity so the next
    /// [`fetch_device_info()`](Self::fetch_device_info) asks the device again.
    pub fn invalidate_device_info(&self) {
        self.inner.cache.invalidate_identity();
        debug!("device info invalidated");
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Poll routing and power now and replace the cached state.
    ///
    /// On failure the cache is left untouched and
    /// [`MatrixEvent::RefreshFailed`] is broadcast.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        if *self.inner.lifecycle.borrow() == Lifecycle::Stopped {
            return Err(CoreError::Stopped);
        }

        let fetched = self
            .inner
            .link
            .with_connection(|d| {
                Box::pin(async move {
                    let routes = d.get_video_status_parsed().await?;
                    let powered = d.is_powered_on().await?;
                    Ok((routes, powered))
                })
            })
            .await;

        match fetched {
            Ok((routes, powered)) => {
                let state = self
                    .inner
                    .cache
                    .apply_refresh(PowerState::from(powered), &routes);
                debug!(power = %state.power, routes = state.routing.len(), "refresh complete");
                let _ = self.inner.event_tx.send(MatrixEvent::Refreshed(state));
                Ok(())
            }
            Err(e) => {
                let reason = e.to_string();
                let _ = self.inner.event_tx.send(MatrixEvent::RefreshFailed {
                    reason: reason.clone(),
                });
                Err(CoreError::RefreshFailed { reason })
            }
        }
    }

    /// Ask the refresh loop for an out-of-band refresh.
    ///
    /// Returns immediately. Requests made while one is already pending
    /// collapse into a single refresh.
    pub fn request_refresh(&self) {
        self.inner.refresh_requested.notify_one();
    }

    // ── Commands ─────────────────────────────────────────────────

    /// Execute a command against the matrix.
    ///
    /// Sends the command through the internal channel to the command
    /// processor task and awaits the result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        let lifecycle = *self.inner.lifecycle.borrow();
        match lifecycle {
            Lifecycle::Steady => {}
            Lifecycle::Init => return Err(CoreError::NotReady),
            Lifecycle::Stopped => return Err(CoreError::Stopped),
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::Stopped)?;

        rx.await.map_err(|_| CoreError::Stopped)?
    }

    /// Power the matrix on. Failures are logged and reported as `false`.
    pub async fn power_on(&self) -> bool {
        self.execute_logged(Command::PowerOn).await
    }

    /// Put the matrix into standby. Failures are logged and reported as `false`.
    pub async fn power_off(&self) -> bool {
        self.execute_logged(Command::PowerOff).await
    }

    /// Route `input` to `output` (both 1-based). Out-of-range values are
    /// rejected before any device call. On success the routing table
    /// reflects the change immediately.
    pub async fn route_input_to_output(&self, input: u8, output: u8) -> bool {
        self.execute_logged(Command::RouteInput { input, output })
            .await
    }

    async fn execute_logged(&self, cmd: Command) -> bool {
        match self.execute(cmd).await {
            Ok(_) => true,
            Err(e) => {
                error!(command = cmd.name(), error = %e, "matrix command failed");
                false
            }
        }
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to lifecycle changes.
    pub fn lifecycle(&self) -> watch::Receiver<Lifecycle> {
        self.inner.lifecycle.subscribe()
    }

    /// Subscribe to refresh and command events.
    pub fn events(&self) -> broadcast::Receiver<MatrixEvent> {
        self.inner.event_tx.subscribe()
    }

    /// Subscribe to power/routing snapshots.
    pub fn subscribe(&self) -> StateStream {
        self.inner.cache.subscribe()
    }

    // ── Snapshot accessors (delegate to StateCache) ──────────────

    pub fn device_info(&self) -> Option<Arc<DeviceIdentity>> {
        self.inner.cache.identity()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.inner.cache.capabilities()
    }

    pub fn power_state(&self) -> PowerState {
        self.inner.cache.power_state()
    }

    pub fn routing_table(&self) -> RoutingTable {
        self.inner.cache.routing_table()
    }

    pub fn snapshot(&self) -> Arc<MatrixState> {
        self.inner.cache.snapshot()
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Refresh on a fixed interval and whenever a refresh is requested.
///
/// Runs in a single task, so ticks never overlap; ticks missed while a
/// refresh is in flight are skipped rather than queued.
async fn refresh_task(
    coordinator: Coordinator,
    period: Option<Duration>,
    cancel: CancellationToken,
) {
    let mut interval = period.map(|period| {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval
    });

    loop {
        let tick = async {
            match interval.as_mut() {
                Some(interval) => {
                    interval.tick().await;
                }
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = coordinator.inner.refresh_requested.notified() => {
                debug!("out-of-band refresh requested");
            }
            () = tick => {}
        }

        if let Err(e) = coordinator.refresh().await {
            warn!(error = %e, "periodic refresh failed");
        }
    }
}

/// Process commands from the mpsc channel one at a time.
async fn command_processor_task(coordinator: Coordinator, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = coordinator.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&coordinator, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(coordinator: &Coordinator, cmd: Command) -> Result<CommandResult, CoreError> {
    match cmd {
        Command::PowerOn => set_power(coordinator, true).await,
        Command::PowerOff => set_power(coordinator, false).await,
        Command::RouteInput { input, output } => route(coordinator, input, output).await,
    }
}

async fn set_power(coordinator: &Coordinator, on: bool) -> Result<CommandResult, CoreError> {
    let inner = &coordinator.inner;
    let accepted = inner
        .link
        .with_connection(move |d| if on { d.power_on() } else { d.power_off() })
        .await?;
    debug!(on, accepted, "power command sent");
    let _ = inner.event_tx.send(MatrixEvent::PowerCommand { on, accepted });

    if !accepted {
        let cmd = if on { Command::PowerOn } else { Command::PowerOff };
        return Err(CoreError::rejected(cmd.name()));
    }

    if inner.config.power_refresh == PowerRefreshPolicy::Immediate {
        coordinator.request_refresh();
    }
    Ok(CommandResult::Ok)
}

async fn route(coordinator: &Coordinator, input: u8, output: u8) -> Result<CommandResult, CoreError> {
    let inner = &coordinator.inner;
    check_route(inner.cache.capabilities(), output, input)?;

    let routed = inner
        .link
        .with_connection(move |d| {
            Box::pin(async move {
                let enabled = d.output_on(output).await?;
                debug!(output, enabled, "output enable sent");
                d.route_input_to_output(input, output).await
            })
        })
        .await?;

    if !routed {
        return Err(CoreError::rejected("route"));
    }

    inner.cache.set_route(output, input)?;
    debug!(input, output, "route applied");
    let _ = inner
        .event_tx
        .send(MatrixEvent::RouteApplied { input, output });
    Ok(CommandResult::Routed { input, output })
}
