// ── State cache ──
//
// In-memory snapshot of everything the coordinator knows about the matrix.
// Reads are wait-free; writes come only from the coordinator's serialized
// command/refresh path. Nothing in here performs I/O.

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{Capabilities, DeviceIdentity, MatrixState, PowerState, RoutingTable};
use crate::stream::StateStream;

/// Cached identity, capabilities, power and routing for one matrix.
pub struct StateCache {
    identity: ArcSwapOption<DeviceIdentity>,
    /// Computed from the first identity stored; never changes afterwards.
    capabilities: OnceLock<Capabilities>,
    /// Power and routing, swapped as one unit.
    pub(super) state: watch::Sender<Arc<MatrixState>>,
}

impl StateCache {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(MatrixState::default()));

        Self {
            identity: ArcSwapOption::empty(),
            capabilities: OnceLock::new(),
            state,
        }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Cached identity, or `None` before bootstrap (or after invalidation).
    pub fn identity(&self) -> Option<Arc<DeviceIdentity>> {
        self.identity.load_full()
    }

    /// Port counts. [`Capabilities::DEFAULT`] until an identity is stored.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities.get().copied().unwrap_or_default()
    }

    /// Current power + routing snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<MatrixState> {
        self.state.borrow().clone()
    }

    pub fn power_state(&self) -> PowerState {
        self.state.borrow().power
    }

    pub fn routing_table(&self) -> RoutingTable {
        self.state.borrow().routing.clone()
    }

    /// Input routed to `output`, if known.
    pub fn route(&self, output: u8) -> Option<u8> {
        self.state.borrow().routing.get(output)
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.state.borrow().refreshed_at
    }

    /// How long ago the device last confirmed the cached state.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_refresh().map(|t| Utc::now() - t)
    }

    /// Subscribe to power/routing changes.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.state.subscribe())
    }

    // ── Mutations (coordinator only) ─────────────────────────────────

    /// Store a freshly fetched identity. The first identity stored also
    /// fixes the capabilities.
    pub(crate) fn set_identity(&self, identity: DeviceIdentity) -> Arc<DeviceIdentity> {
        let caps = *self
            .capabilities
            .get_or_init(|| Capabilities::for_model(&identity.model));
        debug!(model = %identity.model, inputs = caps.inputs, outputs = caps.outputs, "identity cached");

        let identity = Arc::new(identity);
        self.identity.store(Some(Arc::clone(&identity)));
        identity
    }

    pub(crate) fn invalidate_identity(&self) {
        self.identity.store(None);
    }

    /// Optimistically record a single route.
    pub(crate) fn set_route(&self, output: u8, input: u8) -> Result<(), CoreError> {
        check_route(self.capabilities(), output, input)?;
        self.state.send_modify(|state| {
            Arc::make_mut(state).routing.insert(output, input);
        });
        debug!(output, input, "route cached");
        Ok(())
    }
}

impl Default for StateCache {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

pub(crate) fn check_route(caps: Capabilities, output: u8, input: u8) -> Result<(), CoreError> {
    if !caps.has_output(output) {
        return Err(CoreError::Validation {
            message: format!("output {output} is outside 1..={}", caps.outputs),
        });
    }
    if !caps.has_input(input) {
        return Err(CoreError::Validation {
            message: format!("input {input} is outside 1..={}", caps.inputs),
        });
    }
    Ok(())
}

/// Keep only routes that fit the matrix; anything else is logged and dropped.
pub(super) fn sanitize(caps: Capabilities, routes: &hdmatrix_api::VideoStatus) -> RoutingTable {
    routes
        .iter()
        .filter_map(|(&output, &input)| match check_route(caps, output, input) {
            Ok(()) => Some((output, input)),
            Err(e) => {
                warn!(output, input, error = %e, "dropping out-of-range route reported by device");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn identity(model: &str) -> DeviceIdentity {
        DeviceIdentity::new("Matrix", model, "1.2.3", "0.1.0")
    }

    #[test]
    fn starts_empty_and_unknown() {
        let cache = StateCache::new();
        assert!(cache.identity().is_none());
        assert_eq!(cache.capabilities(), Capabilities::DEFAULT);
        assert_eq!(cache.power_state(), PowerState::Unknown);
        assert!(cache.routing_table().is_empty());
        assert!(cache.last_refresh().is_none());
        assert!(cache.data_age().is_none());
    }

    #[test]
    fn capabilities_are_fixed_by_first_identity() {
        let cache = StateCache::new();
        cache.set_identity(identity("TMX44PRO AVK"));
        assert_eq!(cache.capabilities(), Capabilities::for_model("TMX44PRO AVK"));

        cache.invalidate_identity();
        assert!(cache.identity().is_none());
        cache.set_identity(identity("SOMETHING ELSE"));
        assert_eq!(cache.capabilities(), Capabilities::for_model("TMX44PRO AVK"));
    }

    #[test]
    fn set_route_rejects_out_of_range() {
        let cache = StateCache::new();
        assert!(matches!(
            cache.set_route(5, 1),
            Err(CoreError::Validation { .. })
        ));
        assert!(matches!(
            cache.set_route(1, 0),
            Err(CoreError::Validation { .. })
        ));
        assert!(cache.routing_table().is_empty());

        cache.set_route(2, 3).unwrap();
        assert_eq!(cache.route(2), Some(3));
    }

    #[test]
    fn snapshots_are_not_affected_by_later_writes() {
        let cache = StateCache::new();
        cache.set_route(1, 1).unwrap();
        let before = cache.snapshot();

        cache.set_route(1, 2).unwrap();
        assert_eq!(before.routing.get(1), Some(1));
        assert_eq!(cache.route(1), Some(2));
    }
}
