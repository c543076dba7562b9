// ── Refresh application logic ──
//
// Applies a device-reported snapshot to the cache. The device is the
// authority: the routing table is replaced, never merged, so optimistic
// entries the device no longer reports disappear.

use std::sync::Arc;

use chrono::Utc;
use hdmatrix_api::VideoStatus;

use super::StateCache;
use super::state_cache::sanitize;
use crate::model::{MatrixState, PowerState};

impl StateCache {
    /// Atomically replace power and routing with what the device reported.
    pub(crate) fn apply_refresh(&self, power: PowerState, routes: &VideoStatus) -> Arc<MatrixState> {
        let next = Arc::new(MatrixState {
            power,
            routing: sanitize(self.capabilities(), routes),
            refreshed_at: Some(Utc::now()),
        });
        self.state.send_replace(Arc::clone(&next));
        next
    }
}
