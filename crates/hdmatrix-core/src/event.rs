// ── Coordinator events ──
//
// Broadcast to every subscriber so control surfaces can redraw without
// polling the cache.

use std::sync::Arc;

use crate::model::MatrixState;

#[derive(Debug, Clone)]
pub enum MatrixEvent {
    /// A refresh succeeded; carries the state that was just published.
    Refreshed(Arc<MatrixState>),
    /// A refresh failed; cached state was left as it was.
    RefreshFailed { reason: String },
    /// A route command succeeded and the cache was updated optimistically.
    RouteApplied { input: u8, output: u8 },
    /// A power command reached the device. `accepted` is its answer.
    PowerCommand { on: bool, accepted: bool },
}
