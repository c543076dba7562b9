// ── State cache ──
//
// Wait-free snapshot storage with push-based change notification.

mod refresh;
mod state_cache;

pub(crate) use state_cache::check_route;
pub use state_cache::StateCache;
