// ── Domain model ──

pub mod capabilities;
pub mod identity;
pub mod state;

pub use capabilities::{Capabilities, SUPPORTED_MODELS, is_supported_device_name, lookup_model};
pub use identity::{DeviceIdentity, MANUFACTURER, UNKNOWN};
pub use state::{MatrixState, PowerState, RoutingTable};

/// Stable identifier for the device at `host`, used to derive control
/// surface ids.
pub fn device_id(host: &str) -> String {
    format!("avgear_matrix_{}", host.replace('.', "_"))
}
