// hdmatrix-core: Polling, caching and command serialization between a
// matrix driver and the control surfaces that present it.

pub mod command;
pub mod config;
pub mod connection;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod model;
pub mod setup;
pub mod store;
pub mod stream;
pub mod surface;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{CoordinatorConfig, DEFAULT_PORT, DEFAULT_REFRESH_INTERVAL_SECS, PowerRefreshPolicy};
pub use coordinator::{Coordinator, Lifecycle};
pub use error::CoreError;
pub use event::MatrixEvent;
pub use setup::validate_connection;
pub use store::StateCache;
pub use stream::{StateStream, StateWatchStream};
pub use surface::{OutputSelector, PowerAction, PowerButton, PowerSwitch, Surfaces};

pub use model::{
    Capabilities, DeviceIdentity, MANUFACTURER, MatrixState, PowerState, RoutingTable,
    SUPPORTED_MODELS, UNKNOWN, device_id, is_supported_device_name, lookup_model,
};

// Driver seam, so consumers only need this crate.
pub use hdmatrix_api::{MatrixDriver, VideoStatus};
