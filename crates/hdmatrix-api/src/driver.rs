// ── Matrix driver contract ──
//
// A driver owns exactly one physical device and at most one open link to
// it. Every call is a single round trip; the caller decides when to open
// and close the link and guarantees no two calls overlap.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Error;

/// Output number → input number, as reported by the device.
///
/// Both sides are 1-based. Outputs the device did not mention are absent.
pub type VideoStatus = BTreeMap<u8, u8>;

/// Version of this driver contract, reported as device metadata.
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Point operations against one HDMI matrix.
///
/// Implementations speak the device's wire protocol. Methods take
/// `&mut self` because the underlying protocol cannot pipeline requests on
/// one link.
#[async_trait]
pub trait MatrixDriver: Send {
    /// Open the link to the device.
    async fn connect(&mut self) -> Result<(), Error>;

    /// Close the link. Closing an already-closed link is not an error.
    async fn disconnect(&mut self) -> Result<(), Error>;

    /// Switch the whole matrix on. Returns the device's acknowledgement.
    async fn power_on(&mut self) -> Result<bool, Error>;

    /// Switch the whole matrix to standby.
    async fn power_off(&mut self) -> Result<bool, Error>;

    async fn is_powered_on(&mut self) -> Result<bool, Error>;

    async fn get_device_name(&mut self) -> Result<String, Error>;

    /// Model identifier, e.g. `"TMX44PRO AVK"`.
    async fn get_device_type(&mut self) -> Result<String, Error>;

    /// Firmware version string.
    async fn get_device_version(&mut self) -> Result<String, Error>;

    /// Current output → input routing.
    async fn get_video_status_parsed(&mut self) -> Result<VideoStatus, Error>;

    /// Enable an output port so it carries a signal.
    async fn output_on(&mut self, output: u8) -> Result<bool, Error>;

    async fn route_input_to_output(&mut self, input: u8, output: u8) -> Result<bool, Error>;

    /// Driver library version. Static; never touches the device.
    fn library_version(&self) -> &str {
        LIBRARY_VERSION
    }
}

#[async_trait]
impl<D: MatrixDriver + ?Sized> MatrixDriver for Box<D> {
    async fn connect(&mut self) -> Result<(), Error> {
        (**self).connect().await
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        (**self).disconnect().await
    }

    async fn power_on(&mut self) -> Result<bool, Error> {
        (**self).power_on().await
    }

    async fn power_off(&mut self) -> Result<bool, Error> {
        (**self).power_off().await
    }

    async fn is_powered_on(&mut self) -> Result<bool, Error> {
        (**self).is_powered_on().await
    }

    async fn get_device_name(&mut self) -> Result<String, Error> {
        (**self).get_device_name().await
    }

    async fn get_device_type(&mut self) -> Result<String, Error> {
        (**self).get_device_type().await
    }

    async fn get_device_version(&mut self) -> Result<String, Error> {
        (**self).get_device_version().await
    }

    async fn get_video_status_parsed(&mut self) -> Result<VideoStatus, Error> {
        (**self).get_video_status_parsed().await
    }

    async fn output_on(&mut self, output: u8) -> Result<bool, Error> {
        (**self).output_on(output).await
    }

    async fn route_input_to_output(&mut self, input: u8, output: u8) -> Result<bool, Error> {
        (**self).route_input_to_output(input, output).await
    }

    fn library_version(&self) -> &str {
        (**self).library_version()
    }
}
