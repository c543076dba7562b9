// hdmatrix-api: Async driver contract for network-attached HDMI matrix switches.

pub mod driver;
pub mod error;

pub use driver::{LIBRARY_VERSION, MatrixDriver, VideoStatus};
pub use error::Error;
