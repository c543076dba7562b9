// ── Device identity ──

use serde::{Deserialize, Serialize};

/// Manufacturer reported for every supported matrix.
pub const MANUFACTURER: &str = "AVGear";

/// Placeholder used for identity fields the device never reported.
pub const UNKNOWN: &str = "Unknown";

/// Static device information, fetched once per coordinator lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub name: String,
    /// Model identifier as reported by the device (e.g. `"TMX44PRO AVK"`).
    pub model: String,
    pub manufacturer: String,
    pub firmware_version: String,
    /// Version of the driver library that produced this identity.
    pub library_version: String,
}

impl DeviceIdentity {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        firmware_version: impl Into<String>,
        library_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            manufacturer: MANUFACTURER.into(),
            firmware_version: firmware_version.into(),
            library_version: library_version.into(),
        }
    }

    /// Identity used when the device could not be queried.
    ///
    /// Every field is populated; only the library version is real.
    pub fn unknown(library_version: impl Into<String>) -> Self {
        Self::new(UNKNOWN, UNKNOWN, UNKNOWN, library_version)
    }

    pub fn is_unknown(&self) -> bool {
        self.model == UNKNOWN
    }
}
