// ── Matrix capabilities ──
//
// Port counts are not queryable on the wire; they come from a static
// table keyed by the model string the device reports.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

/// Number of input and output ports on a matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    pub inputs: u8,
    pub outputs: u8,
}

/// Known models and their port counts.
pub const SUPPORTED_MODELS: &[(&str, Capabilities)] = &[(
    "TMX44PRO AVK",
    Capabilities {
        inputs: 4,
        outputs: 4,
    },
)];

impl Capabilities {
    /// Assumed for models missing from [`SUPPORTED_MODELS`].
    pub const DEFAULT: Self = Self {
        inputs: 4,
        outputs: 4,
    };

    /// Look up a model's port counts, falling back to [`Self::DEFAULT`].
    pub fn for_model(model: &str) -> Self {
        lookup_model(model).unwrap_or(Self::DEFAULT)
    }

    pub fn inputs(&self) -> RangeInclusive<u8> {
        1..=self.inputs
    }

    pub fn outputs(&self) -> RangeInclusive<u8> {
        1..=self.outputs
    }

    pub fn has_input(&self, input: u8) -> bool {
        self.inputs().contains(&input)
    }

    pub fn has_output(&self, output: u8) -> bool {
        self.outputs().contains(&output)
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Exact-match lookup in [`SUPPORTED_MODELS`].
pub fn lookup_model(model: &str) -> Option<Capabilities> {
    let model = model.trim();
    SUPPORTED_MODELS
        .iter()
        .find(|(known, _)| *known == model)
        .map(|(_, caps)| *caps)
}

/// Whether a reported device name belongs to a supported model family.
///
/// The family is the first word of each supported model string, so
/// `"TMX44PRO AVK"` accepts any name containing `"TMX44PRO"`.
pub fn is_supported_device_name(name: &str) -> bool {
    SUPPORTED_MODELS
        .iter()
        .filter_map(|(model, _)| model.split_whitespace().next())
        .any(|family| name.contains(family))
}
