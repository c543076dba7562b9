// ── Live matrix state ──

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Whole-matrix power state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    /// Not yet observed by a successful refresh.
    #[default]
    Unknown,
}

impl PowerState {
    /// `Some(true)` when on, `Some(false)` when off, `None` when unknown.
    pub fn is_on(self) -> Option<bool> {
        match self {
            Self::On => Some(true),
            Self::Off => Some(false),
            Self::Unknown => None,
        }
    }
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

/// Output → input assignment. Both sides are 1-based.
///
/// An output missing from the table has no known input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingTable(BTreeMap<u8, u8>);

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input currently routed to `output`, if known.
    pub fn get(&self, output: u8) -> Option<u8> {
        self.0.get(&output).copied()
    }

    /// Iterate `(output, input)` pairs in output order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.0.iter().map(|(o, i)| (*o, *i))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, output: u8, input: u8) -> Option<u8> {
        self.0.insert(output, input)
    }
}

impl FromIterator<(u8, u8)> for RoutingTable {
    fn from_iter<I: IntoIterator<Item = (u8, u8)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<u8, u8>> for RoutingTable {
    fn from(map: BTreeMap<u8, u8>) -> Self {
        Self(map)
    }
}

/// Power and routing, published together so readers never observe one
/// refreshed without the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixState {
    pub power: PowerState,
    pub routing: RoutingTable,
    /// When the device last confirmed this state. `None` until the first
    /// successful refresh.
    pub refreshed_at: Option<DateTime<Utc>>,
}
