// ── Control surfaces ──
//
// Thin, stateless views over a `Coordinator` for a host UI: a power
// switch, two momentary power buttons and one input selector per output.
// Every read comes from the cache; every write goes through the
// coordinator's command path.

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{debug, warn};

use crate::coordinator::Coordinator;
use crate::model::{DeviceIdentity, PowerState};

/// Value shown by a selector before the device has reported a route.
pub const DEFAULT_OPTION: &str = "1";

// ── Power switch ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct PowerSwitch {
    coordinator: Coordinator,
}

impl PowerSwitch {
    pub const KEY: &'static str = "power";

    pub fn new(coordinator: Coordinator) -> Self {
        Self { coordinator }
    }

    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.coordinator.device_id(), Self::KEY)
    }

    /// `None` until the first successful refresh.
    pub fn is_on(&self) -> Option<bool> {
        self.coordinator.power_state().is_on()
    }

    pub fn power_state(&self) -> PowerState {
        self.coordinator.power_state()
    }

    pub async fn turn_on(&self) -> bool {
        self.set(true).await
    }

    pub async fn turn_off(&self) -> bool {
        self.set(false).await
    }

    async fn set(&self, on: bool) -> bool {
        let accepted = if on {
            self.coordinator.power_on().await
        } else {
            self.coordinator.power_off().await
        };
        if !accepted {
            warn!(id = %self.unique_id(), on, "power switch command failed");
        }
        accepted
    }
}

// ── Power buttons ────────────────────────────────────────────────

/// Momentary power actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PowerAction {
    PowerOn,
    PowerOff,
}

#[derive(Clone)]
pub struct PowerButton {
    coordinator: Coordinator,
    action: PowerAction,
}

impl PowerButton {
    pub fn new(coordinator: Coordinator, action: PowerAction) -> Self {
        Self {
            coordinator,
            action,
        }
    }

    pub fn action(&self) -> PowerAction {
        self.action
    }

    /// `<device_id>_power_on` / `<device_id>_power_off`.
    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.coordinator.device_id(), self.action)
    }

    pub async fn press(&self) -> bool {
        let accepted = match self.action {
            PowerAction::PowerOn => self.coordinator.power_on().await,
            PowerAction::PowerOff => self.coordinator.power_off().await,
        };
        if !accepted {
            warn!(id = %self.unique_id(), "power button press failed");
        }
        accepted
    }
}

// ── Output selector ──────────────────────────────────────────────

/// Chooses which input feeds one output.
///
/// Options and the current choice are the decimal strings `"1"`..`"N"`.
#[derive(Clone)]
pub struct OutputSelector {
    coordinator: Coordinator,
    output: u8,
}

impl OutputSelector {
    pub const KEY: &'static str = "matrix_output";

    pub fn new(coordinator: Coordinator, output: u8) -> Self {
        Self {
            coordinator,
            output,
        }
    }

    pub fn output(&self) -> u8 {
        self.output
    }

    pub fn unique_id(&self) -> String {
        format!(
            "{}_{}_{}",
            self.coordinator.device_id(),
            Self::KEY,
            self.output
        )
    }

    pub fn name(&self) -> String {
        format!("Output {}", self.output)
    }

    /// One option per input the matrix has.
    pub fn options(&self) -> Vec<String> {
        self.coordinator
            .capabilities()
            .inputs()
            .map(|input| input.to_string())
            .collect()
    }

    /// Input currently routed to this output, or [`DEFAULT_OPTION`] if unknown.
    pub fn current_option(&self) -> String {
        self.coordinator
            .routing_table()
            .get(self.output)
            .map_or_else(|| DEFAULT_OPTION.to_owned(), |input| input.to_string())
    }

    /// Route the input named by `option` to this output.
    ///
    /// Options that are not a valid input number are logged and ignored.
    pub async fn select_option(&self, option: &str) -> bool {
        let input = match option.trim().parse::<u8>() {
            Ok(input) => input,
            Err(e) => {
                warn!(id = %self.unique_id(), option, error = %e, "ignoring invalid input selection");
                return false;
            }
        };

        debug!(input, output = self.output, "input selected");
        self.coordinator
            .route_input_to_output(input, self.output)
            .await
    }
}

// ── Surface set ──────────────────────────────────────────────────

/// Every control surface for one matrix.
#[derive(Clone)]
pub struct Surfaces {
    pub identity: std::sync::Arc<DeviceIdentity>,
    pub power_switch: PowerSwitch,
    pub power_buttons: Vec<PowerButton>,
    pub selectors: Vec<OutputSelector>,
}

impl Surfaces {
    /// Build the surfaces for a coordinator, fetching its identity first
    /// if that has not happened yet. One selector is created per output.
    pub async fn build(coordinator: &Coordinator) -> Self {
        let identity = coordinator.fetch_device_info().await;
        let caps = coordinator.capabilities();

        Self {
            identity,
            power_switch: PowerSwitch::new(coordinator.clone()),
            power_buttons: PowerAction::iter()
                .map(|action| PowerButton::new(coordinator.clone(), action))
                .collect(),
            selectors: caps
                .outputs()
                .map(|output| OutputSelector::new(coordinator.clone(), output))
                .collect(),
        }
    }
}
