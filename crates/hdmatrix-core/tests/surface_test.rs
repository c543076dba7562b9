// Integration tests for the control surfaces built on top of a coordinator.

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;

use hdmatrix_core::{MatrixEvent, OutputSelector, PowerAction, PowerButton, PowerSwitch, Surfaces};

use common::{DEVICE_ID, coordinator, coordinator_with, quiet_config};

// ── Identity / layout ───────────────────────────────────────────────

#[tokio::test]
async fn test_surfaces_cover_every_output() {
    let (coord, _probe) = coordinator(quiet_config());

    let surfaces = Surfaces::build(&coord).await;

    assert_eq!(surfaces.identity.model, "TMX44PRO AVK");
    assert_eq!(surfaces.power_switch.unique_id(), format!("{DEVICE_ID}_power"));
    assert_eq!(
        surfaces
            .power_buttons
            .iter()
            .map(PowerButton::unique_id)
            .collect::<Vec<_>>(),
        vec![format!("{DEVICE_ID}_power_on"), format!("{DEVICE_ID}_power_off")]
    );
    assert_eq!(
        surfaces
            .selectors
            .iter()
            .map(OutputSelector::unique_id)
            .collect::<Vec<_>>(),
        (1..=4)
            .map(|n| format!("{DEVICE_ID}_matrix_output_{n}"))
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_surfaces_fall_back_to_default_layout() {
    let (coord, probe) = coordinator(quiet_config());
    probe.set_unreachable(true);

    let surfaces = Surfaces::build(&coord).await;

    assert!(surfaces.identity.is_unknown());
    assert_eq!(surfaces.selectors.len(), 4);
}

#[test]
fn test_power_action_keys() {
    assert_eq!(PowerAction::PowerOn.to_string(), "power_on");
    assert_eq!("power_off".parse::<PowerAction>().unwrap(), PowerAction::PowerOff);
}

// ── Output selector ─────────────────────────────────────────────────

#[tokio::test]
async fn test_selector_defaults_before_first_refresh() {
    let (coord, _probe) = coordinator(quiet_config());
    coord.fetch_device_info().await;
    let selector = OutputSelector::new(coord, 3);

    assert_eq!(selector.name(), "Output 3");
    assert_eq!(selector.options(), vec!["1", "2", "3", "4"]);
    assert_eq!(selector.current_option(), "1");
}

#[tokio::test]
async fn test_selector_reflects_and_changes_route() {
    let (coord, probe) = coordinator_with(quiet_config(), |d| {
        d.routes.insert(2, 4);
    });
    coord.start().await.unwrap();
    let selector = OutputSelector::new(coord.clone(), 2);

    assert_eq!(selector.current_option(), "4");
    assert!(selector.select_option("3").await);
    assert_eq!(selector.current_option(), "3");
    assert_eq!(probe.with_device(|d| d.routes.get(&2).copied()), Some(3));

    coord.shutdown().await;
}

#[tokio::test]
async fn test_selector_ignores_bad_options() {
    let (coord, probe) = coordinator(quiet_config());
    coord.start().await.unwrap();
    let selector = OutputSelector::new(coord.clone(), 1);
    probe.clear_calls();

    assert!(!selector.select_option("abc").await);
    assert!(!selector.select_option("").await);
    assert!(!selector.select_option("9").await);

    assert!(probe.calls().is_empty());
    assert_eq!(selector.current_option(), "1");
    coord.shutdown().await;
}

// ── Power ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_switch_state_unknown_until_refresh() {
    let (coord, _probe) = coordinator(quiet_config());
    let switch = PowerSwitch::new(coord.clone());

    assert_eq!(switch.is_on(), None);
    assert!(!switch.turn_on().await);

    coord.start().await.unwrap();
    assert_eq!(switch.is_on(), Some(true));
    coord.shutdown().await;
}

#[tokio::test]
async fn test_switch_turn_off_refreshes_state() {
    let (coord, probe) = coordinator(quiet_config());
    coord.start().await.unwrap();
    let switch = PowerSwitch::new(coord.clone());
    let mut events = coord.events();

    assert!(switch.turn_off().await);
    assert!(!probe.with_device(|d| d.powered));

    tokio::time::timeout(Duration::from_secs(5), async {
        while !matches!(events.recv().await, Ok(MatrixEvent::Refreshed(_))) {}
    })
    .await
    .unwrap();
    assert_eq!(switch.is_on(), Some(false));
    coord.shutdown().await;
}

#[tokio::test]
async fn test_buttons_send_power_commands() {
    let (coord, probe) = coordinator_with(quiet_config(), |d| d.powered = false);
    coord.start().await.unwrap();

    let on = PowerButton::new(coord.clone(), PowerAction::PowerOn);
    assert!(on.press().await);
    assert!(probe.with_device(|d| d.powered));

    let off = PowerButton::new(coord.clone(), PowerAction::PowerOff);
    assert!(off.press().await);
    assert!(!probe.with_device(|d| d.powered));

    probe.set_nack(true);
    assert!(!on.press().await);
    coord.shutdown().await;
}
