use vehicle_panel::config::default_vehicle_properties;
use vehicle_panel::dispatch::{ChannelHost, HostCommand};
use vehicle_panel::properties::LOCK_UNLOCK;
use vehicle_panel::vehicle::ChargeState;
use vehicle_panel::{
    DisconnectScope, PanelEvent, PanelHost, VehiclePanel, VehicleStatus, VehicleSummary,
};

#[derive(Default)]
struct RecordingHost {
    updates: Vec<(String, String)>,
    disconnects: Vec<DisconnectScope>,
}

impl PanelHost for RecordingHost {
    fn update_property(&mut self, name: &str, value: &str) {
        self.updates.push((name.to_string(), value.to_string()));
    }

    fn disconnect(&mut self, scope: DisconnectScope) {
        self.disconnects.push(scope);
    }

    fn set_selected_vehicle(&mut self, _status: VehicleStatus) {}
}

fn plugged_in(state: ChargeState) -> VehicleStatus {
    let mut st = VehicleStatus::new("1");
    st.is_plugged_in = true;
    st.charge_state = state;
    st.charge_limit = Some(0.8);
    st.amperage = Some(16.0);
    st
}

fn two_vehicles() -> Vec<VehicleSummary> {
    vec![
        VehicleSummary::new("1", "Tesla", "Model 3", 2020),
        VehicleSummary::new("2", "Kia", "Niro", 2021),
    ]
}

fn press(panel: &mut VehiclePanel, event: PanelEvent, st: &VehicleStatus, host: &mut RecordingHost) {
    let ticket = panel.handle_event(event, st, &two_vehicles(), host).unwrap();
    assert!(ticket.is_none());
}

#[test]
fn lock_unlock_and_charge_toggle_request_updates() {
    let mut panel = VehiclePanel::new(default_vehicle_properties());
    let mut host = RecordingHost::default();

    let charging = plugged_in(ChargeState::Charging);
    press(&mut panel, PanelEvent::Lock, &charging, &mut host);
    press(&mut panel, PanelEvent::Unlock, &charging, &mut host);
    press(&mut panel, PanelEvent::ToggleCharge, &charging, &mut host);

    let idle = plugged_in(ChargeState::NotCharging);
    press(&mut panel, PanelEvent::ToggleCharge, &idle, &mut host);

    assert_eq!(
        host.updates,
        vec![
            ("lock".to_string(), "LOCK".to_string()),
            ("unlock".to_string(), "UNLOCK".to_string()),
            ("chargeState".to_string(), "STOP".to_string()),
            ("chargeState".to_string(), "START".to_string()),
        ]
    );
}

#[test]
fn hidden_controls_are_ignored() {
    let descriptors = default_vehicle_properties()
        .into_iter()
        .filter(|d| d.name != LOCK_UNLOCK)
        .collect();
    let mut panel = VehiclePanel::new(descriptors);
    let mut host = RecordingHost::default();

    let full = plugged_in(ChargeState::FullyCharged);
    press(&mut panel, PanelEvent::Lock, &full, &mut host);
    press(&mut panel, PanelEvent::ToggleCharge, &full, &mut host);
    assert!(host.updates.is_empty());
}

#[test]
fn disconnect_buttons_pass_their_scope() {
    let mut panel = VehiclePanel::new(default_vehicle_properties());
    let mut host = RecordingHost::default();
    let st = plugged_in(ChargeState::Charging);

    press(&mut panel, PanelEvent::Disconnect, &st, &mut host);
    press(&mut panel, PanelEvent::DisconnectAll, &st, &mut host);
    assert_eq!(host.disconnects, vec![DisconnectScope::Single, DisconnectScope::All]);
}

#[test]
fn single_vehicle_panel_drops_disconnect_all() {
    let mut panel = VehiclePanel::new(default_vehicle_properties());
    let mut host = RecordingHost::default();
    let st = plugged_in(ChargeState::Charging);
    let only = [st.summary()];

    assert!(panel.render(&st, &only).controls().is_some_and(|c| !c.disconnect_all));
    for event in [PanelEvent::DisconnectAll, PanelEvent::Disconnect] {
        panel.handle_event(event, &st, &only, &mut host).unwrap();
    }
    assert_eq!(host.disconnects, vec![DisconnectScope::Single]);
}

#[test]
fn commit_requires_a_shown_settable_target() {
    let mut panel = VehiclePanel::new(default_vehicle_properties());
    let mut host = RecordingHost::default();
    let st = plugged_in(ChargeState::Charging);

    for target in ["vin", "lock", "odometer", "setChargeLimit"] {
        press(
            &mut panel,
            PanelEvent::CommitSetting {
                target_property: target.into(),
                value: "HACK".into(),
            },
            &st,
            &mut host,
        );
    }
    assert!(host.updates.is_empty());

    // Settable controls stay on screen for an unplugged vehicle
    let mut unplugged = VehicleStatus::new("1");
    unplugged.charge_limit = Some(0.5);
    press(
        &mut panel,
        PanelEvent::CommitSetting {
            target_property: "chargeLimit".into(),
            value: "60".into(),
        },
        &unplugged,
        &mut host,
    );
    assert_eq!(host.updates, vec![("chargeLimit".to_string(), "60".to_string())]);
}

#[test]
fn edits_stay_local_until_committed() {
    let mut panel = VehiclePanel::new(default_vehicle_properties());
    let mut host = RecordingHost::default();
    let st = plugged_in(ChargeState::Charging);
    panel.observe(&st);

    press(
        &mut panel,
        PanelEvent::EditSetting {
            target_property: "amperage".into(),
            value: 24.0,
        },
        &st,
        &mut host,
    );
    assert_eq!(panel.pending().get("amperage"), Some(24.0));
    assert_eq!(st.amperage, Some(16.0));
    assert!(host.updates.is_empty());

    press(
        &mut panel,
        PanelEvent::CommitSetting {
            target_property: "amperage".into(),
            value: "24".into(),
        },
        &st,
        &mut host,
    );
    assert_eq!(host.updates, vec![("amperage".to_string(), "24".to_string())]);
}

#[test]
fn editing_a_read_only_property_fails() {
    let mut panel = VehiclePanel::new(default_vehicle_properties());
    let mut host = RecordingHost::default();
    let st = plugged_in(ChargeState::Charging);
    let err = panel
        .handle_event(
            PanelEvent::EditSetting {
                target_property: "odometer".into(),
                value: 1.0,
            },
            &st,
            &two_vehicles(),
            &mut host,
        )
        .unwrap_err();
    assert!(err.to_string().contains("not editable"));
}

#[tokio::test]
async fn channel_host_queues_commands_in_order() {
    let mut panel = VehiclePanel::new(default_vehicle_properties());
    let (mut host, mut rx) = ChannelHost::channel();
    let st = plugged_in(ChargeState::Charging);

    let vehicles = two_vehicles();
    panel.handle_event(PanelEvent::ToggleCharge, &st, &vehicles, &mut host).unwrap();
    panel.handle_event(PanelEvent::DisconnectAll, &st, &vehicles, &mut host).unwrap();
    drop(host);

    assert_eq!(
        rx.recv().await,
        Some(HostCommand::UpdateProperty {
            name: "chargeState".into(),
            value: "STOP".into()
        })
    );
    assert_eq!(rx.recv().await, Some(HostCommand::Disconnect(DisconnectScope::All)));
    assert_eq!(rx.recv().await, None);
}
