//! Action dispatch
//!
//! Turns UI events into calls on the host's callbacks. The host is the
//! container that owns the vehicle list and the selection; the panel never
//! talks to the vehicle API for updates itself.

use crate::error::Result;
use crate::logging::get_logger;
use crate::properties::{ResolvedControl, ResolvedProperties};
use crate::vehicle::{VehicleApi, VehicleStatus};
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;

/// Update-property name used by the lock button
pub const LOCK_PROPERTY: &str = "lock";
/// Update-property name used by the unlock button
pub const UNLOCK_PROPERTY: &str = "unlock";
/// Update-property name used by the charge toggle
pub const CHARGE_STATE_PROPERTY: &str = "chargeState";

/// Requested charge action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChargeCommand {
    Start,
    Stop,
}

impl ChargeCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeCommand::Start => "START",
            ChargeCommand::Stop => "STOP",
        }
    }
}

/// Requested lock action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LockCommand {
    Lock,
    Unlock,
}

impl LockCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockCommand::Lock => "LOCK",
            LockCommand::Unlock => "UNLOCK",
        }
    }

    fn property(&self) -> &'static str {
        match self {
            LockCommand::Lock => LOCK_PROPERTY,
            LockCommand::Unlock => UNLOCK_PROPERTY,
        }
    }
}

/// Which vehicles a disconnect applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DisconnectScope {
    /// Only the selected vehicle
    Single,
    /// Every connected vehicle
    All,
}

impl fmt::Display for DisconnectScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisconnectScope::Single => f.write_str("single"),
            DisconnectScope::All => f.write_str("all"),
        }
    }
}

/// User interaction with the panel
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Lock,
    Unlock,
    ToggleCharge,
    /// The settable-property renderer changed its input
    EditSetting { target_property: String, value: f64 },
    /// The settable-property renderer committed a value
    CommitSetting { target_property: String, value: String },
    Disconnect,
    DisconnectAll,
    SelectVehicle(String),
    RetrySwitch,
    DismissError,
}

/// Host-facing intent produced by the dispatcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    UpdateProperty { name: String, value: String },
    Disconnect(DisconnectScope),
}

impl PanelAction {
    fn update(name: &str, value: &str) -> Self {
        PanelAction::UpdateProperty {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    /// Invoke the matching host callback
    pub fn apply<H: PanelHost + ?Sized>(self, host: &mut H) {
        match self {
            PanelAction::UpdateProperty { name, value } => host.update_property(&name, &value),
            PanelAction::Disconnect(scope) => host.disconnect(scope),
        }
    }
}

/// Callbacks owned by the container hosting the panel
pub trait PanelHost {
    /// Request a property change on the selected vehicle; fire-and-forget
    fn update_property(&mut self, name: &str, value: &str);

    fn disconnect(&mut self, scope: DisconnectScope);

    /// Replace the selected vehicle with freshly fetched data
    fn set_selected_vehicle(&mut self, status: VehicleStatus);
}

/// Map a host-facing event to its action.
///
/// Events for controls that are not visible yield `None`, as do events the
/// panel handles internally (edits, switching, error recovery). `connected`
/// is the number of connected vehicles; disconnect-all needs more than one.
pub fn translate(
    event: &PanelEvent,
    visible: &ResolvedProperties,
    connected: usize,
) -> Option<PanelAction> {
    match event {
        PanelEvent::Lock | PanelEvent::Unlock if visible.show_lock_unlock => {
            let command = if *event == PanelEvent::Lock {
                LockCommand::Lock
            } else {
                LockCommand::Unlock
            };
            Some(PanelAction::update(command.property(), command.as_str()))
        }
        PanelEvent::ToggleCharge => visible
            .charge_toggle
            .map(|toggle| PanelAction::update(CHARGE_STATE_PROPERTY, toggle.command.as_str())),
        PanelEvent::CommitSetting {
            target_property,
            value,
        } if edits_visible_target(visible, target_property) => {
            Some(PanelAction::update(target_property, value))
        }
        PanelEvent::Disconnect => Some(PanelAction::Disconnect(DisconnectScope::Single)),
        PanelEvent::DisconnectAll if connected > 1 => {
            Some(PanelAction::Disconnect(DisconnectScope::All))
        }
        _ => None,
    }
}

fn edits_visible_target(visible: &ResolvedProperties, target: &str) -> bool {
    visible.stats.iter().any(|control| {
        matches!(control, ResolvedControl::Settable { target_property, .. } if target_property == target)
    })
}

/// Host command forwarded over a channel
#[derive(Debug, Clone, PartialEq)]
pub enum HostCommand {
    UpdateProperty { name: String, value: String },
    Disconnect(DisconnectScope),
    ReplaceSelection(Box<VehicleStatus>),
}

impl HostCommand {
    /// Carry the command out against the vehicle API.
    ///
    /// Returns the new selection for `ReplaceSelection`.
    pub async fn execute<A: VehicleApi + ?Sized>(
        self,
        api: &A,
        selected_id: &str,
    ) -> Result<Option<VehicleStatus>> {
        match self {
            HostCommand::UpdateProperty { name, value } => {
                api.update_property(selected_id, &name, &value).await?;
                Ok(None)
            }
            HostCommand::Disconnect(DisconnectScope::Single) => {
                api.disconnect(Some(selected_id)).await?;
                Ok(None)
            }
            HostCommand::Disconnect(DisconnectScope::All) => {
                api.disconnect(None).await?;
                Ok(None)
            }
            HostCommand::ReplaceSelection(status) => Ok(Some(*status)),
        }
    }
}

/// Host that forwards every callback to an unbounded channel
pub struct ChannelHost {
    tx: mpsc::UnboundedSender<HostCommand>,
    logger: crate::logging::StructuredLogger,
}

impl ChannelHost {
    pub fn new(tx: mpsc::UnboundedSender<HostCommand>) -> Self {
        Self {
            tx,
            logger: get_logger("host"),
        }
    }

    /// Host plus the receiving end of its channel
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HostCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    fn send(&self, cmd: HostCommand) {
        if self.tx.send(cmd).is_err() {
            self.logger.warn("Host command receiver dropped");
        }
    }
}

impl PanelHost for ChannelHost {
    fn update_property(&mut self, name: &str, value: &str) {
        self.send(HostCommand::UpdateProperty {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    fn disconnect(&mut self, scope: DisconnectScope) {
        self.send(HostCommand::Disconnect(scope));
    }

    fn set_selected_vehicle(&mut self, status: VehicleStatus) {
        self.send(HostCommand::ReplaceSelection(Box::new(status)));
    }
}
