//! Property descriptors and the visibility resolver
//!
//! The descriptor list comes from configuration and decides, together with
//! the live [`VehicleStatus`], which controls the panel shows. Resolution is
//! a pure function and is recomputed on every render.

use crate::dispatch::ChargeCommand;
use crate::pending::PendingEdits;
use crate::vehicle::{ChargeState, VehicleStatus};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Descriptor name that enables the dedicated VIN block
pub const VIN: &str = "vin";
/// Descriptor name that enables the lock/unlock buttons
pub const LOCK_UNLOCK: &str = "lockUnlock";
/// Descriptor name that enables the start/stop charge toggle
pub const START_STOP_CHARGE: &str = "startStopCharge";
/// Permission tag of descriptors that expose the VIN
pub const READ_VIN_PERMISSION: &str = "read_vin";

/// Button labels
pub mod labels {
    pub const LOCK: &str = "Lock";
    pub const UNLOCK: &str = "Unlock";
    pub const START_CHARGE: &str = "Start charge";
    pub const STOP_CHARGE: &str = "Stop charge";
    pub const DISCONNECT: &str = "Disconnect";
    pub const DISCONNECT_ALL: &str = "Disconnect all";
    pub const RETRY: &str = "Retry";
}

/// How a descriptor is rendered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentKind {
    /// Single read-only value
    Display,
    /// Read-only value with several entries (location, tire pressure)
    List,
    /// Current value plus an editable target value
    Settable,
    /// Kind this build does not understand; rendered as nothing
    Unsupported(String),
}

impl From<String> for ComponentKind {
    fn from(label: String) -> Self {
        match label.as_str() {
            "display" | "VehicleProperty" => ComponentKind::Display,
            "list" | "VehiclePropertyList" => ComponentKind::List,
            "settable" | "SetVehicleProperty" => ComponentKind::Settable,
            _ => ComponentKind::Unsupported(label),
        }
    }
}

impl From<ComponentKind> for String {
    fn from(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Display => "display".to_string(),
            ComponentKind::List => "list".to_string(),
            ComponentKind::Settable => "settable".to_string(),
            ComponentKind::Unsupported(label) => label,
        }
    }
}

/// One displayable or controllable vehicle property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Property name; doubles as the lookup key into the vehicle status
    pub name: String,

    /// Permission tag required to read or control this property
    pub permission: String,

    /// Render kind; capability descriptors (lock/unlock, charge toggle) have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub component_type: Option<ComponentKind>,

    /// Status field edited by a settable descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_property: Option<String>,

    /// Display text
    #[serde(default)]
    pub text: String,
}

impl PropertyDescriptor {
    pub fn new(name: &str, permission: &str, kind: Option<ComponentKind>, text: &str) -> Self {
        Self {
            name: name.to_string(),
            permission: permission.to_string(),
            component_type: kind,
            target_property: None,
            text: text.to_string(),
        }
    }

    /// Settable descriptor editing `target`
    pub fn settable(name: &str, permission: &str, target: &str, text: &str) -> Self {
        Self {
            target_property: Some(target.to_string()),
            ..Self::new(name, permission, Some(ComponentKind::Settable), text)
        }
    }

    /// Whether this descriptor is rendered by a dedicated block instead of the stats list
    pub fn is_dedicated(&self) -> bool {
        self.permission == READ_VIN_PERMISSION
            || matches!(self.name.as_str(), VIN | LOCK_UNLOCK | START_STOP_CHARGE)
    }

    /// Status field this descriptor edits, defaulting to its own name
    pub fn target(&self) -> &str {
        self.target_property.as_deref().unwrap_or(&self.name)
    }
}

/// Start/stop charge button state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChargeToggle {
    pub command: ChargeCommand,
    pub label: &'static str,
}

/// Entry of a list-valued property
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub label: String,
    pub value: Value,
}

/// A descriptor merged with the live status, ready for its renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolvedControl {
    Display {
        name: String,
        text: String,
        value: Option<Value>,
    },
    List {
        name: String,
        text: String,
        items: Vec<ListItem>,
    },
    Settable {
        name: String,
        text: String,
        target_property: String,
        current_value: Option<Value>,
        pending_value: Option<f64>,
    },
    /// Renders nothing; kept so callers can see what was skipped
    Unsupported { name: String, component_type: String },
}

impl ResolvedControl {
    pub fn name(&self) -> &str {
        match self {
            ResolvedControl::Display { name, .. }
            | ResolvedControl::List { name, .. }
            | ResolvedControl::Settable { name, .. }
            | ResolvedControl::Unsupported { name, .. } => name,
        }
    }

    pub fn is_rendered(&self) -> bool {
        !matches!(self, ResolvedControl::Unsupported { .. })
    }
}

/// Output of one resolver pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedProperties {
    pub show_vin: bool,
    pub show_lock_unlock: bool,
    pub charge_toggle: Option<ChargeToggle>,
    pub stats: Vec<ResolvedControl>,
}

fn declares(descriptors: &[PropertyDescriptor], name: &str) -> bool {
    descriptors.iter().any(|d| d.name == name)
}

/// Whether the configuration enables the VIN block
pub fn shows_vin(descriptors: &[PropertyDescriptor]) -> bool {
    declares(descriptors, VIN)
}

/// Whether the configuration enables lock/unlock; independent of live status
pub fn shows_lock_unlock(descriptors: &[PropertyDescriptor]) -> bool {
    declares(descriptors, LOCK_UNLOCK)
}

/// Charge toggle state, or `None` when it must be hidden
///
/// Shown only when the vehicle is plugged in, not fully charged, and the
/// configuration declares the capability.
pub fn charge_toggle(
    descriptors: &[PropertyDescriptor],
    status: &VehicleStatus,
) -> Option<ChargeToggle> {
    if !status.is_plugged_in
        || status.charge_state == ChargeState::FullyCharged
        || !declares(descriptors, START_STOP_CHARGE)
    {
        return None;
    }
    Some(if status.charge_state == ChargeState::Charging {
        ChargeToggle {
            command: ChargeCommand::Stop,
            label: labels::STOP_CHARGE,
        }
    } else {
        ChargeToggle {
            command: ChargeCommand::Start,
            label: labels::START_CHARGE,
        }
    })
}

fn list_items(name: &str, value: Option<Value>) -> Vec<ListItem> {
    match value {
        None => Vec::new(),
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(label, value)| ListItem { label, value })
            .collect(),
        Some(Value::Array(values)) => values
            .into_iter()
            .enumerate()
            .map(|(i, value)| ListItem {
                label: (i + 1).to_string(),
                value,
            })
            .collect(),
        Some(scalar) => vec![ListItem {
            label: name.to_string(),
            value: scalar,
        }],
    }
}

/// Resolve one descriptor against the live status
pub fn resolve_descriptor(
    descriptor: &PropertyDescriptor,
    status: &VehicleStatus,
    pending: &PendingEdits,
) -> ResolvedControl {
    let name = descriptor.name.clone();
    let text = descriptor.text.clone();
    match &descriptor.component_type {
        Some(ComponentKind::Display) => ResolvedControl::Display {
            value: status.property(&name),
            name,
            text,
        },
        Some(ComponentKind::List) => ResolvedControl::List {
            items: list_items(&name, status.property(&name)),
            name,
            text,
        },
        Some(ComponentKind::Settable) => {
            let target = descriptor.target();
            ResolvedControl::Settable {
                target_property: target.to_string(),
                current_value: status.property(target),
                pending_value: pending.get(target),
                name,
                text,
            }
        }
        Some(ComponentKind::Unsupported(kind)) => ResolvedControl::Unsupported {
            name,
            component_type: kind.clone(),
        },
        None => ResolvedControl::Unsupported {
            name,
            component_type: String::new(),
        },
    }
}

/// Resolve the full descriptor list in configuration order
pub fn resolve(
    descriptors: &[PropertyDescriptor],
    status: &VehicleStatus,
    pending: &PendingEdits,
) -> ResolvedProperties {
    let stats = descriptors
        .iter()
        .filter(|d| !d.is_dedicated())
        .map(|d| resolve_descriptor(d, status, pending))
        .collect();

    ResolvedProperties {
        show_vin: shows_vin(descriptors),
        show_lock_unlock: shows_lock_unlock(descriptors),
        charge_toggle: charge_toggle(descriptors, status),
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptors() -> Vec<PropertyDescriptor> {
        vec![
            PropertyDescriptor::new(VIN, READ_VIN_PERMISSION, Some(ComponentKind::Display), "VIN"),
            PropertyDescriptor::new(LOCK_UNLOCK, "control_security", None, "Lock"),
            PropertyDescriptor::new(START_STOP_CHARGE, "control_charge", None, "Charge"),
            PropertyDescriptor::new("odometer", "read_odometer", Some(ComponentKind::Display), "Odometer"),
            PropertyDescriptor::new("location", "read_location", Some(ComponentKind::List), "Location"),
            PropertyDescriptor::settable("setChargeLimit", "control_charge", "chargeLimit", "Charge limit"),
        ]
    }

    fn status() -> VehicleStatus {
        let mut st = VehicleStatus::new("1");
        st.is_plugged_in = true;
        st.charge_limit = Some(0.8);
        st.extra.insert("odometer".into(), json!(1200.5));
        st.extra
            .insert("location".into(), json!({"latitude": 52.1, "longitude": 4.3}));
        st
    }

    #[test]
    fn test_kind_parsing_accepts_legacy_names() {
        assert_eq!(ComponentKind::from("VehicleProperty".to_string()), ComponentKind::Display);
        assert_eq!(ComponentKind::from("list".to_string()), ComponentKind::List);
        assert_eq!(
            ComponentKind::from("Gauge".to_string()),
            ComponentKind::Unsupported("Gauge".to_string())
        );
    }

    #[test]
    fn test_dedicated_descriptors_excluded_from_stats() {
        let st = status();
        let resolved = resolve(&descriptors(), &st, &PendingEdits::from_status(&st));
        let names: Vec<&str> = resolved.stats.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["odometer", "location", "setChargeLimit"]);
        assert!(resolved.show_vin);
        assert!(resolved.show_lock_unlock);
    }

    #[test]
    fn test_any_read_vin_descriptor_is_dedicated() {
        let d = PropertyDescriptor::new("vinAlias", READ_VIN_PERMISSION, Some(ComponentKind::Display), "VIN");
        assert!(d.is_dedicated());
    }

    #[test]
    fn test_list_items_from_object() {
        let st = status();
        let all = descriptors();
        let d = &all[4];
        let ResolvedControl::List { items, .. } = resolve_descriptor(d, &st, &PendingEdits::default())
        else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "latitude");
    }

    #[test]
    fn test_settable_carries_current_and_pending() {
        let st = status();
        let pending = PendingEdits::from_status(&st);
        let all = descriptors();
        let d = &all[5];
        match resolve_descriptor(d, &st, &pending) {
            ResolvedControl::Settable {
                target_property,
                current_value,
                pending_value,
                ..
            } => {
                assert_eq!(target_property, "chargeLimit");
                assert_eq!(current_value, Some(json!(0.8)));
                assert_eq!(pending_value, Some(0.8 * 100.0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_charge_toggle_hidden_when_unplugged_or_full() {
        let mut st = status();
        st.is_plugged_in = false;
        assert!(charge_toggle(&descriptors(), &st).is_none());

        let mut st = status();
        st.charge_state = ChargeState::FullyCharged;
        assert!(charge_toggle(&descriptors(), &st).is_none());

        let st = status();
        let toggle = charge_toggle(&descriptors(), &st).unwrap();
        assert_eq!(toggle.command, ChargeCommand::Start);
        assert_eq!(toggle.label, labels::START_CHARGE);
    }
}
