use super::*;
use crate::pending::{AMPERAGE, CHARGE_LIMIT};
use crate::properties::{LOCK_UNLOCK, READ_VIN_PERMISSION, START_STOP_CHARGE, VIN};

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_level: None,
            file_level: None,
            file: None,
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_ms: 10_000,
            access_token: None,
        }
    }
}

/// Descriptor list of a typical deployment
pub fn default_vehicle_properties() -> Vec<PropertyDescriptor> {
    vec![
        PropertyDescriptor::new(VIN, READ_VIN_PERMISSION, Some(ComponentKind::Display), "VIN"),
        PropertyDescriptor::new(LOCK_UNLOCK, "control_security", None, "Lock/unlock"),
        PropertyDescriptor::new(START_STOP_CHARGE, "control_charge", None, "Start/stop charge"),
        PropertyDescriptor::new("battery", "read_battery", Some(ComponentKind::Display), "Battery"),
        PropertyDescriptor::new("chargeState", "read_charge", Some(ComponentKind::Display), "Charging status"),
        PropertyDescriptor::new("odometer", "read_odometer", Some(ComponentKind::Display), "Odometer"),
        PropertyDescriptor::new("location", "read_location", Some(ComponentKind::List), "Location"),
        PropertyDescriptor::settable("setChargeLimit", "control_charge", CHARGE_LIMIT, "Charge limit"),
        PropertyDescriptor::settable("setAmperage", "control_charge", AMPERAGE, "Amperage"),
    ]
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            api: ApiConfig::default(),
            vehicle_properties: default_vehicle_properties(),
        }
    }
}
