//! Pending edits for settable vehicle properties
//!
//! Values the user typed but has not committed yet. The authoritative value
//! only changes once a refreshed status arrives; [`Watched`] notices that and
//! the edits are overwritten from the new status.

use crate::error::{PanelError, Result};
use crate::vehicle::VehicleStatus;
use serde::Serialize;

/// Editable status field: charge limit (shown as a percentage)
pub const CHARGE_LIMIT: &str = "chargeLimit";
/// Editable status field: charging current in amperes
pub const AMPERAGE: &str = "amperage";

/// Remembers the last observed value of a source and reports changes.
///
/// The first observation always counts as a change.
#[derive(Debug, Clone)]
pub struct Watched<T> {
    last: Option<T>,
}

impl<T> Default for Watched<T> {
    fn default() -> Self {
        Self { last: None }
    }
}

impl<T: PartialEq + Clone> Watched<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value`; returns true when it differs from the previous one
    pub fn observe(&mut self, value: &T) -> bool {
        if self.last.as_ref() == Some(value) {
            return false;
        }
        self.last = Some(value.clone());
        true
    }

    /// Record `value` and run `on_change` if it changed
    pub fn observe_with<F: FnOnce(&T)>(&mut self, value: &T, on_change: F) -> bool {
        let changed = self.observe(value);
        if changed {
            on_change(value);
        }
        changed
    }

    pub fn current(&self) -> Option<&T> {
        self.last.as_ref()
    }
}

/// In-progress values for the editable fields.
///
/// `None` means the vehicle does not report the field; it is never coerced
/// to zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingEdits {
    charge_limit: Option<f64>,
    amperage: Option<f64>,
}

impl PendingEdits {
    /// Edits mirroring the authoritative status
    pub fn from_status(status: &VehicleStatus) -> Self {
        let mut edits = Self::default();
        edits.resync(status);
        edits
    }

    /// Overwrite every edit from the authoritative status
    pub fn resync(&mut self, status: &VehicleStatus) {
        self.charge_limit = status.charge_limit.map(|fraction| fraction * 100.0);
        self.amperage = status.amperage;
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            CHARGE_LIMIT => self.charge_limit,
            AMPERAGE => self.amperage,
            _ => None,
        }
    }

    /// Store a user edit; never touches the vehicle status
    pub fn set(&mut self, name: &str, value: f64) -> Result<()> {
        match name {
            CHARGE_LIMIT => self.charge_limit = Some(value),
            AMPERAGE => self.amperage = Some(value),
            other => {
                return Err(PanelError::validation(
                    other,
                    "property is not editable",
                ));
            }
        }
        Ok(())
    }
}

/// Source value whose change triggers a resync: vehicle id plus the editable
/// fields, compared bitwise so a NaN reading equals itself
pub(crate) type ResyncKey = (String, Option<u64>, Option<u64>);

pub(crate) fn resync_key(status: &VehicleStatus) -> ResyncKey {
    (
        status.id.clone(),
        status.charge_limit.map(f64::to_bits),
        status.amperage.map(f64::to_bits),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(limit: Option<f64>, amps: Option<f64>) -> VehicleStatus {
        let mut st = VehicleStatus::new("1");
        st.charge_limit = limit;
        st.amperage = amps;
        st
    }

    #[test]
    fn test_watched_reports_first_and_changed_values() {
        let mut w = Watched::new();
        assert!(w.observe(&1));
        assert!(!w.observe(&1));
        assert!(w.observe(&2));
        assert_eq!(w.current(), Some(&2));
    }

    #[test]
    fn test_watched_runs_callback_only_on_change() {
        let mut w = Watched::new();
        let mut calls = 0;
        w.observe_with(&"a", |_| calls += 1);
        w.observe_with(&"a", |_| calls += 1);
        w.observe_with(&"b", |_| calls += 1);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_resync_scales_charge_limit() {
        let st = status(Some(0.8), Some(16.0));
        let edits = PendingEdits::from_status(&st);
        assert_eq!(edits.get(CHARGE_LIMIT), Some(0.8 * 100.0));
        assert_eq!(edits.get(AMPERAGE), Some(16.0));
    }

    #[test]
    fn test_resync_is_idempotent() {
        let st = status(Some(0.57), Some(32.0));
        let mut edits = PendingEdits::from_status(&st);
        let first = edits.clone();
        edits.resync(&st);
        edits.resync(&st);
        assert_eq!(edits, first);
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let edits = PendingEdits::from_status(&status(None, None));
        assert_eq!(edits.get(CHARGE_LIMIT), None);
        assert_eq!(edits.get(AMPERAGE), None);
    }

    #[test]
    fn test_resync_discards_user_edits() {
        let st = status(Some(0.5), Some(10.0));
        let mut edits = PendingEdits::from_status(&st);
        edits.set(CHARGE_LIMIT, 90.0).unwrap();
        assert_eq!(edits.get(CHARGE_LIMIT), Some(90.0));
        edits.resync(&st);
        assert_eq!(edits.get(CHARGE_LIMIT), Some(50.0));
    }

    #[test]
    fn test_set_rejects_unknown_property() {
        let mut edits = PendingEdits::default();
        let err = edits.set("odometer", 1.0).unwrap_err();
        assert!(matches!(err, PanelError::Validation { .. }));
    }
}
