//! The vehicle panel component
//!
//! Owns the three state slices (pending edits, switch loading state and
//! the change watchers feeding them) and produces a [`PanelView`] for a
//! given vehicle status. Status and the vehicle list belong to the host and
//! are passed in on every call.

use crate::config::PanelConfig;
use crate::dispatch::{PanelEvent, PanelHost, translate};
use crate::error::Result;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::pending::{PendingEdits, ResyncKey, Watched, resync_key};
use crate::properties::{self, ChargeToggle, PropertyDescriptor, ResolvedControl, labels};
use crate::switcher::{LoadingState, SwitchOutcome, SwitchTicket, VehicleSwitcher};
use crate::vehicle::{VehicleApi, VehicleStatus, VehicleSummary};
use serde::Serialize;

/// Entry of the vehicle switcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwitcherOption {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelHeader {
    /// Only one vehicle connected
    Title { text: String },
    Switcher {
        options: Vec<SwitcherOption>,
        selected: String,
    },
}

/// Controls of the selected vehicle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlsView {
    pub vin: Option<String>,
    pub lock_unlock: bool,
    pub charge_toggle: Option<ChargeToggle>,
    /// Generic property list, unsupported descriptors removed
    pub stats: Vec<ResolvedControl>,
    pub disconnect_all: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelBody {
    Loading,
    Failed { message: String, retry_label: String },
    Controls(ControlsView),
}

/// Everything needed to draw the panel once
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub header: PanelHeader,
    pub body: PanelBody,
}

impl PanelView {
    pub fn is_loading(&self) -> bool {
        matches!(self.body, PanelBody::Loading)
    }

    pub fn controls(&self) -> Option<&ControlsView> {
        match &self.body {
            PanelBody::Controls(c) => Some(c),
            _ => None,
        }
    }
}

/// Control and status panel for the selected vehicle
pub struct VehiclePanel {
    descriptors: Vec<PropertyDescriptor>,
    pending: PendingEdits,
    resync_source: Watched<ResyncKey>,
    selected: Watched<String>,
    switcher: VehicleSwitcher,
    logger: StructuredLogger,
}

impl VehiclePanel {
    pub fn new(descriptors: Vec<PropertyDescriptor>) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        let logger = get_logger_with_context(LogContext::new("panel").with_session_id(session_id));
        Self {
            descriptors,
            pending: PendingEdits::default(),
            resync_source: Watched::new(),
            selected: Watched::new(),
            switcher: VehicleSwitcher::new(logger.child("switcher")),
            logger,
        }
    }

    pub fn from_config(config: &PanelConfig) -> Self {
        Self::new(config.vehicle_properties.clone())
    }

    pub fn descriptors(&self) -> &[PropertyDescriptor] {
        &self.descriptors
    }

    pub fn pending(&self) -> &PendingEdits {
        &self.pending
    }

    pub fn loading_state(&self) -> &LoadingState {
        self.switcher.state()
    }

    pub fn is_loading(&self) -> bool {
        self.switcher.is_loading()
    }

    /// Take in the status the host currently holds.
    ///
    /// Resyncs pending edits when the vehicle or its editable fields
    /// changed, and ends Loading once the switch target shows up.
    pub fn observe(&mut self, status: &VehicleStatus) {
        if self.selected.observe(&status.id) {
            self.logger = self.logger.for_vehicle(&status.id);
            self.logger
                .debug(&format!("Now showing vehicle {}", status.id));
        }
        self.switcher.observe_selected(&status.id);

        let pending = &mut self.pending;
        let logger = &self.logger;
        self.resync_source.observe_with(&resync_key(status), |_| {
            pending.resync(status);
            logger.debug(&format!(
                "Resynced pending edits for vehicle {}: {:?}",
                status.id, pending
            ));
        });
    }

    /// Resolve the controls for `status` and build the view
    pub fn render(&mut self, status: &VehicleStatus, vehicles: &[VehicleSummary]) -> PanelView {
        self.observe(status);

        let header = header(status, vehicles);
        let body = match self.switcher.state() {
            LoadingState::Loading { .. } => PanelBody::Loading,
            LoadingState::Failed { message, .. } => PanelBody::Failed {
                message: message.clone(),
                retry_label: labels::RETRY.to_string(),
            },
            LoadingState::Idle => PanelBody::Controls(self.controls(status, vehicles)),
        };
        PanelView { header, body }
    }

    fn controls(&self, status: &VehicleStatus, vehicles: &[VehicleSummary]) -> ControlsView {
        let resolved = properties::resolve(&self.descriptors, status, &self.pending);
        let (stats, skipped): (Vec<_>, Vec<_>) =
            resolved.stats.into_iter().partition(ResolvedControl::is_rendered);
        if !skipped.is_empty() {
            let names: Vec<&str> = skipped.iter().map(ResolvedControl::name).collect();
            self.logger
                .trace(&format!("Not rendering unsupported properties: {}", names.join(", ")));
        }

        ControlsView {
            vin: if resolved.show_vin {
                status.vin.clone()
            } else {
                None
            },
            lock_unlock: resolved.show_lock_unlock,
            charge_toggle: resolved.charge_toggle,
            stats,
            disconnect_all: vehicles.len() > 1,
        }
    }

    /// Handle a UI event against the status currently shown.
    ///
    /// Property updates and disconnects go to `host` right away, but only
    /// while the controls are on screen: during Loading or after a failed
    /// switch they are dropped. Selecting another vehicle or retrying
    /// returns a ticket; fetch the target and hand the result to
    /// [`VehiclePanel::complete_switch`].
    pub fn handle_event<H: PanelHost + ?Sized>(
        &mut self,
        event: PanelEvent,
        status: &VehicleStatus,
        vehicles: &[VehicleSummary],
        host: &mut H,
    ) -> Result<Option<SwitchTicket>> {
        match event {
            PanelEvent::EditSetting {
                target_property,
                value,
            } => {
                self.pending.set(&target_property, value)?;
                Ok(None)
            }
            PanelEvent::SelectVehicle(id) => Ok(self.switcher.begin(&id, &status.id)),
            PanelEvent::RetrySwitch => Ok(self.switcher.retry()),
            PanelEvent::DismissError => {
                self.switcher.dismiss();
                Ok(None)
            }
            other if *self.switcher.state() != LoadingState::Idle => {
                self.logger
                    .debug(&format!("Ignoring {:?}: controls not shown while switching", other));
                Ok(None)
            }
            other => {
                let visible = properties::resolve(&self.descriptors, status, &self.pending);
                match translate(&other, &visible, vehicles.len()) {
                    Some(action) => {
                        self.logger
                            .debug(&format!("Dispatching {:?} for vehicle {}", action, status.id));
                        action.apply(host);
                    }
                    None => self
                        .logger
                        .debug(&format!("Ignoring {:?}: control not shown", other)),
                }
                Ok(None)
            }
        }
    }

    /// Start a switch to `target`; `None` when it is already selected
    pub fn begin_switch(&mut self, target: &str, current: &VehicleStatus) -> Option<SwitchTicket> {
        self.switcher.begin(target, &current.id)
    }

    /// Settle a fetch; accepted data is handed to the host as the new selection
    pub fn complete_switch<H: PanelHost + ?Sized>(
        &mut self,
        ticket: &SwitchTicket,
        result: Result<VehicleStatus>,
        host: &mut H,
    ) -> SwitchOutcome {
        let outcome = self.switcher.complete(ticket, result);
        if let SwitchOutcome::Accepted(status) = &outcome {
            host.set_selected_vehicle(status.clone());
        }
        outcome
    }

    /// Fetch the ticket's target through `api` and settle it
    pub async fn run_switch<A, H>(
        &mut self,
        ticket: &SwitchTicket,
        api: &A,
        host: &mut H,
    ) -> SwitchOutcome
    where
        A: VehicleApi + ?Sized,
        H: PanelHost + ?Sized,
    {
        let result = api.get_vehicle(ticket.target()).await;
        self.complete_switch(ticket, result, host)
    }

    /// Select `target`: enter Loading, fetch it, replace the host's selection
    pub async fn select_vehicle<A, H>(
        &mut self,
        target: &str,
        current: &VehicleStatus,
        api: &A,
        host: &mut H,
    ) -> Option<SwitchOutcome>
    where
        A: VehicleApi + ?Sized,
        H: PanelHost + ?Sized,
    {
        let ticket = self.begin_switch(target, current)?;
        Some(self.run_switch(&ticket, api, host).await)
    }
}

fn header(status: &VehicleStatus, vehicles: &[VehicleSummary]) -> PanelHeader {
    if vehicles.len() > 1 {
        return PanelHeader::Switcher {
            options: vehicles
                .iter()
                .map(|v| SwitcherOption {
                    id: v.id.clone(),
                    label: v.label(),
                })
                .collect(),
            selected: status.id.clone(),
        };
    }
    let text = vehicles
        .iter()
        .find(|v| v.id == status.id)
        .map(VehicleSummary::label)
        .unwrap_or_else(|| status.summary().label());
    PanelHeader::Title { text }
}
