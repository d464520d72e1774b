//! Vehicle-switch loading state
//!
//! Idle → Loading → Idle, with a Failed state when the fetch errors. Every
//! switch request gets a [`SwitchTicket`] carrying a generation number; a
//! completion whose ticket is not the current one is stale and discarded.
//! Loading ends when the panel observes the target vehicle's id in a
//! rendered status, not when the fetch resolves.

use crate::error::{PanelError, Result};
use crate::logging::StructuredLogger;
use crate::vehicle::VehicleStatus;
use chrono::{DateTime, Utc};

/// Token identifying one switch request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchTicket {
    generation: u64,
    target: String,
}

impl SwitchTicket {
    /// Vehicle id being switched to
    pub fn target(&self) -> &str {
        &self.target
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadingState {
    Idle,
    Loading {
        ticket: SwitchTicket,
        started_at: DateTime<Utc>,
    },
    Failed {
        target: String,
        message: String,
    },
}

/// What happened to a completed fetch
#[derive(Debug, Clone, PartialEq)]
pub enum SwitchOutcome {
    /// Fetched status should replace the selection
    Accepted(VehicleStatus),
    /// A newer request superseded this one; nothing was applied
    Stale,
    /// The fetch failed; the panel now shows the error
    Failed(String),
}

/// Loading state machine for the vehicle switcher
pub struct VehicleSwitcher {
    state: LoadingState,
    generation: u64,
    logger: StructuredLogger,
}

impl VehicleSwitcher {
    pub fn new(logger: StructuredLogger) -> Self {
        Self {
            state: LoadingState::Idle,
            generation: 0,
            logger,
        }
    }

    pub fn state(&self) -> &LoadingState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadingState::Loading { .. })
    }

    fn issue(&mut self, target: &str) -> SwitchTicket {
        self.generation += 1;
        let ticket = SwitchTicket {
            generation: self.generation,
            target: target.to_string(),
        };
        self.state = LoadingState::Loading {
            ticket: ticket.clone(),
            started_at: Utc::now(),
        };
        ticket
    }

    /// Enter Loading for `target`.
    ///
    /// Selecting the vehicle already shown returns `None`, cancels any
    /// in-flight switch and goes back to Idle.
    pub fn begin(&mut self, target: &str, current_id: &str) -> Option<SwitchTicket> {
        if target == current_id {
            if self.state != LoadingState::Idle {
                // Invalidate whatever is still in flight
                self.generation += 1;
                self.state = LoadingState::Idle;
                self.logger
                    .debug(&format!("Switch back to current vehicle {}, cancelled", target));
            }
            return None;
        }
        let ticket = self.issue(target);
        self.logger.info(&format!(
            "Switching to vehicle {} (generation {})",
            target, ticket.generation
        ));
        Some(ticket)
    }

    /// Re-issue the failed request, if any
    pub fn retry(&mut self) -> Option<SwitchTicket> {
        let LoadingState::Failed { target, .. } = &self.state else {
            return None;
        };
        let target = target.clone();
        let ticket = self.issue(&target);
        self.logger.info(&format!(
            "Retrying switch to vehicle {} (generation {})",
            target, ticket.generation
        ));
        Some(ticket)
    }

    /// Leave the Failed state without retrying
    pub fn dismiss(&mut self) {
        if matches!(self.state, LoadingState::Failed { .. }) {
            self.state = LoadingState::Idle;
        }
    }

    fn is_current(&self, ticket: &SwitchTicket) -> bool {
        matches!(&self.state, LoadingState::Loading { ticket: t, .. } if t == ticket)
    }

    /// Settle the fetch started for `ticket`
    pub fn complete(
        &mut self,
        ticket: &SwitchTicket,
        result: Result<VehicleStatus>,
    ) -> SwitchOutcome {
        if !self.is_current(ticket) {
            self.logger.debug(&format!(
                "Discarding stale fetch for vehicle {} (generation {}, current {})",
                ticket.target, ticket.generation, self.generation
            ));
            return SwitchOutcome::Stale;
        }

        let result = result.and_then(|status| {
            if status.id == ticket.target {
                Ok(status)
            } else {
                Err(PanelError::api(format!(
                    "requested vehicle {} but received {}",
                    ticket.target, status.id
                )))
            }
        });

        match result {
            Ok(status) => {
                self.logger
                    .debug(&format!("Fetched vehicle {}", ticket.target));
                SwitchOutcome::Accepted(status)
            }
            Err(e) => {
                let message = e.to_string();
                self.logger.warn(&format!(
                    "Failed to fetch vehicle {}: {}",
                    ticket.target, message
                ));
                self.state = LoadingState::Failed {
                    target: ticket.target.clone(),
                    message: message.clone(),
                };
                SwitchOutcome::Failed(message)
            }
        }
    }

    /// Note the id of the status being rendered; ends Loading once it is the target
    pub fn observe_selected(&mut self, id: &str) {
        let done = match &self.state {
            LoadingState::Loading { ticket, started_at } if ticket.target == id => {
                let elapsed = Utc::now().signed_duration_since(*started_at);
                self.logger.info(&format!(
                    "Vehicle {} selected after {} ms",
                    id,
                    elapsed.num_milliseconds()
                ));
                true
            }
            LoadingState::Failed { target, .. } => target == id,
            _ => false,
        };
        if done {
            self.state = LoadingState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::get_logger;

    fn switcher() -> VehicleSwitcher {
        VehicleSwitcher::new(get_logger("switcher-test"))
    }

    #[test]
    fn test_begin_enters_loading() {
        let mut s = switcher();
        let ticket = s.begin("2", "1").unwrap();
        assert_eq!(ticket.target(), "2");
        assert!(s.is_loading());
    }

    #[test]
    fn test_loading_ends_only_on_target_id() {
        let mut s = switcher();
        let ticket = s.begin("2", "1").unwrap();
        let outcome = s.complete(&ticket, Ok(VehicleStatus::new("2")));
        assert!(matches!(outcome, SwitchOutcome::Accepted(_)));
        assert!(s.is_loading());

        s.observe_selected("1");
        assert!(s.is_loading());
        s.observe_selected("2");
        assert_eq!(s.state(), &LoadingState::Idle);
    }

    #[test]
    fn test_superseded_ticket_is_stale() {
        let mut s = switcher();
        let first = s.begin("2", "1").unwrap();
        let second = s.begin("3", "1").unwrap();
        assert!(second.generation > first.generation);

        assert_eq!(s.complete(&first, Ok(VehicleStatus::new("2"))), SwitchOutcome::Stale);
        assert!(matches!(
            s.complete(&second, Ok(VehicleStatus::new("3"))),
            SwitchOutcome::Accepted(_)
        ));
    }

    #[test]
    fn test_selecting_current_vehicle_cancels() {
        let mut s = switcher();
        let ticket = s.begin("2", "1").unwrap();
        assert!(s.begin("1", "1").is_none());
        assert_eq!(s.state(), &LoadingState::Idle);
        assert_eq!(s.complete(&ticket, Ok(VehicleStatus::new("2"))), SwitchOutcome::Stale);
    }

    #[test]
    fn test_failure_then_retry_and_dismiss() {
        let mut s = switcher();
        let ticket = s.begin("2", "1").unwrap();
        let outcome = s.complete(&ticket, Err(PanelError::network("connection refused")));
        assert!(matches!(outcome, SwitchOutcome::Failed(ref m) if m.contains("connection refused")));
        assert!(matches!(s.state(), LoadingState::Failed { .. }));

        let retry = s.retry().unwrap();
        assert_eq!(retry.target(), "2");
        assert!(s.is_loading());

        s.complete(&retry, Err(PanelError::timeout("slow")));
        s.dismiss();
        assert_eq!(s.state(), &LoadingState::Idle);
        assert!(s.retry().is_none());
    }

    #[test]
    fn test_mismatched_vehicle_is_a_failure() {
        let mut s = switcher();
        let ticket = s.begin("2", "1").unwrap();
        let outcome = s.complete(&ticket, Ok(VehicleStatus::new("9")));
        assert!(matches!(outcome, SwitchOutcome::Failed(_)));
    }
}
