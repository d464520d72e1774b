//! # Vehicle panel
//!
//! Control and status component of a connected-vehicle dashboard. Given the
//! selected vehicle's live status and a declarative list of property
//! descriptors, it works out which read-only stats and controls to show,
//! keeps pending edits of settable properties in sync with the vehicle, and
//! forwards user intents to the host container.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration (logging, API endpoint, property descriptors)
//! - `logging`: Structured logging and tracing
//! - `vehicle`: Vehicle status model and the API collaborator trait
//! - `api`: HTTP implementation of the vehicle API (feature `http`)
//! - `properties`: Property descriptors and the visibility resolver
//! - `pending`: Change watcher and pending edits for settable properties
//! - `switcher`: Loading state for switching between connected vehicles
//! - `dispatch`: UI events to host callbacks
//! - `panel`: The component tying the above together

#[cfg(feature = "http")]
pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod panel;
pub mod pending;
pub mod properties;
pub mod switcher;
pub mod vehicle;

// Re-export commonly used types
pub use config::PanelConfig;
pub use dispatch::{DisconnectScope, PanelEvent, PanelHost};
pub use error::{PanelError, Result};
pub use panel::{PanelView, VehiclePanel};
pub use vehicle::{VehicleApi, VehicleStatus, VehicleSummary};
