//! Vehicle data model and API collaborator
//!
//! `VehicleStatus` is the live snapshot handed to the panel on every render.
//! The panel never mutates it; changes flow through [`VehicleApi`] and come
//! back as a fresh snapshot.

use crate::error::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Charging state as reported by the vehicle
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChargeState {
    /// Actively drawing current
    Charging,
    /// Battery full; the charge toggle is hidden in this state
    FullyCharged,
    #[default]
    NotCharging,
    /// Any label the panel does not know about
    Other(String),
}

impl ChargeState {
    pub fn as_str(&self) -> &str {
        match self {
            ChargeState::Charging => "CHARGING",
            ChargeState::FullyCharged => "FULLY_CHARGED",
            ChargeState::NotCharging => "NOT_CHARGING",
            ChargeState::Other(label) => label,
        }
    }
}

impl From<String> for ChargeState {
    fn from(label: String) -> Self {
        match label.as_str() {
            "CHARGING" => ChargeState::Charging,
            "FULLY_CHARGED" => ChargeState::FullyCharged,
            "NOT_CHARGING" => ChargeState::NotCharging,
            _ => ChargeState::Other(label),
        }
    }
}

impl From<ChargeState> for String {
    fn from(state: ChargeState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ChargeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept vehicle ids sent as either JSON strings or numbers
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(id) => id,
        RawId::Number(id) => id.to_string(),
    })
}

/// Live snapshot of a connected vehicle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleStatus {
    /// Backend id; numeric ids are kept in their decimal form
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    #[serde(default)]
    pub vin: Option<String>,

    #[serde(default)]
    pub make: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub year: Option<u16>,

    #[serde(default)]
    pub charge_state: ChargeState,

    #[serde(default)]
    pub is_plugged_in: bool,

    /// Charging current in amperes (absent when unsupported or unplugged)
    #[serde(default)]
    pub amperage: Option<f64>,

    /// Charge limit as a fraction in `0.0..=1.0`
    #[serde(default)]
    pub charge_limit: Option<f64>,

    /// Any additional named properties (battery, odometer, location, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VehicleStatus {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Look a property up by its descriptor name.
    ///
    /// Known fields are addressed by their camelCase wire names; anything
    /// else is read from `extra`. Absent values yield `None`.
    pub fn property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::from(self.id.clone())),
            "vin" => self.vin.clone().map(Value::from),
            "make" => self.make.clone().map(Value::from),
            "model" => self.model.clone().map(Value::from),
            "year" => self.year.map(Value::from),
            "chargeState" => Some(Value::from(self.charge_state.as_str())),
            "isPluggedIn" => Some(Value::from(self.is_plugged_in)),
            "amperage" => self.amperage.map(Value::from),
            "chargeLimit" => self.charge_limit.map(Value::from),
            other => self.extra.get(other).filter(|v| !v.is_null()).cloned(),
        }
    }

    /// Summary used by the vehicle switcher
    pub fn summary(&self) -> VehicleSummary {
        VehicleSummary {
            id: self.id.clone(),
            make: self.make.clone().unwrap_or_default(),
            model: self.model.clone().unwrap_or_default(),
            year: self.year,
        }
    }
}

/// Lightweight entry of the connected-vehicle list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSummary {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub make: String,
    pub model: String,
    #[serde(default)]
    pub year: Option<u16>,
}

impl VehicleSummary {
    pub fn new(id: impl Into<String>, make: &str, model: &str, year: u16) -> Self {
        Self {
            id: id.into(),
            make: make.to_string(),
            model: model.to_string(),
            year: Some(year),
        }
    }

    /// Display label, e.g. `2020 Tesla Model 3`
    pub fn label(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(3);
        if let Some(year) = self.year {
            parts.push(year.to_string());
        }
        for part in [&self.make, &self.model] {
            if !part.is_empty() {
                parts.push(part.clone());
            }
        }
        parts.join(" ")
    }
}

/// External vehicle API collaborator
///
/// Failure handling (retries, backoff) is the implementation's business;
/// the panel only observes the `Result`.
#[async_trait::async_trait]
pub trait VehicleApi: Send + Sync {
    /// Fetch the live status of one vehicle
    async fn get_vehicle(&self, id: &str) -> Result<VehicleStatus>;

    /// Request a property change, e.g. `("chargeState", "START")`
    async fn update_property(&self, id: &str, name: &str, value: &str) -> Result<()>;

    /// Disconnect one vehicle, or every vehicle when `id` is `None`
    async fn disconnect(&self, id: Option<&str>) -> Result<()>;
}
