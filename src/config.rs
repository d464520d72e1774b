//! Configuration management for the vehicle panel
//!
//! Loads the YAML configuration: logging, the vehicle API endpoint, and the
//! ordered list of vehicle property descriptors the panel renders.

mod defaults;

pub use defaults::default_vehicle_properties;

use crate::error::{PanelError, Result};
use crate::properties::{ComponentKind, PropertyDescriptor};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "VEHICLE_PANEL_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PanelConfig {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Vehicle API endpoint
    pub api: ApiConfig,

    /// Properties the panel displays or controls, in render order
    pub vehicle_properties: Vec<PropertyDescriptor>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Console level override
    pub console_level: Option<String>,

    /// File level override
    pub file_level: Option<String>,

    /// Log file path or directory; no file logging when absent
    pub file: Option<String>,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to the console (stderr)
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Vehicle API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:8000/api`
    pub base_url: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Bearer token sent with every request
    pub access_token: Option<String>,
}

impl PanelConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: PanelConfig = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from `$VEHICLE_PANEL_CONFIG`, then the default locations, then defaults
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(path);
        }

        let default_paths = [
            "vehicle_panel.yaml",
            "/etc/vehicle-panel/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(PanelConfig::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// JSON schema of the configuration file
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(PanelConfig))
            .unwrap_or(serde_json::Value::Null)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        crate::logging::parse_log_level(&self.logging.level)?;

        if self.api.base_url.trim().is_empty() {
            return Err(PanelError::validation(
                "api.base_url",
                "Base URL cannot be empty",
            ));
        }

        if self.api.timeout_ms == 0 {
            return Err(PanelError::validation(
                "api.timeout_ms",
                "Must be greater than 0",
            ));
        }

        let mut seen = HashSet::new();
        for (i, descriptor) in self.vehicle_properties.iter().enumerate() {
            let field = format!("vehicle_properties[{}]", i);
            if descriptor.name.trim().is_empty() {
                return Err(PanelError::validation(field, "Name cannot be empty".to_string()));
            }
            if !seen.insert(descriptor.name.as_str()) {
                return Err(PanelError::validation(
                    field,
                    format!("Duplicate property name '{}'", descriptor.name),
                ));
            }
            if descriptor.component_type == Some(ComponentKind::Settable)
                && descriptor
                    .target_property
                    .as_deref()
                    .is_none_or(|t| t.trim().is_empty())
            {
                return Err(PanelError::validation(
                    field,
                    format!("Settable property '{}' needs a targetProperty", descriptor.name),
                ));
            }
        }

        Ok(())
    }
}
