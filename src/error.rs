//! Error types and handling for the vehicle panel
//!
//! This module defines the error types used throughout the crate,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for panel operations
pub type Result<T> = std::result::Result<T, PanelError>;

/// Main error type for the vehicle panel
#[derive(Debug, Error)]
pub enum PanelError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Vehicle API errors (rejected requests, unexpected payloads)
    #[error("API error: {message}")]
    Api { message: String },

    /// Network-related errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl PanelError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        PanelError::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        PanelError::Api {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        PanelError::Network {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        PanelError::Io {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        PanelError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        PanelError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        PanelError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for PanelError {
    fn from(err: std::io::Error) -> Self {
        PanelError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for PanelError {
    fn from(err: serde_yaml::Error) -> Self {
        PanelError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PanelError {
    fn from(err: serde_json::Error) -> Self {
        PanelError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for PanelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PanelError::timeout(err.to_string())
        } else if err.is_decode() {
            PanelError::Serialization {
                message: err.to_string(),
            }
        } else {
            PanelError::network(err.to_string())
        }
    }
}
