//! Error taxonomy for the relay
//!
//! Only `Configuration` is ever fatal, and only at startup. Every other
//! variant is logged and recovered from by the caller so the long-running
//! process stays alive until the next tick.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Malformed calendar event (for example, no start time)
    #[error("Data anomaly in event {event_id}: {reason}")]
    DataAnomaly { event_id: String, reason: String },

    /// Calendar fetch, chat delivery or destination lookup failed
    #[error("Provider error: {0}")]
    TransientProvider(String),

    /// Marker file could not be read or written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Missing or invalid startup setting
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RelayError {
    pub fn anomaly(event_id: impl Into<String>, reason: impl Into<String>) -> Self {
        RelayError::DataAnomaly {
            event_id: event_id.into(),
            reason: reason.into(),
        }
    }

    pub fn provider(message: impl std::fmt::Display) -> Self {
        RelayError::TransientProvider(message.to_string())
    }

    pub fn persistence(message: impl std::fmt::Display) -> Self {
        RelayError::Persistence(message.to_string())
    }

    /// Create a config error for a required setting that was not supplied
    pub fn missing(key: &str) -> Self {
        RelayError::Configuration(format!("{key} must be set in the config file or environment"))
    }

    /// Only configuration problems are allowed to stop the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, RelayError::Configuration(_))
    }
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;
