//! # Core Module
//!
//! Configuration and error taxonomy shared by every feature.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add RelayError taxonomy
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::Config;
pub use error::{RelayError, RelayResult};
