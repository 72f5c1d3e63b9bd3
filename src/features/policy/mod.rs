//! # Reminder Policy Feature
//!
//! Window policies and the eligibility engine that applies them.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod engine;
pub mod window;

pub use engine::{days_until, Decision, ReminderEngine, Skip};
pub use window::{PeriodicDecay, WindowPolicy, DEFAULT_OFFSETS};
