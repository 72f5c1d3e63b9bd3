//! # Reminder Scheduler Feature
//!
//! Cron cadence and the tick driver that ties calendar, policy, notifier
//! and marker store together.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod cadence;
pub mod driver;

pub use cadence::Cadence;
pub use driver::{ReminderDriver, TickReport};
