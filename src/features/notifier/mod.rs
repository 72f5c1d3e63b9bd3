//! # Notifier Feature
//!
//! Reminder text and delivery to the reminder channel.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod delivery;
pub mod message;

pub use delivery::{ChatSink, DiscordSink, Notifier};
pub use message::{compose_reminder, format_event_date, MESSAGE_LIMIT};
