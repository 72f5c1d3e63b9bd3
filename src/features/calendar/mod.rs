//! # Calendar Feature
//!
//! Upcoming-event model and the Google Calendar source.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod event;
pub mod source;

pub use event::{Event, EventStart};
pub use source::{sort_by_start, EventSource, GoogleCalendarSource};
