//! # Markers Feature
//!
//! Records which (event, offset) reminders have already been sent.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod marker;
pub mod store;

pub use marker::{MarkerSet, ReminderMarker, MARKER_SEPARATOR};
pub use store::{JsonMarkerFile, MarkerStore};
