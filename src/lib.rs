// Core layer - configuration and error taxonomy
pub mod core;

// Features layer - calendar, markers, policy, roles, notifier, scheduler
pub mod features;

pub use core::{Config, RelayError, RelayResult};

pub use features::{
    // Calendar
    calendar::{Event, EventSource, EventStart, GoogleCalendarSource},
    // Markers
    markers::{JsonMarkerFile, MarkerSet, MarkerStore, ReminderMarker},
    // Notifier
    notifier::{ChatSink, DiscordSink, Notifier},
    // Policy
    policy::{Decision, ReminderEngine, WindowPolicy},
    // Roles
    roles::{RoleResolver, RosterSource},
    // Scheduler
    scheduler::{Cadence, ReminderDriver, TickReport},
};
