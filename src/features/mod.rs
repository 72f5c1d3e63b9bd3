//! # Features
//!
//! - `calendar`: upcoming events from Google Calendar
//! - `markers`: which reminders have already gone out
//! - `policy`: reminder windows and eligibility
//! - `roles`: role mentions parsed from event descriptions
//! - `notifier`: reminder text and Discord delivery
//! - `scheduler`: cron cadence and the tick driver

pub mod calendar;
pub mod markers;
pub mod notifier;
pub mod policy;
pub mod roles;
pub mod scheduler;
