//! Reminder eligibility
//!
//! Decides, for one event at one instant, whether a reminder is due and
//! which marker records it. The engine holds no state of its own; the marker
//! set is passed in and never modified here.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Skip reasons on decisions
//! - 1.0.0: Initial release

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, warn};

use super::window::WindowPolicy;
use crate::core::error::RelayError;
use crate::features::calendar::Event;
use crate::features::markers::{MarkerSet, ReminderMarker};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Why an event did not get a reminder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    MissingStart,
    OutsideWindow,
    AlreadyReminded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub eligible: bool,
    pub days_until: Option<i64>,
    pub offset: Option<i64>,
    pub marker: Option<ReminderMarker>,
    pub skip: Option<Skip>,
}

impl Decision {
    fn skipped(skip: Skip, days_until: Option<i64>) -> Self {
        Decision {
            eligible: false,
            days_until,
            offset: None,
            marker: None,
            skip: Some(skip),
        }
    }
}

/// Whole days from `now` until `start`, rounded up.
///
/// 0 means the event starts within the next day (or is starting now);
/// negative values mean it has already started.
pub fn days_until(now: DateTime<Utc>, start: DateTime<Utc>) -> i64 {
    let millis = (start - now).num_milliseconds();
    let quotient = millis / MILLIS_PER_DAY;
    if millis % MILLIS_PER_DAY > 0 {
        quotient + 1
    } else {
        quotient
    }
}

#[derive(Debug, Clone)]
pub struct ReminderEngine {
    policy: WindowPolicy,
    timezone: Tz,
}

impl ReminderEngine {
    pub fn new(policy: WindowPolicy, timezone: Tz) -> Self {
        Self { policy, timezone }
    }

    pub fn policy(&self) -> &WindowPolicy {
        &self.policy
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn evaluate(&self, now: DateTime<Utc>, event: &Event, markers: &MarkerSet) -> Decision {
        let Some(start) = event.start_instant(self.timezone) else {
            let anomaly = RelayError::anomaly(&event.id, "event has neither a date nor a date-time start");
            warn!("⚠️ Skipping \"{}\": {}", event.title, anomaly);
            return Decision::skipped(Skip::MissingStart, None);
        };

        let days = days_until(now, start);
        let Some(offset) = self.policy.offset_for(days) else {
            debug!(
                "Event \"{}\" ({} days away) is not in a reminder window",
                event.title, days
            );
            return Decision::skipped(Skip::OutsideWindow, Some(days));
        };

        let marker = ReminderMarker::new(&event.id, offset);
        if markers.has(&marker) {
            debug!("Event \"{}\" already reminded ({})", event.title, marker);
            return Decision {
                eligible: false,
                days_until: Some(days),
                offset: Some(offset),
                marker: Some(marker),
                skip: Some(Skip::AlreadyReminded),
            };
        }

        Decision {
            eligible: true,
            days_until: Some(days),
            offset: Some(offset),
            marker: Some(marker),
            skip: None,
        }
    }
}
