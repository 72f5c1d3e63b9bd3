//! Reminder window policies
//!
//! A window policy maps "whole days until the event" to the offset bucket
//! that is due now, or `None` when no reminder is due. Policies only look at
//! the day count, so they are plain table lookups to test.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.0: Configurable periodic horizons and steps
//! - 1.1.0: Periodic decay windows
//! - 1.0.0: Fixed day offsets

use std::collections::BTreeSet;
use std::fmt;

use crate::core::error::{RelayError, RelayResult};

/// Offsets used when none are configured
pub const DEFAULT_OFFSETS: [i64; 4] = [7, 3, 1, 0];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Remind exactly on the configured day counts
    DiscreteOffsets(BTreeSet<i64>),
    /// Weekly reminders inside the weekly horizon, tightening to every
    /// `daily_step` days inside the daily horizon
    PeriodicDecay(PeriodicDecay),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicDecay {
    pub weekly_horizon: i64,
    pub weekly_step: i64,
    pub daily_horizon: i64,
    pub daily_step: i64,
}

impl Default for PeriodicDecay {
    fn default() -> Self {
        Self {
            weekly_horizon: 30,
            weekly_step: 7,
            daily_horizon: 14,
            daily_step: 2,
        }
    }
}

impl PeriodicDecay {
    fn matches(&self, days_until: i64) -> bool {
        if days_until < 0 {
            return false;
        }
        let weekly = days_until <= self.weekly_horizon
            && self.weekly_step > 0
            && days_until % self.weekly_step == 0;
        let daily = days_until <= self.daily_horizon
            && self.daily_step > 0
            && days_until % self.daily_step == 0;
        weekly || daily
    }

    /// Parse `"<weekly horizon>/<weekly step>,<daily horizon>/<daily step>"`,
    /// e.g. `30/7,14/2`
    pub fn parse(raw: &str) -> RelayResult<Self> {
        let invalid = |detail: String| {
            RelayError::Configuration(format!(
                "REMINDER_PERIODIC must look like '30/7,14/2' ({detail}), got '{raw}'"
            ))
        };

        let clauses: Vec<&str> = raw.split(',').map(str::trim).collect();
        let [weekly, daily] = clauses.as_slice() else {
            return Err(invalid("expected two horizon/step pairs".to_string()));
        };

        let pair = |clause: &str| -> RelayResult<(i64, i64)> {
            let (horizon, step) = clause
                .split_once('/')
                .ok_or_else(|| invalid(format!("'{clause}' has no '/'")))?;
            let horizon: i64 = horizon
                .trim()
                .parse()
                .map_err(|_| invalid(format!("horizon '{horizon}' is not an integer")))?;
            let step: i64 = step
                .trim()
                .parse()
                .map_err(|_| invalid(format!("step '{step}' is not an integer")))?;
            if horizon < 0 || step <= 0 {
                return Err(invalid(format!(
                    "'{clause}' needs a non-negative horizon and a positive step"
                )));
            }
            Ok((horizon, step))
        };

        let (weekly_horizon, weekly_step) = pair(*weekly)?;
        let (daily_horizon, daily_step) = pair(*daily)?;
        Ok(Self {
            weekly_horizon,
            weekly_step,
            daily_horizon,
            daily_step,
        })
    }
}

impl Default for WindowPolicy {
    fn default() -> Self {
        WindowPolicy::discrete(DEFAULT_OFFSETS)
    }
}

impl WindowPolicy {
    pub fn discrete(offsets: impl IntoIterator<Item = i64>) -> Self {
        WindowPolicy::DiscreteOffsets(offsets.into_iter().collect())
    }

    pub fn periodic() -> Self {
        WindowPolicy::PeriodicDecay(PeriodicDecay::default())
    }

    /// The offset bucket `days_until` falls into, if a reminder is due.
    ///
    /// Both policies tag the reminder with the day count itself, so two
    /// clauses matching the same day still produce a single offset.
    pub fn offset_for(&self, days_until: i64) -> Option<i64> {
        let due = match self {
            WindowPolicy::DiscreteOffsets(offsets) => offsets.contains(&days_until),
            WindowPolicy::PeriodicDecay(decay) => decay.matches(days_until),
        };
        due.then_some(days_until)
    }

    /// Build a policy from the `REMINDER_POLICY`, `REMINDER_OFFSETS` and
    /// `REMINDER_PERIODIC` settings. Each policy ignores the other's setting.
    pub fn from_settings(
        kind: &str,
        offsets: Option<&str>,
        periodic: Option<&str>,
    ) -> RelayResult<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "offsets" | "discrete" => match offsets {
                Some(raw) => Ok(WindowPolicy::DiscreteOffsets(parse_offsets(raw)?)),
                None => Ok(WindowPolicy::default()),
            },
            "periodic" | "decay" => match periodic {
                Some(raw) => Ok(WindowPolicy::PeriodicDecay(PeriodicDecay::parse(raw)?)),
                None => Ok(WindowPolicy::periodic()),
            },
            other => Err(RelayError::Configuration(format!(
                "REMINDER_POLICY must be 'offsets' or 'periodic', got '{other}'"
            ))),
        }
    }
}

fn parse_offsets(raw: &str) -> RelayResult<BTreeSet<i64>> {
    let mut offsets = BTreeSet::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let offset: i64 = part.parse().map_err(|_| {
            RelayError::Configuration(format!("REMINDER_OFFSETS contains a non-integer: '{part}'"))
        })?;
        if offset < 0 {
            return Err(RelayError::Configuration(format!(
                "REMINDER_OFFSETS must not be negative: {offset}"
            )));
        }
        offsets.insert(offset);
    }
    if offsets.is_empty() {
        return Err(RelayError::Configuration(
            "REMINDER_OFFSETS must list at least one day offset".to_string(),
        ));
    }
    Ok(offsets)
}

impl fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowPolicy::DiscreteOffsets(offsets) => {
                let list: Vec<String> = offsets.iter().rev().map(|o| o.to_string()).collect();
                write!(f, "offsets [{}]", list.join(", "))
            }
            WindowPolicy::PeriodicDecay(d) => write!(
                f,
                "periodic (every {}d within {}d, every {}d within {}d)",
                d.weekly_step, d.weekly_horizon, d.daily_step, d.daily_horizon
            ),
        }
    }
}
