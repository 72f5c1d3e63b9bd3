//! Cron cadence in a fixed timezone
//!
//! Accepts classic 5-field expressions (`0 0 * * *`) as well as the
//! seconds-first 6/7-field form understood by the `cron` crate.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;

use crate::core::error::{RelayError, RelayResult};

#[derive(Debug, Clone)]
pub struct Cadence {
    expression: String,
    schedule: Schedule,
    timezone: Tz,
}

impl Cadence {
    pub fn parse(expression: &str, timezone: Tz) -> RelayResult<Self> {
        let expression = expression.trim();
        let normalized = if expression.split_whitespace().count() == 5 {
            format!("0 {expression}")
        } else {
            expression.to_string()
        };

        let schedule = Schedule::from_str(&normalized).map_err(|e| {
            RelayError::Configuration(format!("SCHEDULE '{expression}' is not a valid cron expression: {e}"))
        })?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
            timezone,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// First scheduled instant strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&now.with_timezone(&self.timezone))
            .next()
            .map(|at| at.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_five_field_daily_midnight() {
        let cadence = Cadence::parse("0 0 * * *", Tz::UTC).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 0).unwrap();

        assert_eq!(
            cadence.next_after(now),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap())
        );
        assert_eq!(cadence.expression(), "0 0 * * *");
    }

    #[test]
    fn test_midnight_in_configured_timezone() {
        let cadence = Cadence::parse("0 0 * * *", chrono_tz::Asia::Taipei).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 13, 45, 0).unwrap();

        // Taipei midnight on 5/2 is 16:00 UTC on 5/1
        assert_eq!(
            cadence.next_after(now),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 16, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_next_is_strictly_after_now() {
        let cadence = Cadence::parse("* * * * *", Tz::UTC).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(
            cadence.next_after(now),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 1, 0).unwrap())
        );
    }

    #[test]
    fn test_six_field_expression() {
        let cadence = Cadence::parse("30 0 9 * * *", Tz::UTC).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert_eq!(
            cadence.next_after(now),
            Some(Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 30).unwrap())
        );
    }

    #[test]
    fn test_invalid_expression() {
        let err = Cadence::parse("daily at noon", Tz::UTC).unwrap_err();
        assert!(err.is_fatal());
    }
}
