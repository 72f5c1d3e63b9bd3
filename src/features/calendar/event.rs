//! Calendar event model
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::{DateTime, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// When an event starts: a whole day, or a precise instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStart {
    AllDay(NaiveDate),
    At(DateTime<Utc>),
}

impl EventStart {
    /// Resolve to an instant. All-day events start at local midnight in `tz`.
    pub fn instant(&self, tz: Tz) -> DateTime<Utc> {
        match self {
            EventStart::At(at) => *at,
            EventStart::AllDay(date) => local_midnight(*date, tz),
        }
    }
}

fn local_midnight(date: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(at) => at.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Midnight skipped by a DST jump; the day starts at the first valid instant
        LocalResult::None => tz
            .from_utc_datetime(&midnight)
            .with_timezone(&Utc),
    }
}

/// One upcoming event, valid for a single polling cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub title: String,
    /// `None` when the provider sent neither a date nor a date-time
    pub start: Option<EventStart>,
    pub description: Option<String>,
}

impl Event {
    pub fn start_instant(&self, tz: Tz) -> Option<DateTime<Utc>> {
        self.start.map(|s| s.instant(tz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_all_day_is_local_midnight() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let start = EventStart::AllDay(date);

        assert_eq!(
            start.instant(Tz::UTC),
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        );
        // Taipei is UTC+8, so local midnight is 16:00 the previous day in UTC
        assert_eq!(
            start.instant(chrono_tz::Asia::Taipei),
            Utc.with_ymd_and_hms(2024, 3, 14, 16, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_timed_start_ignores_timezone() {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap();
        let start = EventStart::At(at);
        assert_eq!(start.instant(chrono_tz::America::New_York), at);
    }

    #[test]
    fn test_missing_start_has_no_instant() {
        let event = Event {
            id: "x".to_string(),
            title: "Broken".to_string(),
            start: None,
            description: None,
        };
        assert_eq!(event.start_instant(Tz::UTC), None);
    }
}
