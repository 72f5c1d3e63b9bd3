//! Reminder message formatting
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::features::calendar::{Event, EventStart};

/// Discord message content limit
pub const MESSAGE_LIMIT: usize = 2000;

/// Calendar date of the event's start in `tz`, as month/day/year
pub fn format_event_date(start: &EventStart, tz: Tz) -> String {
    let date: NaiveDate = match start {
        EventStart::AllDay(date) => *date,
        EventStart::At(at) => at.with_timezone(&tz).date_naive(),
    };
    date.format("%-m/%-d/%Y").to_string()
}

/// `Reminder: {title} is on {date}`, with a role mention in front when given
pub fn compose_reminder(event: &Event, tz: Tz, role_id: Option<u64>) -> String {
    let date = event
        .start
        .as_ref()
        .map(|s| format_event_date(s, tz))
        .unwrap_or_else(|| "an unknown date".to_string());

    let mut message = format!("Reminder: {} is on {}", event.title, date);
    if let Some(id) = role_id {
        message = format!("<@&{id}> {message}");
    }
    clip(message, MESSAGE_LIMIT)
}

/// Clip to `limit` characters, ending with an ellipsis when cut
fn clip(text: String, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text;
    }
    let mut clipped: String = text.chars().take(limit.saturating_sub(1)).collect();
    clipped.push('…');
    clipped
}
