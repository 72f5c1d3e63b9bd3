//! Event sources
//!
//! The relay only needs one pull: "the next N events starting after T, in
//! start order". Provider failures never reach the driver as errors; they
//! are logged and the tick sees an empty calendar.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.0: Parse each calendar item on its own
//! - 1.1.0: Keep events without a start so the engine can flag them
//! - 1.0.0: Google Calendar v3 source with service account auth

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use chrono_tz::Tz;
use log::{debug, error, info, warn};
use reqwest::Url;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use yup_oauth2::authenticator::DefaultAuthenticator;

use super::event::{Event, EventStart};
use crate::core::error::{RelayError, RelayResult};

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait EventSource: Send + Sync {
    /// Up to `max_results` events starting at or after `since`, ascending by start.
    /// Returns an empty list if the provider cannot be reached.
    async fn list_upcoming(&self, max_results: usize, since: DateTime<Utc>) -> Vec<Event>;
}

/// Stable sort by start instant; events without a start go last
pub fn sort_by_start(events: &mut [Event], tz: Tz) {
    events.sort_by_key(|e| match e.start_instant(tz) {
        Some(at) => (0, at),
        None => (1, DateTime::<Utc>::MAX_UTC),
    });
}

// ============================================================================
// Google Calendar wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start: Option<RawEventStart>,
}

/// Kept as strings so one unparseable start only affects its own event
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEventStart {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    date_time: Option<String>,
}

impl RawEventStart {
    fn parse(&self, event_id: &str) -> Option<EventStart> {
        // An all-day date wins over a date-time if a provider ever sends both
        if let Some(raw) = self.date.as_deref() {
            return match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(EventStart::AllDay(date)),
                Err(e) => {
                    warn!("{}", RelayError::anomaly(event_id, format!("bad start date '{raw}': {e}")));
                    None
                }
            };
        }
        let raw = self.date_time.as_deref()?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => Some(EventStart::At(at.with_timezone(&Utc))),
            Err(e) => {
                warn!("{}", RelayError::anomaly(event_id, format!("bad start dateTime '{raw}': {e}")));
                None
            }
        }
    }
}

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        let start = raw.start.as_ref().and_then(|s| s.parse(&raw.id));

        Event {
            id: raw.id,
            title: raw
                .summary
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "(untitled event)".to_string()),
            start,
            description: raw.description,
        }
    }
}

fn parse_events(body: &str) -> RelayResult<Vec<Event>> {
    let response: EventsResponse = serde_json::from_str(body)
        .map_err(|e| RelayError::provider(format!("unexpected calendar response: {e}")))?;

    let events = response
        .items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value::<RawEvent>(item) {
            Ok(raw) => Some(Event::from(raw)),
            Err(e) => {
                warn!("{}", RelayError::anomaly(format!("#{index}"), format!("unreadable calendar item: {e}")));
                None
            }
        })
        .collect();
    Ok(events)
}

// ============================================================================
// Google Calendar source
// ============================================================================

/// Reads a single calendar with a service account key
pub struct GoogleCalendarSource {
    http: reqwest::Client,
    auth: DefaultAuthenticator,
    calendar_id: String,
    timezone: Tz,
}

impl GoogleCalendarSource {
    pub async fn new(credentials_path: &Path, calendar_id: String, timezone: Tz) -> Result<Self> {
        let key = yup_oauth2::read_service_account_key(credentials_path)
            .await
            .with_context(|| {
                format!("Failed to read service account key {}", credentials_path.display())
            })?;

        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .context("Failed to build service account authenticator")?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        info!("📅 Calendar source ready for {calendar_id}");
        Ok(Self {
            http,
            auth,
            calendar_id,
            timezone,
        })
    }

    fn events_url(&self) -> RelayResult<Url> {
        let mut url = Url::parse(CALENDAR_API_BASE).map_err(RelayError::provider)?;
        url.path_segments_mut()
            .map_err(|_| RelayError::provider("calendar API base cannot take a path"))?
            .extend(["calendars", self.calendar_id.as_str(), "events"]);
        Ok(url)
    }

    async fn fetch(&self, max_results: usize, since: DateTime<Utc>) -> RelayResult<Vec<Event>> {
        let token = self
            .auth
            .token(&[CALENDAR_SCOPE])
            .await
            .map_err(|e| RelayError::provider(format!("token request failed: {e}")))?;
        let bearer = token
            .token()
            .ok_or_else(|| RelayError::provider("token response had no access token"))?;

        let response = self
            .http
            .get(self.events_url()?)
            .bearer_auth(bearer)
            .query(&[
                ("timeMin", since.to_rfc3339_opts(SecondsFormat::Millis, true)),
                ("maxResults", max_results.to_string()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .map_err(RelayError::provider)?
            .error_for_status()
            .map_err(RelayError::provider)?;

        let body = response.text().await.map_err(RelayError::provider)?;
        parse_events(&body)
    }
}

#[async_trait]
impl EventSource for GoogleCalendarSource {
    async fn list_upcoming(&self, max_results: usize, since: DateTime<Utc>) -> Vec<Event> {
        debug!("Fetching up to {max_results} events since {since}");
        match self.fetch(max_results, since).await {
            Ok(mut events) => {
                sort_by_start(&mut events, self.timezone);
                info!("Fetched {} upcoming events", events.len());
                events
            }
            Err(e) => {
                error!("❌ Failed to fetch events from Google Calendar: {e}");
                vec![]
            }
        }
    }
}
