//! Reminder driver
//!
//! One tick fetches upcoming events, reloads the marker file, evaluates each
//! event in start order, sends the due reminders and records the markers of
//! the ones that were delivered.
//!
//! Markers are written only after a successful send. A crash between the
//! send and the save can therefore repeat a reminder, but a reminder is never
//! recorded without having gone out.
//!
//! Ticks never overlap: the marker state sits behind a mutex that a tick
//! must `try_lock`, and a trigger that finds it held is skipped.
//!
//! - **Version**: 1.2.1
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.1: Never schedule the same cron slot twice
//! - 1.2.0: Concurrent delivery within a tick
//! - 1.1.0: Single-flight guard, destination check
//! - 1.0.0: Initial release

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use super::cadence::Cadence;
use crate::features::calendar::{sort_by_start, EventSource};
use crate::features::markers::{MarkerSet, MarkerStore, ReminderMarker};
use crate::features::notifier::Notifier;
use crate::features::policy::{ReminderEngine, Skip};
use crate::features::roles::RoleResolver;

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub fetched: usize,
    pub eligible: usize,
    pub delivered: usize,
    pub failed: usize,
    pub already_reminded: usize,
    pub outside_window: usize,
    pub anomalies: usize,
    /// The reminder channel could not be resolved, so nothing was evaluated
    pub destination_unavailable: bool,
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.destination_unavailable {
            return write!(f, "skipped (destination unavailable)");
        }
        write!(
            f,
            "{} fetched, {} due, {} delivered, {} failed, {} already reminded, {} outside window, {} anomalies",
            self.fetched,
            self.eligible,
            self.delivered,
            self.failed,
            self.already_reminded,
            self.outside_window,
            self.anomalies
        )
    }
}

pub struct ReminderDriver {
    source: Arc<dyn EventSource>,
    store: Arc<dyn MarkerStore>,
    engine: ReminderEngine,
    notifier: Notifier,
    roles: Arc<RoleResolver>,
    cadence: Cadence,
    max_results: usize,
    /// Last markers seen on disk; held for the whole tick
    markers: Mutex<MarkerSet>,
}

impl ReminderDriver {
    pub fn new(
        source: Arc<dyn EventSource>,
        store: Arc<dyn MarkerStore>,
        engine: ReminderEngine,
        notifier: Notifier,
        roles: Arc<RoleResolver>,
        cadence: Cadence,
        max_results: usize,
    ) -> Self {
        Self {
            source,
            store,
            engine,
            notifier,
            roles,
            cadence,
            max_results,
            markers: Mutex::new(MarkerSet::new()),
        }
    }

    /// Run one tick at `now`. Returns `None` if another tick is still running.
    pub async fn tick(&self, now: DateTime<Utc>) -> Option<TickReport> {
        let Ok(mut markers) = self.markers.try_lock() else {
            warn!("⏳ Previous reminder check still running, skipping this one");
            return None;
        };

        info!("Checking for upcoming events to send reminders...");
        let report = self.run_tick(now, &mut markers).await;
        info!("✅ Reminder check finished: {report}");
        Some(report)
    }

    async fn run_tick(&self, now: DateTime<Utc>, markers: &mut MarkerSet) -> TickReport {
        let mut report = TickReport::default();

        if let Err(e) = self.notifier.check_destination().await {
            error!("❌ Reminder channel unavailable, skipping this tick: {e}");
            report.destination_unavailable = true;
            return report;
        }

        let mut events = self.source.list_upcoming(self.max_results, now).await;
        sort_by_start(&mut events, self.engine.timezone());
        report.fetched = events.len();
        if events.is_empty() {
            info!("No upcoming events found");
        }

        match self.store.load() {
            Ok(loaded) => *markers = loaded,
            Err(e) => warn!(
                "⚠️ {e}; continuing with {} markers from the last run",
                markers.len()
            ),
        }

        // Markers already dispatched this tick, so a repeated event id is sent once
        let mut scheduled: HashSet<ReminderMarker> = HashSet::new();
        let mut deliveries = JoinSet::new();

        for event in &events {
            let decision = self.engine.evaluate(now, event, markers);
            match decision.skip {
                Some(Skip::MissingStart) => report.anomalies += 1,
                Some(Skip::OutsideWindow) => report.outside_window += 1,
                Some(Skip::AlreadyReminded) => report.already_reminded += 1,
                None => {}
            }
            let Some(marker) = decision.marker.filter(|_| decision.eligible) else {
                continue;
            };
            if !scheduled.insert(marker.clone()) {
                report.already_reminded += 1;
                continue;
            }

            report.eligible += 1;
            let role_id = self.roles.resolve(event.description.as_deref());
            let content = self.notifier.compose(event, role_id);
            let notifier = self.notifier.clone();
            deliveries.spawn(async move {
                let outcome = notifier.deliver(&content).await;
                (marker, outcome)
            });
        }

        let mut delivered = Vec::new();
        while let Some(joined) = deliveries.join_next().await {
            match joined {
                Ok((marker, Ok(()))) => delivered.push(marker),
                Ok((_, Err(_))) => report.failed += 1,
                Err(e) => {
                    error!("Reminder delivery task failed: {e}");
                    report.failed += 1;
                }
            }
        }

        report.delivered = delivered.len();
        if !delivered.is_empty() {
            markers.extend(delivered);
            match self.store.save(markers) {
                Ok(()) => info!("Reminded events saved successfully ({} total)", markers.len()),
                Err(e) => error!("❌ {e}; reminders sent this tick may be sent again"),
            }
        }

        report
    }

    /// The slot after `previous` and `now`, whichever is later. The sleep runs
    /// on a monotonic clock, so the wall clock can still read just before the
    /// slot that was slept for.
    fn upcoming_slot(
        &self,
        previous: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let after = previous.map_or(now, |slot| slot.max(now));
        self.cadence.next_after(after)
    }

    /// Tick on the cadence forever. Each tick runs on its own task so a slow
    /// one makes the next trigger skip instead of drifting the schedule.
    pub async fn run(self: Arc<Self>, run_immediately: bool) {
        info!(
            "⏰ Reminder scheduler started ({} in {}, policy: {})",
            self.cadence.expression(),
            self.cadence.timezone(),
            self.engine.policy()
        );

        if run_immediately {
            self.tick(Utc::now()).await;
        }

        let mut previous = None;
        loop {
            let now = Utc::now();
            let Some(next) = self.upcoming_slot(previous, now) else {
                error!(
                    "Schedule '{}' has no upcoming run times; reminder scheduler stopped",
                    self.cadence.expression()
                );
                return;
            };
            info!(
                "Next reminder check at {}",
                next.with_timezone(&self.cadence.timezone())
            );

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;
            previous = Some(next);

            let driver = Arc::clone(&self);
            tokio::spawn(async move {
                driver.tick(Utc::now()).await;
            });
        }
    }
}
