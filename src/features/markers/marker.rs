//! Reminder markers and the marker set
//!
//! A marker records that one (event, day offset) reminder has gone out.
//! The set only ever grows while the process runs; clearing it is an
//! out-of-band operation (`clear-cache`).
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Separator between event id and offset. Calendar event ids are base32hex
/// and never contain it.
pub const MARKER_SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderMarker(String);

impl ReminderMarker {
    pub fn new(event_id: &str, offset: i64) -> Self {
        ReminderMarker(format!("{event_id}{MARKER_SEPARATOR}{offset}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReminderMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Markers read back from disk are taken as-is, including ones written by
/// older builds that stored bare event ids.
impl From<String> for ReminderMarker {
    fn from(raw: String) -> Self {
        ReminderMarker(raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerSet {
    markers: BTreeSet<ReminderMarker>,
}

impl MarkerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, marker: &ReminderMarker) -> bool {
        self.markers.contains(marker)
    }

    /// Returns true if the marker was not present before
    pub fn add(&mut self, marker: ReminderMarker) -> bool {
        self.markers.insert(marker)
    }

    /// All markers in sorted order
    pub fn all(&self) -> impl Iterator<Item = &ReminderMarker> {
        self.markers.iter()
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl FromIterator<ReminderMarker> for MarkerSet {
    fn from_iter<I: IntoIterator<Item = ReminderMarker>>(iter: I) -> Self {
        MarkerSet {
            markers: iter.into_iter().collect(),
        }
    }
}

impl Extend<ReminderMarker> for MarkerSet {
    fn extend<I: IntoIterator<Item = ReminderMarker>>(&mut self, iter: I) {
        self.markers.extend(iter);
    }
}
