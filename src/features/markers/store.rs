//! Marker persistence
//!
//! The marker file is a JSON array of strings. A missing file is created
//! empty on first load. Saves go through a temporary file in the same
//! directory that is renamed over the target, so an interrupted write leaves
//! the previous array intact.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Atomic replace on save
//! - 1.0.0: Initial JSON file store

use log::{debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::marker::{MarkerSet, ReminderMarker};
use crate::core::error::{RelayError, RelayResult};

/// Backing storage for the marker set
pub trait MarkerStore: Send + Sync {
    /// Read the persisted set. A store that does not exist yet yields an empty set.
    fn load(&self) -> RelayResult<MarkerSet>;

    /// Replace the persisted set with `markers`
    fn save(&self, markers: &MarkerSet) -> RelayResult<()>;

    /// Forget every marker so all reminders fire again
    fn reset(&self) -> RelayResult<()> {
        self.save(&MarkerSet::new())
    }
}

/// Marker set stored as a JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonMarkerFile {
    path: PathBuf,
}

impl JsonMarkerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn write_atomically(&self, markers: &MarkerSet) -> std::io::Result<()> {
        let dir = self.parent_dir();
        std::fs::create_dir_all(dir)?;

        let entries: Vec<&str> = markers.all().map(|m| m.as_str()).collect();
        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, &entries)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl MarkerStore for JsonMarkerFile {
    fn load(&self) -> RelayResult<MarkerSet> {
        if !self.path.exists() {
            // Seed the file so operators can see where markers live
            match self.write_atomically(&MarkerSet::new()) {
                Ok(()) => info!("Created empty marker file at {}", self.path.display()),
                Err(e) => warn!(
                    "Failed to create marker file at {}: {}",
                    self.path.display(),
                    e
                ),
            }
            return Ok(MarkerSet::new());
        }

        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            RelayError::persistence(format!("failed to read {}: {e}", self.path.display()))
        })?;
        let entries: Vec<String> = serde_json::from_str(&contents).map_err(|e| {
            RelayError::persistence(format!("{} is not a JSON string array: {e}", self.path.display()))
        })?;

        let markers: MarkerSet = entries.into_iter().map(ReminderMarker::from).collect();
        debug!("Loaded {} markers from {}", markers.len(), self.path.display());
        Ok(markers)
    }

    fn save(&self, markers: &MarkerSet) -> RelayResult<()> {
        self.write_atomically(markers).map_err(|e| {
            RelayError::persistence(format!("failed to write {}: {e}", self.path.display()))
        })?;
        debug!("Saved {} markers to {}", markers.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory store for driver tests
    #[derive(Default)]
    pub(crate) struct MemoryMarkerStore {
        pub(crate) markers: Mutex<MarkerSet>,
        pub(crate) fail_load: AtomicBool,
        pub(crate) saves: Mutex<usize>,
    }

    impl MarkerStore for MemoryMarkerStore {
        fn load(&self) -> RelayResult<MarkerSet> {
            if self.fail_load.load(Ordering::SeqCst) {
                return Err(RelayError::persistence("simulated load failure"));
            }
            Ok(self.markers.lock().unwrap().clone())
        }

        fn save(&self, markers: &MarkerSet) -> RelayResult<()> {
            *self.markers.lock().unwrap() = markers.clone();
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }
}
