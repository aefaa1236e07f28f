//! Atomic cross-process stats channel.
//!
//! The producer writes the full JSON document to a fresh temporary file in
//! the target directory, then renames it over the published path in one
//! step. A reader polling the path either sees the previous complete
//! document or the new complete document, never a torn write.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use cw_core::StatsSnapshot;

use crate::error::{Result, StoreError};

/// Shared default: the producer and any viewer agree on this path unless
/// both are pointed elsewhere.
pub const DEFAULT_STATS_PATH: &str = "/tmp/attendance_stats.json";

/// Environment override for the stats document location.
pub const STATS_PATH_ENV: &str = "ATTENDANCE_STATS_PATH";

pub fn stats_path() -> PathBuf {
    std::env::var(STATS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATS_PATH))
}

/// Publish a snapshot with write-to-temporary-then-atomic-replace.
///
/// The temporary lives in the same directory as the target so the rename
/// stays on one filesystem.
pub fn publish(path: &Path, snapshot: &StatsSnapshot) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new_in(".")?,
    };

    serde_json::to_writer(tmp.as_file_mut(), snapshot)?;
    tmp.as_file_mut().flush()?;

    tmp.persist(path)
        .map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Read the latest committed snapshot. A missing or unparsable document is
/// "no data yet", never an error.
pub fn read(path: &Path) -> Option<StatsSnapshot> {
    let file = File::open(path).ok()?;
    serde_json::from_reader(file).ok()
}
