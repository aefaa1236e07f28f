//! Live aggregate counters shared with the viewer process.
//!
//! Pure math only; the atomic file channel lives in the store crate.

use serde::{Deserialize, Serialize};

/// The published stats document: people detected in the latest frame, the
/// session peak, and the rounded ratio of the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub current: u32,
    pub max: u32,
    pub percent: u32,
}

impl StatsSnapshot {
    pub fn new(current: u32, max: u32) -> Self {
        Self {
            current,
            max,
            percent: compute_percent(current, max),
        }
    }

    /// Terminal snapshot published on session exit so the viewer can
    /// detect completion: nobody current, peak preserved.
    pub fn terminal(max: u32) -> Self {
        Self::new(0, max)
    }
}

/// Rounded percent of `current` against `max`; zero when there is no peak
/// yet. Note the asymmetry with the persisted attention percent, which
/// truncates.
pub fn compute_percent(current: u32, max: u32) -> u32 {
    if max > 0 {
        ((current as f64 / max as f64) * 100.0).round() as u32
    } else {
        0
    }
}

/// New session peak.
pub fn update_max(max_seen: u32, current: u32) -> u32 {
    max_seen.max(current)
}
