//! Frame event adapter between the external vision pipeline and the
//! session runner.
//!
//! Detection and embedding extraction happen upstream, in a separate
//! process. That process emits one JSON object per frame on our stdin
//! (or into a file replayed with `--input`):
//!
//! ```text
//! {"ts": 12.5, "faces": [[128 floats], [128 floats]]}
//! ```
//!
//! `faces` carries one already-extracted embedding per detected box;
//! boxes whose crop produced no encoding are omitted upstream. A missing
//! `ts` means "now". Timestamps are non-decreasing.

use std::collections::HashSet;

use serde::Deserialize;

use cw_core::{Embedding, MatchOutcome, RosterEntry, best_match};

/// One frame as reported by the upstream pipeline.
#[derive(Debug, Deserialize)]
pub struct FrameEvent {
    #[serde(default)]
    pub ts: Option<f64>,
    #[serde(default)]
    pub faces: Vec<Vec<f32>>,
}

/// Parse one input line. An unparsable line is a transient frame failure:
/// logged at debug, skipped, no state mutated.
pub fn parse_frame(line: &str) -> Option<FrameEvent> {
    if line.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!("skipping unparsable frame: {e}");
            None
        }
    }
}

/// Match every valid face vector of a frame against the roster and collect
/// the recognized ids. Vectors failing validation (wrong dimension,
/// non-finite) are rejected here, before any scoring.
pub fn recognize_frame(
    faces: &[Vec<f32>],
    roster: &[RosterEntry],
    threshold: f32,
) -> HashSet<String> {
    let mut recognized = HashSet::new();
    for face in faces {
        let query = match Embedding::new(face.clone()) {
            Ok(q) => q,
            Err(e) => {
                tracing::debug!("rejecting face vector: {e}");
                continue;
            }
        };
        if let MatchOutcome::Known { entry, distance } = best_match(&query, roster, threshold) {
            tracing::debug!("recognized {} at distance {distance:.3}", entry.id);
            recognized.insert(entry.id.clone());
        }
    }
    recognized
}
