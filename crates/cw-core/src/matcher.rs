//! Nearest-neighbor identity matching against the enrolled roster.
//!
//! Linear scan — rosters are tens to low hundreds of entries, so the scan
//! is cheaper than maintaining an index. Ties break toward the earliest
//! roster position.

use crate::embedding::Embedding;

/// One enrolled person: stable id, human-readable name, reference embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub id: String,
    pub display_name: String,
    pub embedding: Embedding,
}

/// Outcome of matching a query embedding against the roster.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome<'a> {
    /// Best distance fell under the threshold.
    Known {
        entry: &'a RosterEntry,
        distance: f32,
    },
    /// No entry under the threshold. `distance` is the best distance seen,
    /// infinite for an empty roster.
    Unknown { distance: f32 },
}

impl MatchOutcome<'_> {
    pub fn known_id(&self) -> Option<&str> {
        match self {
            MatchOutcome::Known { entry, .. } => Some(&entry.id),
            MatchOutcome::Unknown { .. } => None,
        }
    }
}

/// Find the roster entry nearest to `query`, rejecting matches at or above
/// `threshold`. Pure — mutates nothing.
pub fn best_match<'a>(
    query: &Embedding,
    roster: &'a [RosterEntry],
    threshold: f32,
) -> MatchOutcome<'a> {
    let mut best: Option<&RosterEntry> = None;
    let mut best_dist = f32::INFINITY;

    for entry in roster {
        let d = query.distance(&entry.embedding);
        if d < best_dist {
            best_dist = d;
            best = Some(entry);
        }
    }

    match best {
        Some(entry) if best_dist.is_finite() && best_dist < threshold => MatchOutcome::Known {
            entry,
            distance: best_dist,
        },
        _ => MatchOutcome::Unknown {
            distance: best_dist,
        },
    }
}
