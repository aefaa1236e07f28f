//! Classwatch attention engine.
//!
//! Pure per-session logic for classroom attendance tracking: validated
//! face embeddings, nearest-neighbor identity matching against an enrolled
//! roster, a visible/invisible presence state machine with a bounded grace
//! allowance for brief disappearances, and end-of-session aggregation into
//! attention ratios.
//!
//! Zero I/O — no opinions about cameras, detectors, or persistence.

pub mod constants;
pub mod embedding;
pub mod matcher;
pub mod presence;
pub mod stats;
pub mod summary;
pub mod time;

pub use constants::{
    EMBEDDING_DIM, MATCH_THRESHOLD, MISSING_TOLERANCE_SECS, STATS_PUBLISH_INTERVAL_SECS,
};
pub use embedding::{Embedding, EmbeddingError};
pub use matcher::{MatchOutcome, RosterEntry, best_match};
pub use presence::{PresenceRecord, PresenceState, Session};
pub use stats::{StatsSnapshot, compute_percent, update_max};
pub use summary::AttentionSummary;
pub use time::now_secs;
