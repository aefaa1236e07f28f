/// Dimension of a face embedding vector.
pub const EMBEDDING_DIM: usize = 128;

/// Default Euclidean distance threshold for identity matching.
/// Distances at or above this are reported as unknown.
pub const MATCH_THRESHOLD: f32 = 0.55;

/// Grace allowance per absence streak (seconds). Re-armed to the full
/// budget at the start of every new streak.
pub const MISSING_TOLERANCE_SECS: f64 = 30.0;

/// Minimum interval between live stats publications (seconds).
pub const STATS_PUBLISH_INTERVAL_SECS: f64 = 0.5;
