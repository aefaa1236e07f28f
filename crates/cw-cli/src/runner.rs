//! The per-session orchestrator loop.
//!
//! Single sequential producer: frame in → recognize → presence update →
//! periodic stats publish, until the frame source ends or the cancellation
//! token fires. Whatever the exit path, the finalize block runs exactly
//! once: attention figures are persisted (errors swallowed so shutdown
//! always completes), the frame source is released, and a terminal
//! snapshot with `current = 0` is published so the viewer can detect
//! completion. A forced kill that bypasses the token loses the final
//! aggregation — accepted and documented, not prevented.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;

use cw_core::{
    MATCH_THRESHOLD, MISSING_TOLERANCE_SECS, STATS_PUBLISH_INTERVAL_SECS, Session, StatsSnapshot,
    now_secs, update_max,
};
use cw_store::{Store, stats};

use crate::pipeline::{parse_frame, recognize_frame};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tolerance: f64,
    pub threshold: f32,
    pub stats_path: PathBuf,
    pub publish_interval: f64,
}

impl SessionConfig {
    pub fn new(stats_path: PathBuf) -> Self {
        Self {
            tolerance: MISSING_TOLERANCE_SECS,
            threshold: MATCH_THRESHOLD,
            stats_path,
            publish_interval: STATS_PUBLISH_INTERVAL_SECS,
        }
    }
}

/// Drive one tracking session over a stream of frame events.
///
/// Only a failure to load the roster aborts entry — no session state
/// exists at that point. After the first frame, every exit goes through
/// the finalize block.
pub async fn run_session<R>(
    store: &Store,
    reader: R,
    config: &SessionConfig,
    cancel: CancellationToken,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let roster = store.load_roster().context("failed to load roster")?;
    if roster.is_empty() {
        tracing::warn!("roster is empty — every face will be unknown");
    }

    let mut session = Session::new(now_secs(), config.tolerance);
    let mut max_seen: u32 = 0;
    let mut last_publish = f64::NEG_INFINITY;
    // Finalize on the frame timeline, which may be scripted rather than
    // wall clock. Falls back to the wall clock if no frame ever arrived.
    let mut last_ts: Option<f64> = None;
    let mut marked: HashSet<String> = HashSet::new();
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("cancellation received, finalizing session");
                break;
            }
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("frame source ended, finalizing session");
                break;
            }
            Err(e) => {
                // Transient read failure: skip the frame, keep going.
                tracing::warn!("frame read failed: {e}");
                continue;
            }
        };

        let Some(event) = parse_frame(&line) else {
            continue;
        };

        let now = event.ts.unwrap_or_else(now_secs);
        last_ts = Some(last_ts.map_or(now, |t| t.max(now)));

        let current = event.faces.len() as u32;
        max_seen = update_max(max_seen, current);

        let recognized = recognize_frame(&event.faces, &roster, config.threshold);
        for id in &recognized {
            // Flag attendance once per person; the upsert is idempotent
            // anyway, and a mid-session store hiccup must not end the loop.
            if marked.insert(id.clone())
                && let Err(e) = store.mark_present(id)
            {
                tracing::warn!("failed to mark {id} present: {e}");
                marked.remove(id);
            }
        }

        session.observe(&recognized, now);

        if now - last_publish >= config.publish_interval {
            match stats::publish(&config.stats_path, &StatsSnapshot::new(current, max_seen)) {
                Ok(()) => last_publish = now,
                Err(e) => tracing::warn!("stats publish failed: {e}"),
            }
        }
    }

    // Finalize — reached from every break above, exactly once.
    let summaries = session.summarize(last_ts.unwrap_or_else(now_secs));
    for (id, summary) in &summaries {
        if let Err(e) = store.save_attention(id, summary.percent, summary.attention_seconds) {
            tracing::warn!("failed to persist attention for {id}: {e}");
        }
    }

    // Release the frame source before announcing completion.
    drop(lines);

    if let Err(e) = stats::publish(&config.stats_path, &StatsSnapshot::terminal(max_seen)) {
        tracing::warn!("terminal stats publish failed: {e}");
    }

    tracing::info!(
        "session finalized: {} tracked, peak {}",
        summaries.len(),
        max_seen
    );
    Ok(())
}
