//! End-of-session aggregation.
//!
//! Closes each record's open state slice at a given finalize time without
//! touching the live session, so a mid-session read and the terminal
//! finalize use the same arithmetic.

use std::collections::BTreeMap;

use crate::presence::{PresenceState, Session};

/// Final attention figures for one person.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionSummary {
    /// Attention ratio as a whole percent, truncated toward zero and
    /// clamped to 0..=100. The persisted percent truncates; only the live
    /// stats document rounds.
    pub percent: u8,
    pub attention_seconds: f64,
    pub visible_seconds: f64,
    pub grace_seconds: f64,
}

impl Session {
    /// Aggregate every tracked record as of `finalize_time`.
    ///
    /// Non-mutating: works on copies of the records, so it can serve both
    /// a live read and the single terminal finalize.
    pub fn summarize(&self, finalize_time: f64) -> BTreeMap<String, AttentionSummary> {
        self.records()
            .iter()
            .map(|(id, rec)| {
                let mut rec = rec.clone();
                let elapsed_slice = (finalize_time - rec.state_since).max(0.0);
                match rec.state {
                    PresenceState::Visible => rec.visible_total += elapsed_slice,
                    PresenceState::Invisible => rec.accrue_grace(elapsed_slice, self.tolerance),
                }

                let attention_seconds = rec.visible_total + rec.grace_total;
                let elapsed = (finalize_time - rec.first_seen).max(0.0);
                let ratio = if elapsed > 0.0 {
                    attention_seconds / elapsed
                } else {
                    0.0
                };
                // `as u8` truncates toward zero after the clamp.
                let percent = (ratio * 100.0).clamp(0.0, 100.0) as u8;

                (
                    id.clone(),
                    AttentionSummary {
                        percent,
                        attention_seconds,
                        visible_seconds: rec.visible_total,
                        grace_seconds: rec.grace_total,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    fn ids(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Visible 10s, invisible 10s (under the budget), visible 10s.
    #[test]
    fn test_short_absence_counts_fully() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["x"]), 0.0);
        session.observe(&ids(&[]), 10.0);
        session.observe(&ids(&["x"]), 20.0);

        let summary = &session.summarize(30.0)["x"];
        assert_relative_eq!(summary.visible_seconds, 20.0);
        assert_relative_eq!(summary.grace_seconds, 10.0);
        assert_relative_eq!(summary.attention_seconds, 30.0);
        assert_eq!(summary.percent, 100);
    }

    /// Visible 5s, then gone for good. The 40s absence caps at 30s grace,
    /// and 35/45 truncates to 77.
    #[test]
    fn test_long_absence_caps_grace() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["x"]), 0.0);
        session.observe(&ids(&[]), 5.0);

        let summary = &session.summarize(45.0)["x"];
        assert_relative_eq!(summary.visible_seconds, 5.0);
        assert_relative_eq!(summary.grace_seconds, 30.0);
        assert_relative_eq!(summary.attention_seconds, 35.0);
        assert_eq!(summary.percent, 77);
    }

    #[test]
    fn test_percent_truncates_not_rounds() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["x"]), 0.0);
        session.observe(&ids(&[]), 1.0);
        session.observe(&ids(&["x"]), 31.5);
        session.observe(&ids(&[]), 31.5);

        // visible 1s + grace 30.5s... grace capped at 30 -> 31/31.5 = 98.41
        let summary = &session.summarize(31.5)["x"];
        assert_eq!(summary.percent, 98);
    }

    #[test]
    fn test_open_absence_slice_respects_streak_budget() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["x"]), 0.0);
        session.observe(&ids(&[]), 10.0);
        session.observe(&ids(&[]), 35.0); // 25s of the budget spent

        // Open slice of 20s, but only 5s of budget left.
        let summary = &session.summarize(55.0)["x"];
        assert_relative_eq!(summary.grace_seconds, 30.0);
    }

    #[test]
    fn test_zero_elapsed_is_zero_percent() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["x"]), 12.0);

        let summary = &session.summarize(12.0)["x"];
        assert_eq!(summary.percent, 0);
        assert_relative_eq!(summary.attention_seconds, 0.0);
    }

    #[test]
    fn test_summarize_does_not_mutate_session() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["x"]), 0.0);
        session.observe(&ids(&[]), 10.0);

        let before = session.records().clone();
        let first = session.summarize(40.0);
        let second = session.summarize(40.0);

        assert_eq!(first, second);
        assert_eq!(session.records(), &before);
    }

    #[test]
    fn test_summary_covers_every_tracked_person() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["a", "b", "c"]), 0.0);
        session.observe(&ids(&["a"]), 10.0);

        let summaries = session.summarize(20.0);
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries["a"].percent, 100);
    }
}
