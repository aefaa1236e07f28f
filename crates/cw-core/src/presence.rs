//! Per-person presence state machine.
//!
//! A person is `Visible` while recognized and `Invisible` otherwise. Time
//! spent visible accumulates into `visible_total`. Each absence streak
//! earns at most [`MISSING_TOLERANCE_SECS`](crate::MISSING_TOLERANCE_SECS)
//! of `grace_total`; the budget re-arms in full whenever the person
//! returns. Records are never evicted — recovery is possible after any
//! absence, however long.
//!
//! Invariant, checked by tests: at every observation instant,
//! `visible_total + grace_total <= now - first_seen`.

use std::collections::{BTreeMap, HashSet};

use crate::constants::MISSING_TOLERANCE_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceState {
    Visible,
    Invisible,
}

/// Tracking state for one person, all times in f64 seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceRecord {
    pub first_seen: f64,
    pub state: PresenceState,
    pub state_since: f64,
    pub visible_total: f64,
    pub grace_total: f64,
    /// Grace consumed by the current absence streak. Reset to zero on
    /// every transition into `Visible`.
    pub grace_used_in_streak: f64,
}

impl PresenceRecord {
    fn new(now: f64) -> Self {
        Self {
            first_seen: now,
            state: PresenceState::Visible,
            state_since: now,
            visible_total: 0.0,
            grace_total: 0.0,
            grace_used_in_streak: 0.0,
        }
    }

    /// Grant grace for `elapsed` seconds of the current absence streak,
    /// bounded by what remains of the streak budget.
    pub(crate) fn accrue_grace(&mut self, elapsed: f64, tolerance: f64) {
        let remaining = (tolerance - self.grace_used_in_streak).max(0.0);
        self.grace_total += elapsed.min(remaining);
        self.grace_used_in_streak += elapsed;
    }
}

/// One tracking session: an explicit owner of the id → record mapping.
///
/// Created empty at session start, driven once per frame by
/// [`observe`](Session::observe), and closed out exactly once by
/// [`summarize`](Session::summarize).
#[derive(Debug, Clone)]
pub struct Session {
    pub started_at: f64,
    pub tolerance: f64,
    records: BTreeMap<String, PresenceRecord>,
}

impl Session {
    pub fn new(started_at: f64, tolerance: f64) -> Self {
        Self {
            started_at,
            tolerance,
            records: BTreeMap::new(),
        }
    }

    pub fn with_default_tolerance(started_at: f64) -> Self {
        Self::new(started_at, MISSING_TOLERANCE_SECS)
    }

    pub fn records(&self) -> &BTreeMap<String, PresenceRecord> {
        &self.records
    }

    pub fn tracked_count(&self) -> usize {
        self.records.len()
    }

    /// Advance every tracked record to `now` given the ids recognized in
    /// this frame, then start tracking any newly recognized ids.
    ///
    /// `now` must be non-decreasing across calls; negative slices are
    /// clamped to zero so a misbehaving clock cannot corrupt totals.
    pub fn observe(&mut self, recognized: &HashSet<String>, now: f64) {
        let tolerance = self.tolerance;

        for (id, rec) in self.records.iter_mut() {
            let seen = recognized.contains(id);
            let elapsed = (now - rec.state_since).max(0.0);

            match (rec.state, seen) {
                (PresenceState::Visible, true) => {
                    rec.visible_total += elapsed;
                    rec.state_since = now;
                }
                (PresenceState::Visible, false) => {
                    rec.visible_total += elapsed;
                    rec.state = PresenceState::Invisible;
                    rec.grace_used_in_streak = 0.0;
                    rec.state_since = now;
                }
                (PresenceState::Invisible, false) => {
                    rec.accrue_grace(elapsed, tolerance);
                    rec.state_since = now;
                }
                (PresenceState::Invisible, true) => {
                    // Close the absence slice before flipping back.
                    rec.accrue_grace(elapsed, tolerance);
                    rec.state = PresenceState::Visible;
                    rec.grace_used_in_streak = 0.0;
                    rec.state_since = now;
                }
            }
        }

        for id in recognized {
            self.records
                .entry(id.clone())
                .or_insert_with(|| PresenceRecord::new(now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn ids(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_first_recognition_creates_visible_record() {
        let mut session = Session::with_default_tolerance(0.0);
        session.observe(&ids(&["x"]), 5.0);

        let rec = &session.records()["x"];
        assert_eq!(rec.state, PresenceState::Visible);
        assert_eq!(rec.first_seen, 5.0);
        assert_eq!(rec.state_since, 5.0);
        assert_eq!(rec.visible_total, 0.0);
        assert_eq!(rec.grace_total, 0.0);
    }

    #[test]
    fn test_unrecognized_id_is_never_tracked() {
        let mut session = Session::with_default_tolerance(0.0);
        session.observe(&ids(&[]), 1.0);
        session.observe(&ids(&[]), 2.0);
        assert_eq!(session.tracked_count(), 0);
    }

    #[test]
    fn test_visible_time_accumulates() {
        let mut session = Session::with_default_tolerance(0.0);
        session.observe(&ids(&["x"]), 0.0);
        session.observe(&ids(&["x"]), 4.0);
        session.observe(&ids(&["x"]), 10.0);

        assert_relative_eq!(session.records()["x"].visible_total, 10.0);
    }

    #[test]
    fn test_disappearance_flushes_visible_slice() {
        let mut session = Session::with_default_tolerance(0.0);
        session.observe(&ids(&["x"]), 0.0);
        session.observe(&ids(&[]), 7.0);

        let rec = &session.records()["x"];
        assert_eq!(rec.state, PresenceState::Invisible);
        assert_relative_eq!(rec.visible_total, 7.0);
        assert_eq!(rec.grace_used_in_streak, 0.0);
        assert_eq!(rec.state_since, 7.0);
    }

    #[test]
    fn test_grace_capped_within_one_streak() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["x"]), 0.0);
        session.observe(&ids(&[]), 10.0); // visible 10s, then gone
        session.observe(&ids(&[]), 30.0); // 20s absent -> 20s grace
        session.observe(&ids(&[]), 50.0); // 20s more -> only 10s left
        session.observe(&ids(&[]), 90.0); // budget exhausted, nothing more

        let rec = &session.records()["x"];
        assert_relative_eq!(rec.grace_total, 30.0);
        assert_relative_eq!(rec.grace_used_in_streak, 80.0);
    }

    #[test]
    fn test_return_accrues_final_slice_then_flips() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["x"]), 0.0);
        session.observe(&ids(&[]), 10.0);
        session.observe(&ids(&["x"]), 15.0); // 5s absence closed on return

        let rec = &session.records()["x"];
        assert_eq!(rec.state, PresenceState::Visible);
        assert_relative_eq!(rec.grace_total, 5.0);
        assert_eq!(rec.grace_used_in_streak, 0.0);
    }

    #[test]
    fn test_grace_budget_rearms_per_streak() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["x"]), 0.0);
        // First streak: 40s absent, 30s granted.
        session.observe(&ids(&[]), 10.0);
        session.observe(&ids(&["x"]), 50.0);
        // Second streak: another 40s absent, a fresh 30s granted.
        session.observe(&ids(&[]), 60.0);
        session.observe(&ids(&["x"]), 100.0);

        assert_relative_eq!(session.records()["x"].grace_total, 60.0);
    }

    #[test]
    fn test_recovery_possible_after_long_absence() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["x"]), 0.0);
        session.observe(&ids(&[]), 10.0);
        session.observe(&ids(&[]), 500.0); // far past the budget
        session.observe(&ids(&["x"]), 510.0);
        session.observe(&ids(&["x"]), 520.0);

        let rec = &session.records()["x"];
        assert_eq!(rec.state, PresenceState::Visible);
        assert_relative_eq!(rec.visible_total, 20.0);
    }

    #[test]
    fn test_repeated_timestamp_is_harmless() {
        let mut session = Session::with_default_tolerance(0.0);
        session.observe(&ids(&["x"]), 3.0);
        session.observe(&ids(&["x"]), 3.0);
        assert_relative_eq!(session.records()["x"].visible_total, 0.0);
    }

    #[test]
    fn test_independent_records_per_person() {
        let mut session = Session::new(0.0, 30.0);
        session.observe(&ids(&["a", "b"]), 0.0);
        session.observe(&ids(&["a"]), 10.0);
        session.observe(&ids(&["a"]), 20.0);

        assert_relative_eq!(session.records()["a"].visible_total, 20.0);
        assert_relative_eq!(session.records()["b"].visible_total, 10.0);
        assert_eq!(session.records()["b"].state, PresenceState::Invisible);
    }

    proptest! {
        /// No record may ever account for more time than has elapsed since
        /// it was first seen, regardless of the recognition schedule.
        #[test]
        fn prop_totals_never_exceed_elapsed(
            steps in proptest::collection::vec((0.0f64..20.0, any::<bool>()), 1..60)
        ) {
            let mut session = Session::new(0.0, 30.0);
            let mut now = 0.0;
            session.observe(&ids(&["x"]), now);

            for (dt, seen) in steps {
                now += dt;
                let frame = if seen { ids(&["x"]) } else { ids(&[]) };
                session.observe(&frame, now);

                let rec = &session.records()["x"];
                let accounted = rec.visible_total + rec.grace_total;
                prop_assert!(
                    accounted <= (now - rec.first_seen) + 1e-6,
                    "accounted {accounted} > elapsed {}",
                    now - rec.first_seen
                );
            }
        }
    }
}
