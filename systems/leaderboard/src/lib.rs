#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Leaderboard and best-ghost bookkeeping.
//!
//! Times are stored in the fixed-width `MM:SS.mmm` format produced by the
//! race timer, so string order is time order.

use std::{collections::BTreeMap, time::Duration};

use gravitation_core::GhostFrame;
use gravitation_system_race_timer::format_elapsed;
use serde::{Deserialize, Serialize};

/// Personal best assumed for players without an entry.
pub const UNSET_TIME: &str = "59:59.000";

/// Outcome of submitting a finished run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    /// The run did not beat the player's personal best; nothing changed.
    NotImproved,
    /// The run replaced the player's personal best.
    PersonalBest {
        /// The run also matches the fastest time recorded for the level.
        global_best: bool,
    },
}

/// Best time per player, grouped by level.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leaderboard {
    levels: BTreeMap<String, BTreeMap<String, String>>,
}

impl Leaderboard {
    /// Personal best of `user` on `level`, if one is recorded.
    #[must_use]
    pub fn best_for(&self, level: &str, user: &str) -> Option<&str> {
        self.levels
            .get(level)
            .and_then(|times| times.get(user))
            .map(String::as_str)
    }

    /// Fastest time recorded on `level`.
    #[must_use]
    pub fn global_best(&self, level: &str) -> Option<&str> {
        self.levels
            .get(level)
            .and_then(|times| times.values().min())
            .map(String::as_str)
    }

    /// Reports whether `time` beats the recorded personal best of `user`.
    #[must_use]
    pub fn improves(&self, level: &str, user: &str, time: &str) -> bool {
        time < self.best_for(level, user).unwrap_or(UNSET_TIME)
    }

    /// Stores `time` as the personal best of `user`, replacing any entry.
    pub fn record(&mut self, level: &str, user: &str, time: &str) {
        let _ = self
            .levels
            .entry(level.to_owned())
            .or_default()
            .insert(user.to_owned(), time.to_owned());
    }

    /// Records a finished run if it beats the player's personal best.
    pub fn submit(&mut self, level: &str, user: &str, elapsed: Duration) -> Submission {
        let time = format_elapsed(elapsed);
        if !self.improves(level, user, &time) {
            return Submission::NotImproved;
        }

        self.record(level, user, &time);
        Submission::PersonalBest {
            global_best: self.global_best(level) == Some(time.as_str()),
        }
    }

    /// Names of all levels with at least one entry.
    pub fn levels(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }

    /// Entries of `level` ordered from fastest to slowest, ties by name.
    #[must_use]
    pub fn standings(&self, level: &str) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .levels
            .get(level)
            .map(|times| {
                times
                    .iter()
                    .map(|(user, time)| (user.as_str(), time.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|left, right| left.1.cmp(right.1).then(left.0.cmp(right.0)));
        entries
    }
}

/// Recorded ghost trace of the global best run, per level.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GhostLibrary {
    levels: BTreeMap<String, Vec<GhostFrame>>,
}

impl GhostLibrary {
    /// Trace stored for `level`. Empty traces count as absent.
    #[must_use]
    pub fn get(&self, level: &str) -> Option<&[GhostFrame]> {
        self.levels
            .get(level)
            .map(Vec::as_slice)
            .filter(|frames| !frames.is_empty())
    }

    /// Stores `frames` as the trace for `level`.
    pub fn replace(&mut self, level: &str, frames: Vec<GhostFrame>) {
        let _ = self.levels.insert(level.to_owned(), frames);
    }

    /// Adds every trace of `other`, overwriting levels present in both.
    pub fn merge(&mut self, other: GhostLibrary) {
        self.levels.extend(other.levels);
    }

    /// Library holding only the trace for `level`, as persisted per level.
    #[must_use]
    pub fn single(level: &str, frames: Vec<GhostFrame>) -> Self {
        let mut library = Self::default();
        library.replace(level, frames);
        library
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravitation_core::Pose;

    fn board(json: &str) -> Leaderboard {
        serde_json::from_str(json).expect("valid leaderboard")
    }

    #[test]
    fn reads_the_persisted_shape() {
        let leaderboard = board(
            r#"{"Ryan Level": {"ana": "01:02.500", "bo": "00:59.999"}, "John Level": {}}"#,
        );
        assert_eq!(leaderboard.best_for("Ryan Level", "ana"), Some("01:02.500"));
        assert_eq!(leaderboard.global_best("Ryan Level"), Some("00:59.999"));
        assert_eq!(leaderboard.global_best("John Level"), None);
        assert_eq!(leaderboard.best_for("Missing", "ana"), None);
    }

    #[test]
    fn first_run_is_a_personal_and_global_best() {
        let mut leaderboard = Leaderboard::default();
        assert_eq!(
            leaderboard.submit("Ryan Level", "ana", Duration::from_millis(61_250)),
            Submission::PersonalBest { global_best: true }
        );
        assert_eq!(leaderboard.best_for("Ryan Level", "ana"), Some("01:01.250"));
    }

    #[test]
    fn slower_or_equal_runs_do_not_improve() {
        let mut leaderboard = board(r#"{"L": {"ana": "01:00.000"}}"#);
        assert_eq!(
            leaderboard.submit("L", "ana", Duration::from_secs(60)),
            Submission::NotImproved
        );
        assert_eq!(
            leaderboard.submit("L", "ana", Duration::from_secs(75)),
            Submission::NotImproved
        );
        assert_eq!(leaderboard.best_for("L", "ana"), Some("01:00.000"));
    }

    #[test]
    fn personal_best_behind_the_leader_is_not_global() {
        let mut leaderboard = board(r#"{"L": {"ana": "01:00.000", "bo": "00:40.000"}}"#);
        assert_eq!(
            leaderboard.submit("L", "ana", Duration::from_secs(50)),
            Submission::PersonalBest { global_best: false }
        );
        assert_eq!(
            leaderboard.submit("L", "ana", Duration::from_secs(40)),
            Submission::PersonalBest { global_best: true }
        );
    }

    #[test]
    fn runs_slower_than_the_unset_time_never_count() {
        let mut leaderboard = Leaderboard::default();
        assert_eq!(
            leaderboard.submit("L", "ana", Duration::from_secs(3_600)),
            Submission::NotImproved
        );
    }

    #[test]
    fn standings_are_sorted_by_time() {
        let leaderboard = board(r#"{"L": {"cy": "00:50.000", "ana": "01:00.000", "bo": "00:50.000"}}"#);
        assert_eq!(
            leaderboard.standings("L"),
            vec![("bo", "00:50.000"), ("cy", "00:50.000"), ("ana", "01:00.000")]
        );
        assert!(leaderboard.standings("Other").is_empty());
        assert_eq!(leaderboard.levels().collect::<Vec<_>>(), vec!["L"]);
    }

    #[test]
    fn ghost_library_merges_and_hides_empty_traces() {
        let frame = GhostFrame::from_pose(16, Pose::new(1.0, 2.0, 3.0));
        let mut library = GhostLibrary::single("A", vec![frame]);
        library.merge(GhostLibrary::single("B", Vec::new()));
        library.merge(serde_json::from_str(r#"{"C": [{"timestamp": 0, "x": 5, "y": 6, "rotation": 0}]}"#).expect("valid ghosts"));

        assert_eq!(library.get("A"), Some(&[frame][..]));
        assert_eq!(library.get("B"), None);
        assert_eq!(library.get("C").map(<[GhostFrame]>::len), Some(1));

        library.replace("A", Vec::new());
        assert_eq!(library.get("A"), None);
    }
}
