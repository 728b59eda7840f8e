#![forbid(unsafe_code)]

//! Pairwise sequence matching.
//!
//! The engine treats matching as a pure function from two token sequences to
//! an ordered list of [`MatchedRun`]s. [`DiffMatcher`] is the default
//! implementation over the `similar` crate.

use similar::{Algorithm, DiffOp};

/// A maximal run where `left[left + k] == right[right + k]` for
/// `k in 0..len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchedRun {
    pub left: usize,
    pub right: usize,
    pub len: usize,
}

impl MatchedRun {
    #[must_use]
    pub const fn new(left: usize, right: usize, len: usize) -> Self {
        Self { left, right, len }
    }
}

/// Finds matched runs between two sequences of strings.
///
/// Runs must be ordered by increasing `left` and must not overlap; the
/// engine drops any that are not.
pub trait SequenceMatcher {
    fn matches(&self, left: &[&str], right: &[&str]) -> Vec<MatchedRun>;
}

/// Diff algorithm used by [`DiffMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum MatchAlgorithm {
    /// Anchors on lines that are unique in both sequences.
    #[default]
    Patience,
    Myers,
}

impl From<MatchAlgorithm> for Algorithm {
    fn from(value: MatchAlgorithm) -> Self {
        match value {
            MatchAlgorithm::Patience => Algorithm::Patience,
            MatchAlgorithm::Myers => Algorithm::Myers,
        }
    }
}

/// Matcher over `similar::capture_diff_slices`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffMatcher {
    algorithm: MatchAlgorithm,
}

impl DiffMatcher {
    #[must_use]
    pub const fn new(algorithm: MatchAlgorithm) -> Self {
        Self { algorithm }
    }

    #[must_use]
    pub const fn algorithm(&self) -> MatchAlgorithm {
        self.algorithm
    }
}

impl SequenceMatcher for DiffMatcher {
    fn matches(&self, left: &[&str], right: &[&str]) -> Vec<MatchedRun> {
        let ops = similar::capture_diff_slices(self.algorithm.into(), left, right);
        let mut runs: Vec<MatchedRun> = Vec::new();
        for op in ops {
            let DiffOp::Equal {
                old_index,
                new_index,
                len,
            } = op
            else {
                continue;
            };
            // The diff may report one run as several adjacent equal ops.
            match runs.last_mut() {
                Some(last)
                    if last.left + last.len == old_index && last.right + last.len == new_index =>
                {
                    last.len += len;
                }
                _ => runs.push(MatchedRun::new(old_index, new_index, len)),
            }
        }
        runs
    }
}

/// Keep only runs that are in bounds, non-empty, and strictly ordered on
/// both sides; then append the `(left_len, right_len, 0)` end marker.
pub(crate) fn sanitize(
    runs: Vec<MatchedRun>,
    left_len: usize,
    right_len: usize,
) -> Vec<MatchedRun> {
    let mut out = Vec::with_capacity(runs.len() + 1);
    let (mut left_end, mut right_end) = (0, 0);
    for run in runs {
        let fits = run.len > 0
            && run.left >= left_end
            && run.right >= right_end
            && run.left + run.len <= left_len
            && run.right + run.len <= right_len;
        if !fits {
            tracing::trace!(?run, "dropping inconsistent matched run");
            continue;
        }
        left_end = run.left + run.len;
        right_end = run.right + run.len;
        out.push(run);
    }
    out.push(MatchedRun::new(left_len, right_len, 0));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_sequences_match_as_one_run() {
        let a = ["x", "y", "z"];
        let runs = DiffMatcher::default().matches(&a, &a);
        assert_eq!(runs, vec![MatchedRun::new(0, 0, 3)]);
    }

    #[test]
    fn insertion_splits_runs() {
        let a = ["a", "b", "c", "d"];
        let b = ["a", "b", "new", "c", "d"];
        let runs = DiffMatcher::default().matches(&a, &b);
        assert_eq!(
            runs,
            vec![MatchedRun::new(0, 0, 2), MatchedRun::new(2, 3, 2)]
        );
    }

    #[test]
    fn myers_finds_same_runs_for_simple_edit() {
        let a = ["a", "b", "c"];
        let b = ["a", "c"];
        let runs = DiffMatcher::new(MatchAlgorithm::Myers).matches(&a, &b);
        assert_eq!(
            runs,
            vec![MatchedRun::new(0, 0, 1), MatchedRun::new(2, 1, 1)]
        );
    }

    #[test]
    fn disjoint_sequences_have_no_runs() {
        let runs = DiffMatcher::default().matches(&["a"], &["b"]);
        assert!(runs.is_empty());
    }

    #[test]
    fn sanitize_drops_bad_runs_and_appends_marker() {
        let runs = vec![
            MatchedRun::new(0, 0, 2),
            MatchedRun::new(1, 3, 1), // overlaps on the left
            MatchedRun::new(3, 3, 0), // empty
            MatchedRun::new(4, 4, 9), // out of bounds
            MatchedRun::new(5, 4, 1),
        ];
        assert_eq!(
            sanitize(runs, 6, 6),
            vec![
                MatchedRun::new(0, 0, 2),
                MatchedRun::new(5, 4, 1),
                MatchedRun::new(6, 6, 0),
            ]
        );
    }
}
