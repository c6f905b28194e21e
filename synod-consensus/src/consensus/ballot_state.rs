use serde::{Deserialize, Serialize};

use synod_common::Ballot;

/// What one peer reported in its `Gather`: the last estimate it accepted
/// and the ballot it accepted it under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallotState<V> {
    pub estimate: Option<V>,
    pub estimate_ballot: Ballot,
}

impl<V> BallotState<V> {
    pub fn new(estimate: Option<V>, estimate_ballot: Ballot) -> Self {
        Self { estimate, estimate_ballot }
    }

    pub fn has_estimate(&self) -> bool {
        self.estimate.is_some()
    }

    pub fn is_fresher_than(&self, other: &BallotState<V>) -> bool {
        self.estimate_ballot > other.estimate_ballot
    }

    /// Accepted estimate with the strictly highest ballot.
    ///
    /// Reports without an estimate are skipped. On equal ballots the first
    /// report in iteration order wins; callers iterate by ascending peer id.
    pub fn freshest<'a, I>(states: I) -> Option<&'a BallotState<V>>
    where
        I: IntoIterator<Item = &'a BallotState<V>>,
        V: 'a,
    {
        let mut best: Option<&BallotState<V>> = None;
        for state in states.into_iter().filter(|s| s.has_estimate()) {
            match best {
                Some(current) if !state.is_fresher_than(current) => {}
                _ => best = Some(state),
            }
        }
        best
    }
}
