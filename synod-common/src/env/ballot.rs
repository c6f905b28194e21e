use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::ProcessId;

/// Round number of a proposal.
///
/// Process `id` of a group of `n` issues `id - n`, `id`, `id + n`, `id + 2n`, ...
/// Every ballot of a process is congruent to its id modulo `n`, so two
/// processes of the same run never issue the same ballot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Ballot(pub i64);

impl Ballot {
    /// The placeholder ballot a process holds before its first proposal.
    /// It is never sent in a `Read`.
    pub fn initial(id: ProcessId, n: usize) -> Self {
        Ballot(i64::from(id.0) - n as i64)
    }

    /// The next ballot owned by the same process.
    pub fn next(self, n: usize) -> Self {
        Ballot(self.0 + n as i64)
    }

    /// The process that owns this ballot in a group of `n`.
    pub fn owner(self, n: usize) -> ProcessId {
        ProcessId(self.0.rem_euclid(n as i64) as u32)
    }
}

impl fmt::Display for Ballot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
