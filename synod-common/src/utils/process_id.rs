use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a process inside a run, always in `[0, n)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ProcessId(pub u32);

impl ProcessId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// All ids of a group of `n` processes, in ascending order.
    pub fn range(n: usize) -> impl Iterator<Item = ProcessId> {
        (0..n as u32).map(ProcessId)
    }
}

impl From<u32> for ProcessId {
    fn from(v: u32) -> Self {
        ProcessId(v)
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}
