use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use synod_common::{Ballot, ProcessId};

use super::ballot_state::BallotState;

/// Progress of the round this process is driving as a proposer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No proposal made yet.
    Idle,
    /// `Read` sent, collecting `Gather` replies.
    Reading,
    /// `Impose` sent, collecting `Ack` replies.
    Imposing,
    /// `Decide` sent for this round.
    Closed,
}

/// Per-process protocol state. Owned by exactly one process.
///
/// The acceptor half (`read_ballot`, `impose_ballot`, `estimate`) outlives
/// rounds. The proposer half is re-derived by [`RoundState::begin_round`].
#[derive(Debug, Clone)]
pub struct RoundState<V> {
    pub(crate) proposal: Option<V>,
    pub(crate) ballot: Ballot,
    pub(crate) phase: RoundPhase,

    pub(crate) read_ballot: Ballot,
    pub(crate) impose_ballot: Ballot,
    pub(crate) estimate: Option<V>,

    /// Gather reports of the current ballot, keyed by sender.
    pub(crate) states: BTreeMap<ProcessId, BallotState<V>>,
    pub(crate) gather_counter: usize,
    ackers: BTreeSet<ProcessId>,
    pub(crate) ack_counter: usize,
}

impl<V: Clone> RoundState<V> {
    pub fn new(id: ProcessId, n: usize) -> Self {
        let initial = Ballot::initial(id, n);
        Self {
            proposal: None,
            ballot: initial,
            phase: RoundPhase::Idle,
            read_ballot: Ballot::default(),
            impose_ballot: initial,
            estimate: None,
            states: BTreeMap::new(),
            gather_counter: 0,
            ackers: BTreeSet::new(),
            ack_counter: 0,
        }
    }

    /// Moves to the next owned ballot and starts reading for `proposal`.
    pub fn begin_round(&mut self, proposal: V, n: usize) -> Ballot {
        self.ballot = self.ballot.next(n);
        self.proposal = Some(proposal);
        self.phase = RoundPhase::Reading;
        self.clear_gather();
        self.clear_acks();
        self.ballot
    }

    /// Whether a `Read` or `Impose` for `ballot` may be accepted.
    pub fn admits(&self, ballot: Ballot) -> bool {
        !(self.read_ballot > ballot || self.impose_ballot > ballot)
    }

    /// Records a gather report. A second report from the same sender
    /// replaces the first without counting twice.
    pub fn record_gather(&mut self, from: ProcessId, state: BallotState<V>) -> usize {
        if self.states.insert(from, state).is_none() {
            self.gather_counter += 1;
        }
        self.gather_counter
    }

    pub fn record_ack(&mut self, from: ProcessId) -> usize {
        if self.ackers.insert(from) {
            self.ack_counter += 1;
        }
        self.ack_counter
    }

    pub fn clear_gather(&mut self) {
        self.states.clear();
        self.gather_counter = 0;
    }

    pub fn clear_acks(&mut self) {
        self.ackers.clear();
        self.ack_counter = 0;
    }

    pub fn freshest_estimate(&self) -> Option<&V> {
        BallotState::freshest(self.states.values()).and_then(|s| s.estimate.as_ref())
    }
}
