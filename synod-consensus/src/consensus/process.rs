use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use synod_common::{Ballot, MembershipView, Message, ProcessId, ProposalValue, Result, SynodError};

use super::ballot_state::BallotState;
use super::state::{RoundPhase, RoundState};
use crate::config::ProcessConfig;

/// Participation mode of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    Normal,
    /// Crashed. Never handles another message.
    Silent,
    /// Frozen by the harness. Still answers `Read`/`Impose` as an acceptor
    /// but never proposes, retries or decides again.
    OnHold,
    /// Learned the outcome and forwarded it once.
    Decided,
}

/// Outbound effect of a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<V> {
    Send { to: ProcessId, message: Message<V> },
    /// Send to every process of the membership, the sender included.
    Broadcast { message: Message<V> },
}

/// Snapshot of a process, published after every handled message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessStatus<V> {
    pub id: ProcessId,
    pub mode: Mode,
    pub ballot: Ballot,
    pub proposing_input: Option<V>,
    pub decision: Option<V>,
    pub fault_prone: bool,
    pub has_membership: bool,
}

/// The per-process Synod state machine.
pub struct ConsensusProcess<V> {
    id: ProcessId,
    n: usize,
    alpha: f64,
    rng: StdRng,
    mode: Mode,
    fault_prone: bool,
    membership: Option<MembershipView>,
    /// `Launch` seen before the membership.
    pending_launch: bool,
    proposing_input: Option<V>,
    round: RoundState<V>,
    decision: Option<V>,
}

impl<V: ProposalValue> ConsensusProcess<V> {
    pub fn new(id: ProcessId, n: usize, config: &ProcessConfig) -> Result<Self> {
        if n == 0 {
            return Err(SynodError::Config("process group must not be empty".to_string()));
        }
        if id.index() >= n {
            return Err(SynodError::Config(format!("process id {} out of range for n={}", id, n)));
        }
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            id,
            n,
            alpha: config.alpha,
            rng,
            mode: Mode::Normal,
            fault_prone: false,
            membership: None,
            pending_launch: false,
            proposing_input: None,
            round: RoundState::new(id, n),
            decision: None,
        })
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn ballot(&self) -> Ballot {
        self.round.ballot
    }

    pub fn read_ballot(&self) -> Ballot {
        self.round.read_ballot
    }

    pub fn impose_ballot(&self) -> Ballot {
        self.round.impose_ballot
    }

    pub fn estimate(&self) -> Option<&V> {
        self.round.estimate.as_ref()
    }

    pub fn proposal(&self) -> Option<&V> {
        self.round.proposal.as_ref()
    }

    pub fn phase(&self) -> RoundPhase {
        self.round.phase
    }

    pub fn proposing_input(&self) -> Option<&V> {
        self.proposing_input.as_ref()
    }

    pub fn decision(&self) -> Option<&V> {
        self.decision.as_ref()
    }

    pub fn gather_count(&self) -> usize {
        self.round.gather_counter
    }

    pub fn ack_count(&self) -> usize {
        self.round.ack_counter
    }

    pub fn is_fault_prone(&self) -> bool {
        self.fault_prone
    }

    pub fn membership(&self) -> Option<&MembershipView> {
        self.membership.as_ref()
    }

    pub fn status(&self) -> ProcessStatus<V> {
        ProcessStatus {
            id: self.id,
            mode: self.mode,
            ballot: self.round.ballot,
            proposing_input: self.proposing_input.clone(),
            decision: self.decision.clone(),
            fault_prone: self.fault_prone,
            has_membership: self.membership.is_some(),
        }
    }

    fn is_quorum(&self, count: usize) -> bool {
        count > self.n / 2
    }

    /// Handles one inbound message and returns what to send.
    ///
    /// `from` is `None` for harness signals.
    pub fn handle(&mut self, from: Option<ProcessId>, message: Message<V>) -> Vec<Action<V>> {
        if matches!(self.mode, Mode::Silent | Mode::Decided) {
            trace!("{} ({:?}) dropping {}", self.id, self.mode, message);
            return Vec::new();
        }

        if self.fault_prone && self.rng.gen_bool(self.alpha) {
            self.mode = Mode::Silent;
            warn!("💥 {} crashed while handling {}", self.id, message.kind());
            info!(target: "consensus", "EVENT:CRASH process={} ballot={}", self.id, self.round.ballot);
            return Vec::new();
        }

        trace!("📥 {} received {}", self.id, message);

        match message {
            Message::Membership(view) => self.on_membership(view),
            Message::Launch { .. } => self.on_launch(),
            Message::Crash => self.on_crash(),
            Message::Hold => self.on_hold(),
            Message::Read { ballot } => self.on_read(from, ballot),
            Message::Gather { ballot, estimate_ballot, estimate } => {
                self.on_gather(from, ballot, BallotState::new(estimate, estimate_ballot))
            }
            Message::Impose { ballot, value } => self.on_impose(from, ballot, value),
            Message::Ack { ballot } => self.on_ack(from, ballot),
            Message::Abort { ballot } => self.on_abort(ballot),
            Message::Decide { value } => self.on_decide(value),
        }
    }

    fn on_membership(&mut self, view: MembershipView) -> Vec<Action<V>> {
        if self.membership.is_some() {
            warn!("{} ignoring a second membership", self.id);
            return Vec::new();
        }
        if view.len() != self.n {
            warn!("{} got a membership of {} peers for n={}", self.id, view.len(), self.n);
        }
        self.membership = Some(view);
        if std::mem::take(&mut self.pending_launch) {
            debug!("{} running its deferred launch", self.id);
            return self.on_launch();
        }
        Vec::new()
    }

    fn on_launch(&mut self) -> Vec<Action<V>> {
        if self.mode != Mode::Normal {
            debug!("{} ignoring launch while {:?}", self.id, self.mode);
            return Vec::new();
        }
        if self.proposing_input.is_some() || self.pending_launch {
            warn!("{} already launched", self.id);
            return Vec::new();
        }
        if self.membership.is_none() {
            debug!("{} deferring launch until the membership arrives", self.id);
            self.pending_launch = true;
            return Vec::new();
        }
        let input = V::random_input(&mut self.rng);
        self.proposing_input = Some(input.clone());
        self.propose(input)
    }

    fn on_crash(&mut self) -> Vec<Action<V>> {
        self.fault_prone = true;
        debug!("{} is now fault-prone (alpha={})", self.id, self.alpha);
        Vec::new()
    }

    fn on_hold(&mut self) -> Vec<Action<V>> {
        if self.mode != Mode::OnHold {
            self.mode = Mode::OnHold;
            info!("⏸️ {} on hold at ballot {}", self.id, self.round.ballot);
            info!(target: "consensus", "EVENT:HOLD process={} ballot={}", self.id, self.round.ballot);
        }
        Vec::new()
    }

    fn propose(&mut self, value: V) -> Vec<Action<V>> {
        let ballot = self.round.begin_round(value, self.n);
        debug_assert_eq!(ballot.owner(self.n), self.id);
        info!(
            target: "consensus",
            "EVENT:PROPOSE process={} ballot={} value={:?}", self.id, ballot, self.round.proposal
        );
        vec![Action::Broadcast { message: Message::Read { ballot } }]
    }

    fn on_read(&mut self, from: Option<ProcessId>, ballot: Ballot) -> Vec<Action<V>> {
        let Some(from) = from else {
            debug!("{} ignoring read without sender", self.id);
            return Vec::new();
        };

        if !self.round.admits(ballot) {
            return vec![Action::Send { to: from, message: Message::Abort { ballot } }];
        }

        self.round.read_ballot = ballot;
        vec![Action::Send {
            to: from,
            message: Message::Gather {
                ballot,
                estimate_ballot: self.round.impose_ballot,
                estimate: self.round.estimate.clone(),
            },
        }]
    }

    fn on_gather(&mut self, from: Option<ProcessId>, ballot: Ballot, state: BallotState<V>) -> Vec<Action<V>> {
        let Some(from) = from else {
            return Vec::new();
        };
        if self.mode != Mode::Normal || ballot != self.round.ballot || self.round.phase != RoundPhase::Reading {
            trace!("{} discarding gather for ballot {} (current {})", self.id, ballot, self.round.ballot);
            return Vec::new();
        }

        let count = self.round.record_gather(from, state);
        if !self.is_quorum(count) {
            return Vec::new();
        }

        if let Some(freshest) = self.round.freshest_estimate().cloned() {
            self.round.proposal = Some(freshest);
        }
        self.round.clear_gather();
        self.round.phase = RoundPhase::Imposing;

        let Some(value) = self.round.proposal.clone() else {
            warn!("{} reached a read quorum without a proposal", self.id);
            return Vec::new();
        };
        info!(target: "consensus", "EVENT:IMPOSE process={} ballot={} value={:?}", self.id, ballot, value);
        vec![Action::Broadcast { message: Message::Impose { ballot, value } }]
    }

    fn on_impose(&mut self, from: Option<ProcessId>, ballot: Ballot, value: V) -> Vec<Action<V>> {
        let Some(from) = from else {
            debug!("{} ignoring impose without sender", self.id);
            return Vec::new();
        };

        if !self.round.admits(ballot) {
            return vec![Action::Send { to: from, message: Message::Abort { ballot } }];
        }

        self.round.estimate = Some(value);
        self.round.impose_ballot = ballot;
        vec![Action::Send { to: from, message: Message::Ack { ballot } }]
    }

    fn on_ack(&mut self, from: Option<ProcessId>, ballot: Ballot) -> Vec<Action<V>> {
        let Some(from) = from else {
            return Vec::new();
        };
        if self.mode != Mode::Normal || ballot != self.round.ballot || self.round.phase != RoundPhase::Imposing {
            trace!("{} discarding ack for ballot {} (current {})", self.id, ballot, self.round.ballot);
            return Vec::new();
        }

        let count = self.round.record_ack(from);
        if !self.is_quorum(count) {
            return Vec::new();
        }

        self.round.clear_acks();
        self.round.phase = RoundPhase::Closed;

        let Some(value) = self.round.proposal.clone() else {
            warn!("{} reached an ack quorum without a proposal", self.id);
            return Vec::new();
        };
        vec![Action::Broadcast { message: Message::Decide { value } }]
    }

    fn on_abort(&mut self, ballot: Ballot) -> Vec<Action<V>> {
        if self.mode != Mode::Normal
            || ballot != self.round.ballot
            || !matches!(self.round.phase, RoundPhase::Reading | RoundPhase::Imposing)
        {
            return Vec::new();
        }
        let Some(input) = self.proposing_input.clone() else {
            return Vec::new();
        };
        debug!("{} aborted at ballot {}, retrying", self.id, ballot);
        self.propose(input)
    }

    fn on_decide(&mut self, value: V) -> Vec<Action<V>> {
        if self.mode != Mode::Normal {
            debug!("{} ignoring decide while {:?}", self.id, self.mode);
            return Vec::new();
        }

        self.mode = Mode::Decided;
        self.decision = Some(value.clone());
        info!("✅ {} decided {:?}", self.id, value);
        info!(target: "consensus", "EVENT:DECIDE process={} ballot={} value={:?}", self.id, self.round.ballot, value);
        vec![Action::Broadcast { message: Message::Decide { value } }]
    }
}
