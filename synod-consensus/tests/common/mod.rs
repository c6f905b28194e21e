//! Deterministic message-queue simulator for the sans-IO process.
//!
//! Harness signals are applied immediately by [`Simulation::signal`] or
//! queued with the protocol traffic by [`Simulation::queue_signal`].
//! Queued messages are delivered FIFO or in a seeded random order,
//! optionally duplicated.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use rand::{rngs::StdRng, Rng, SeedableRng};

use synod_common::{Ballot, MembershipView, Message, ProcessId};
use synod_consensus::{Action, ConsensusProcess, Mode, ProcessConfig};

pub struct InFlight {
    /// `None` for harness signals.
    pub from: Option<ProcessId>,
    pub to: ProcessId,
    pub message: Message<u8>,
    /// Number of message hops since the sender's last harness signal.
    pub depth: usize,
}

pub struct Simulation {
    pub n: usize,
    pub processes: Vec<ConsensusProcess<u8>>,
    queue: VecDeque<InFlight>,
    rng: StdRng,
    pub dup_rate: f64,
    pub delivered: usize,
    /// Every `Read` ballot broadcast, in issue order.
    pub issued_ballots: Vec<(ProcessId, Ballot)>,
    /// Every `Decide` broadcast with the hop depth it was sent at.
    pub decide_broadcasts: Vec<(ProcessId, u8, usize)>,
}

impl Simulation {
    pub fn new(n: usize, seed: u64, alpha: f64) -> Self {
        let processes = ProcessId::range(n)
            .map(|id| {
                let config = ProcessConfig::seeded(seed.wrapping_mul(31).wrapping_add(u64::from(id.0))).with_alpha(alpha);
                ConsensusProcess::new(id, n, &config).unwrap()
            })
            .collect();
        Self {
            n,
            processes,
            queue: VecDeque::new(),
            rng: StdRng::seed_from_u64(seed),
            dup_rate: 0.0,
            delivered: 0,
            issued_ballots: Vec::new(),
            decide_broadcasts: Vec::new(),
        }
    }

    /// Membership then Launch to every process.
    pub fn boot(&mut self) {
        let view = MembershipView::of_size(self.n);
        for id in ProcessId::range(self.n) {
            self.signal(id, Message::Membership(view.clone()));
        }
        for id in ProcessId::range(self.n) {
            self.signal(id, Message::Launch { started_at: None });
        }
    }

    /// Membership then Launch to every process, all through the queue, so
    /// a `Launch` may overtake its `Membership`.
    pub fn boot_queued(&mut self) {
        let view = MembershipView::of_size(self.n);
        for id in ProcessId::range(self.n) {
            self.queue_signal(id, Message::Membership(view.clone()));
            self.queue_signal(id, Message::Launch { started_at: None });
        }
    }

    pub fn queue_signal(&mut self, to: ProcessId, message: Message<u8>) {
        self.queue.push_back(InFlight { from: None, to, message, depth: 0 });
    }

    pub fn signal(&mut self, to: ProcessId, message: Message<u8>) {
        let actions = self.processes[to.index()].handle(None, message);
        self.enqueue(to, actions, 0);
    }

    fn enqueue(&mut self, from: ProcessId, actions: Vec<Action<u8>>, depth: usize) {
        for action in actions {
            match action {
                Action::Send { to, message } => self.push(Some(from), to, message, depth + 1),
                Action::Broadcast { message } => {
                    match &message {
                        Message::Read { ballot } => self.issued_ballots.push((from, *ballot)),
                        Message::Decide { value } => self.decide_broadcasts.push((from, *value, depth)),
                        _ => {}
                    }
                    for to in ProcessId::range(self.n) {
                        self.push(Some(from), to, message.clone(), depth + 1);
                    }
                }
            }
        }
    }

    fn push(&mut self, from: Option<ProcessId>, to: ProcessId, message: Message<u8>, depth: usize) {
        if self.dup_rate > 0.0 && self.rng.gen_bool(self.dup_rate) {
            self.queue.push_back(InFlight { from, to, message: message.clone(), depth });
        }
        self.queue.push_back(InFlight { from, to, message, depth });
    }

    fn deliver(&mut self, msg: InFlight) {
        self.delivered += 1;
        let actions = self.processes[msg.to.index()].handle(msg.from, msg.message);
        self.enqueue(msg.to, actions, msg.depth);
    }

    pub fn step_fifo(&mut self) -> bool {
        match self.queue.pop_front() {
            Some(msg) => {
                self.deliver(msg);
                true
            }
            None => false,
        }
    }

    pub fn step_random(&mut self) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        let idx = self.rng.gen_range(0..self.queue.len());
        let msg = self.queue.swap_remove_back(idx).unwrap();
        self.deliver(msg);
        true
    }

    pub fn run_fifo(&mut self, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps && self.step_fifo() {
            steps += 1;
        }
        steps
    }

    pub fn run_random(&mut self, max_steps: usize) -> usize {
        let mut steps = 0;
        while steps < max_steps && self.step_random() {
            steps += 1;
        }
        steps
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn inputs(&self) -> Vec<u8> {
        self.processes.iter().filter_map(|p| p.proposing_input().copied()).collect()
    }

    pub fn decisions(&self) -> Vec<(ProcessId, u8)> {
        self.processes.iter().filter_map(|p| p.decision().map(|v| (p.id(), *v))).collect()
    }

    pub fn mode_of(&self, id: u32) -> Mode {
        self.processes[id as usize].mode()
    }

    /// Checks agreement and validity over everything decided or broadcast.
    pub fn assert_safe(&self) {
        let inputs = self.inputs();
        let mut values: Vec<u8> = self.decisions().into_iter().map(|(_, v)| v).collect();
        values.extend(self.decide_broadcasts.iter().map(|(_, v, _)| *v));

        if let Some(first) = values.first() {
            assert!(values.iter().all(|v| v == first), "disagreement: {:?}", values);
            assert!(inputs.contains(first), "decided {} was never proposed (inputs {:?})", first, inputs);
        }
    }

    /// Checks that no two processes issued the same ballot and that each
    /// process issued strictly increasing ballots.
    pub fn assert_unique_ballots(&self) {
        let mut owner: HashMap<Ballot, ProcessId> = HashMap::new();
        let mut last: HashMap<ProcessId, Ballot> = HashMap::new();
        for (id, ballot) in &self.issued_ballots {
            if let Some(prev) = owner.insert(*ballot, *id) {
                assert_eq!(prev, *id, "ballot {} issued by {} and {}", ballot, prev, id);
            }
            if let Some(prev) = last.insert(*id, *ballot) {
                assert!(*ballot > prev, "{} issued {} after {}", id, ballot, prev);
            }
        }
    }
}
