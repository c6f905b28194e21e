//! message.rs
//!
//! The closed set of messages a process can receive. Harness signals
//! (`Membership`, `Launch`, `Crash`, `Hold`) and protocol messages share one
//! enum so a handler has to match every kind.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::env::{ballot::Ballot, membership::MembershipView};
use crate::utils::ProcessId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message<V> {
    /// Peer list, delivered once before `Launch`.
    Membership(MembershipView),
    /// Start proposing. The timestamp is only read by result observers.
    Launch { started_at: Option<DateTime<Utc>> },
    /// Marks the receiver fault-prone.
    Crash,
    /// Freezes the receiver for the rest of the run.
    Hold,

    Read { ballot: Ballot },
    Gather { ballot: Ballot, estimate_ballot: Ballot, estimate: Option<V> },
    Impose { ballot: Ballot, value: V },
    Ack { ballot: Ballot },
    Abort { ballot: Ballot },
    Decide { value: V },
}

impl<V> Message<V> {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Membership(_) => "membership",
            Message::Launch { .. } => "launch",
            Message::Crash => "crash",
            Message::Hold => "hold",
            Message::Read { .. } => "read",
            Message::Gather { .. } => "gather",
            Message::Impose { .. } => "impose",
            Message::Ack { .. } => "ack",
            Message::Abort { .. } => "abort",
            Message::Decide { .. } => "decide",
        }
    }

    /// Ballot carried by a protocol message, if any.
    pub fn ballot(&self) -> Option<Ballot> {
        match self {
            Message::Read { ballot }
            | Message::Gather { ballot, .. }
            | Message::Impose { ballot, .. }
            | Message::Ack { ballot }
            | Message::Abort { ballot } => Some(*ballot),
            _ => None,
        }
    }
}

impl<V: fmt::Debug> fmt::Display for Message<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Membership(view) => write!(f, "[MEMBERSHIP] size:{}", view.len()),
            Message::Launch { .. } => write!(f, "[LAUNCH]"),
            Message::Crash => write!(f, "[CRASH]"),
            Message::Hold => write!(f, "[HOLD]"),
            Message::Read { ballot } => write!(f, "[READ] ballot:{}", ballot),
            Message::Gather { ballot, estimate_ballot, estimate } => write!(
                f,
                "[GATHER] ballot:{} estimateBallot:{} estimate:{:?}",
                ballot, estimate_ballot, estimate
            ),
            Message::Impose { ballot, value } => write!(f, "[IMPOSE] ballot:{} value:{:?}", ballot, value),
            Message::Ack { ballot } => write!(f, "[ACK] ballot:{}", ballot),
            Message::Abort { ballot } => write!(f, "[ABORT] ballot:{}", ballot),
            Message::Decide { value } => write!(f, "[DECIDE] value:{:?}", value),
        }
    }
}

/// A message together with the process that sent it.
///
/// `from` is `None` for signals issued by the harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<V> {
    pub from: Option<ProcessId>,
    pub message: Message<V>,
}

impl<V> Envelope<V> {
    pub fn from_process(from: ProcessId, message: Message<V>) -> Self {
        Self { from: Some(from), message }
    }

    pub fn from_coordinator(message: Message<V>) -> Self {
        Self { from: None, message }
    }
}
