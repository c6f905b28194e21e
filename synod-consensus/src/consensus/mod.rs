//! consensus.rs
//!
//! Single-decree Synod consensus among `n` symmetric processes.
//!
//! A process runs rounds of read -> gather -> impose -> ack. Rounds are
//! ordered by ballots that no two processes share, and a round only imposes
//! a value after it recovered the freshest estimate held by a majority.
//! The outcome is spread with a gossiped `Decide`.
//!
//! Everything in this module is free of I/O: handlers return the messages
//! to send as [`Action`]s and the runtime delivers them.

mod ballot_state;
mod process;
mod state;

pub use ballot_state::BallotState;
pub use process::{Action, ConsensusProcess, Mode, ProcessStatus};
pub use state::{RoundPhase, RoundState};
