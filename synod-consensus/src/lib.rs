pub mod config;
pub mod consensus;
pub mod runtime;

pub use config::ProcessConfig;
pub use consensus::{Action, BallotState, ConsensusProcess, Mode, ProcessStatus, RoundPhase};
pub use runtime::driver::ProcessDriver;
