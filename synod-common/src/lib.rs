pub mod env;
pub mod error;
pub mod utils;

pub use env::ballot::Ballot;
pub use env::membership::MembershipView;
pub use env::message::{Envelope, Message};
pub use env::value::ProposalValue;
pub use error::{Result, SynodError};
pub use utils::ProcessId;
