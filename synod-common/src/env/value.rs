use std::fmt::Debug;

use rand::Rng;
use serde::{de::DeserializeOwned, Serialize};

/// A value the processes can agree on.
///
/// The harness runs on binary values, but the protocol only needs equality
/// and a way to pick an initial input at launch.
pub trait ProposalValue:
    Clone + Debug + PartialEq + Send + Sync + Serialize + DeserializeOwned + 'static
{
    /// Draws the input a process proposes when it is launched.
    fn random_input<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

impl ProposalValue for u8 {
    fn random_input<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.gen_range(0..2)
    }
}

impl ProposalValue for bool {
    fn random_input<R: Rng + ?Sized>(rng: &mut R) -> Self {
        rng.gen_bool(0.5)
    }
}
