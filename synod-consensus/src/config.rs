use serde::{Deserialize, Serialize};

use synod_common::{Result, SynodError};

pub const DEFAULT_ALPHA: f64 = 0.1;

/// Settings handed to each process when it is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Probability that a fault-prone process goes silent on a given message.
    pub alpha: f64,
    /// Seed of the process RNG (initial input and crash draws).
    /// `None` uses OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self { alpha: DEFAULT_ALPHA, seed: None }
    }
}

impl ProcessConfig {
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed), ..Self::default() }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(SynodError::Config(format!("alpha must be within [0, 1], got {}", self.alpha)));
        }
        Ok(())
    }
}
