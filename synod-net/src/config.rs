use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Latency model of the in-memory links.
///
/// Each message waits `base_latency_us + uniform(0, jitter_us)` before it is
/// delivered, so two messages on the same link can overtake each other.
/// With both set to zero delivery is immediate and FIFO.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkConfig {
    pub base_latency_us: u64,
    pub jitter_us: u64,
    /// Seed for the delay draws. `None` uses OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self { base_latency_us: 50, jitter_us: 500, seed: None }
    }
}

impl LinkConfig {
    pub fn instant() -> Self {
        Self { base_latency_us: 0, jitter_us: 0, seed: None }
    }

    pub fn base_latency(&self) -> Duration {
        Duration::from_micros(self.base_latency_us)
    }

    pub fn is_instant(&self) -> bool {
        self.base_latency_us == 0 && self.jitter_us == 0
    }
}
