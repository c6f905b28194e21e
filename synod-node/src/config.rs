use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use synod_common::{ProcessId, Result, SynodError};
use synod_consensus::config::DEFAULT_ALPHA;
use synod_consensus::ProcessConfig;
use synod_net::LinkConfig;

/// Parameters of a single leader-election run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Number of processes.
    pub n: usize,
    /// Number of processes to crash. Drawn at random when absent.
    #[serde(default)]
    pub f: Option<usize>,
    /// Delay between launch and leader election.
    pub time_to_election_ms: u64,
    /// How long to wait for the leader to decide after election.
    pub settle_timeout_ms: u64,
    pub alpha: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub network: LinkConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            n: 3,
            f: None,
            time_to_election_ms: 1000,
            settle_timeout_ms: 5000,
            alpha: DEFAULT_ALPHA,
            seed: None,
            network: LinkConfig::default(),
        }
    }
}

impl ExperimentConfig {
    /// Largest crash count that still leaves a live majority.
    pub fn max_faulty(n: usize) -> usize {
        n.saturating_sub(1) / 2
    }

    pub fn validate(&self) -> Result<()> {
        if self.n == 0 {
            return Err(SynodError::Config("n must be at least 1".into()));
        }
        if let Some(f) = self.f {
            let max = Self::max_faulty(self.n);
            if f > max {
                return Err(SynodError::Config(format!(
                    "f = {} leaves no majority among {} processes (max {})",
                    f, self.n, max
                )));
            }
        }
        ProcessConfig { alpha: self.alpha, seed: None }.validate()
    }

    /// Per-process settings. A run seed is spread over the processes so
    /// they do not all draw the same input.
    pub fn process_config(&self, id: ProcessId) -> ProcessConfig {
        ProcessConfig {
            alpha: self.alpha,
            seed: self.seed.map(|s| s.wrapping_mul(1_000_003).wrapping_add(u64::from(id.0) + 1)),
        }
    }

    pub fn link_config(&self) -> LinkConfig {
        LinkConfig { seed: self.network.seed.or(self.seed), ..self.network.clone() }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Parameter sweep: every combination of `ns`, `alphas` and
/// `times_to_election_ms`, repeated `repetitions` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Settings shared by every run (timeouts, network, seed).
    pub base: ExperimentConfig,
    pub ns: Vec<usize>,
    pub alphas: Vec<f64>,
    pub times_to_election_ms: Vec<u64>,
    /// Crash counts to sweep. Defaults to the largest tolerated per `n`.
    #[serde(default)]
    pub fs: Option<Vec<usize>>,
    pub repetitions: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            base: ExperimentConfig::default(),
            ns: vec![3, 10, 100],
            alphas: vec![0.0, 0.1, 1.0],
            times_to_election_ms: vec![500, 1000, 1500, 2000],
            fs: None,
            repetitions: 5,
        }
    }
}

impl BenchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ns.is_empty() || self.alphas.is_empty() || self.times_to_election_ms.is_empty() {
            return Err(SynodError::Config("bench needs at least one n, alpha and time to election".into()));
        }
        if self.repetitions == 0 {
            return Err(SynodError::Config("repetitions must be at least 1".into()));
        }
        for run in self.runs() {
            run.validate()?;
        }
        Ok(())
    }

    /// Expands the sweep into individual runs, in execution order.
    pub fn runs(&self) -> Vec<ExperimentConfig> {
        let mut runs = Vec::new();
        for &n in &self.ns {
            let fs = match &self.fs {
                Some(fs) => fs.clone(),
                None => vec![ExperimentConfig::max_faulty(n)],
            };
            for &f in &fs {
                for &alpha in &self.alphas {
                    for &time_to_election_ms in &self.times_to_election_ms {
                        for _ in 0..self.repetitions {
                            let index = runs.len() as u64;
                            runs.push(ExperimentConfig {
                                n,
                                f: Some(f),
                                alpha,
                                time_to_election_ms,
                                seed: self.base.seed.map(|s| s.wrapping_add(index)),
                                ..self.base.clone()
                            });
                        }
                    }
                }
            }
        }
        runs
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
