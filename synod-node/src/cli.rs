use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use synod_common::Result;

use crate::config::ExperimentConfig;

#[derive(Parser)]
#[command(name = "synod-node")]
#[command(about = "Synod consensus experiment runner")]
pub struct Cli {
    /// Directory for consensus.log and panic.log
    #[arg(long, global = true, default_value = "logs")]
    pub log_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single leader-election experiment
    Run(RunArgs),
    /// Sweep a parameter grid and append every run to a CSV file
    Bench {
        /// Bench configuration (JSON). Uses the default grid when absent.
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        #[arg(short, long, value_name = "CSV", default_value = "results.csv")]
        results: PathBuf,
        /// Keep existing rows instead of truncating the file
        #[arg(long)]
        append: bool,
    },
    /// Write a default configuration file
    InitConfig {
        #[arg(short, long, value_name = "OUT", default_value = "synod.json")]
        out: PathBuf,
        /// Write a bench configuration instead of a single run
        #[arg(long)]
        bench: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Experiment configuration (JSON). Flags below override it.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
    #[arg(short, long)]
    pub n: Option<usize>,
    #[arg(short, long)]
    pub f: Option<usize>,
    #[arg(short, long)]
    pub alpha: Option<f64>,
    #[arg(short = 't', long)]
    pub time_to_election_ms: Option<u64>,
    #[arg(long)]
    pub settle_timeout_ms: Option<u64>,
    #[arg(short, long)]
    pub seed: Option<u64>,
    /// Append the measured latency to this CSV file
    #[arg(short, long, value_name = "CSV")]
    pub results: Option<PathBuf>,
}

impl RunArgs {
    /// Loads the configuration file, if any, and applies the flag overrides.
    pub fn resolve(&self) -> Result<ExperimentConfig> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::load_from_file(path)?,
            None => ExperimentConfig::default(),
        };
        if let Some(n) = self.n {
            config.n = n;
        }
        if self.f.is_some() {
            config.f = self.f;
        }
        if let Some(alpha) = self.alpha {
            config.alpha = alpha;
        }
        if let Some(ms) = self.time_to_election_ms {
            config.time_to_election_ms = ms;
        }
        if let Some(ms) = self.settle_timeout_ms {
            config.settle_timeout_ms = ms;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from(["synod-node", "run", "-n", "5", "-f", "2", "--alpha", "0.5"]).unwrap();
        let Commands::Run(args) = cli.command else { panic!("expected run") };
        let config = args.resolve().unwrap();
        assert_eq!(config.n, 5);
        assert_eq!(config.f, Some(2));
        assert_eq!(config.alpha, 0.5);
        assert_eq!(cli.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        ExperimentConfig { n: 7, seed: Some(3), ..Default::default() }.save_to_file(&path).unwrap();

        let args = RunArgs { config: Some(path), n: Some(9), ..Default::default() };
        let config = args.resolve().unwrap();
        assert_eq!(config.n, 9);
        assert_eq!(config.seed, Some(3));
    }

    #[test]
    fn test_resolve_rejects_excess_faults() {
        let args = RunArgs { n: Some(3), f: Some(2), ..Default::default() };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn test_parse_bench_defaults() {
        let cli = Cli::try_parse_from(["synod-node", "bench"]).unwrap();
        let Commands::Bench { config, results, append } = cli.command else { panic!("expected bench") };
        assert!(config.is_none());
        assert_eq!(results, PathBuf::from("results.csv"));
        assert!(!append);
    }
}
