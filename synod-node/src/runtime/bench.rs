use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use synod_common::Result;

use crate::config::BenchConfig;
use crate::runtime::coordinator::Coordinator;
use crate::runtime::sink::ResultSink;

/// Totals over a whole sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchSummary {
    pub runs: usize,
    /// Runs where the leader decided.
    pub decided: usize,
    /// Runs where two processes decided different values.
    pub conflicting: usize,
    pub total_latency: Duration,
}

impl BenchSummary {
    pub fn mean_latency(&self) -> Option<Duration> {
        match u32::try_from(self.decided) {
            Ok(0) | Err(_) => None,
            Ok(decided) => Some(self.total_latency / decided),
        }
    }
}

/// Runs every experiment of the sweep one after the other, recording each
/// decided run in `sink`.
pub async fn run_bench(config: &BenchConfig, sink: Arc<ResultSink>) -> Result<BenchSummary> {
    config.validate()?;
    let runs = config.runs();
    info!("📊 bench: {} runs, results in {:?}", runs.len(), sink.path());

    let mut summary = BenchSummary::default();
    for (i, experiment) in runs.into_iter().enumerate() {
        let report = Coordinator::new(experiment).with_sink(Some(Arc::clone(&sink))).run().await?;
        summary.runs += 1;
        if report.leader_status().decision.is_some() {
            summary.decided += 1;
            summary.total_latency += report.latency.unwrap_or_default();
        }
        if !report.is_consistent() {
            summary.conflicting += 1;
        }
        if (i + 1) % 10 == 0 {
            info!("bench progress: {} runs done", i + 1);
        }
    }

    if summary.conflicting > 0 {
        warn!("❌ {} runs ended with conflicting decisions", summary.conflicting);
    }
    info!(
        "📊 bench finished: {}/{} decided, mean latency {:?}",
        summary.decided,
        summary.runs,
        summary.mean_latency()
    );
    Ok(summary)
}
