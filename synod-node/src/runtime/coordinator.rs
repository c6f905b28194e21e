use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use synod_common::utils::time::now_utc;
use synod_common::{Envelope, MembershipView, Message, ProcessId, Result, SynodError};
use synod_consensus::{ConsensusProcess, Mode, ProcessDriver, ProcessStatus};
use synod_net::{InMemoryNetwork, Transport};

use crate::config::ExperimentConfig;
use crate::runtime::sink::{measure_decision_latency, ResultRow, ResultSink};
use crate::Value;

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub n: usize,
    pub f: usize,
    pub leader: ProcessId,
    pub faulty: Vec<ProcessId>,
    /// Final status of every process, indexed by id.
    pub statuses: Vec<ProcessStatus<Value>>,
    /// Launch to first decide, when anyone decided.
    pub latency: Option<Duration>,
}

impl RunReport {
    pub fn leader_status(&self) -> &ProcessStatus<Value> {
        &self.statuses[self.leader.index()]
    }

    pub fn decided_values(&self) -> Vec<Value> {
        self.statuses.iter().filter_map(|s| s.decision).collect()
    }

    /// No two processes decided differently.
    pub fn is_consistent(&self) -> bool {
        let values = self.decided_values();
        values.windows(2).all(|w| w[0] == w[1])
    }

    /// The decided value, when someone decided and everyone agrees.
    pub fn agreed_value(&self) -> Option<Value> {
        if !self.is_consistent() {
            return None;
        }
        self.decided_values().first().copied()
    }
}

/// Drives one leader-election run over an in-memory network.
///
/// Every process gets the membership, and `Launch` goes out only once all
/// of them hold it. `f` random processes are crashed right away, and after
/// `time_to_election_ms` every process except one correct leader is put
/// on hold.
pub struct Coordinator {
    config: ExperimentConfig,
    sink: Option<Arc<ResultSink>>,
}

impl Coordinator {
    pub fn new(config: ExperimentConfig) -> Self {
        Self { config, sink: None }
    }

    pub fn with_sink(mut self, sink: Option<Arc<ResultSink>>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<RunReport> {
        self.config.validate()?;
        let n = self.config.n;
        let run_id = Uuid::new_v4();
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let f = match self.config.f {
            Some(f) => f,
            None => rng.gen_range(0..=ExperimentConfig::max_faulty(n)),
        };

        let network = InMemoryNetwork::<Value>::new(self.config.link_config());
        let transport = Arc::new(network.clone());
        let mut latency_probe = tokio::spawn(measure_decision_latency(network.tap().await));

        let mut statuses = Vec::with_capacity(n);
        let mut handles = Vec::with_capacity(n);
        for id in ProcessId::range(n) {
            let mailbox = network.register(id).await;
            let process = ConsensusProcess::new(id, n, &self.config.process_config(id))?;
            let (driver, status) = ProcessDriver::new(process, Arc::clone(&transport), mailbox);
            statuses.push(status);
            handles.push(driver.spawn());
        }

        let view = MembershipView::of_size(n);
        for id in ProcessId::range(n) {
            network.send_to(id, Envelope::from_coordinator(Message::Membership(view.clone()))).await?;
        }
        let settle = Duration::from_millis(self.config.settle_timeout_ms);
        for status in statuses.iter_mut() {
            tokio::time::timeout(settle, status.wait_for(|s| s.has_membership))
                .await
                .map_err(|_| SynodError::Other("membership was not delivered in time".into()))?
                .map_err(|e| SynodError::Other(format!("process driver stopped: {}", e)))?;
        }

        let started_at = now_utc();
        info!("🚀 run {} started: n={} f={} alpha={}", run_id, n, f, self.config.alpha);
        for id in ProcessId::range(n) {
            network
                .send_to(id, Envelope::from_coordinator(Message::Launch { started_at: Some(started_at) }))
                .await?;
        }

        let mut order: Vec<ProcessId> = ProcessId::range(n).collect();
        order.shuffle(&mut rng);
        let (faulty, correct) = order.split_at(f);
        for id in faulty {
            info!("💥 crashing {}", id);
            network.send_to(*id, Envelope::from_coordinator(Message::Crash)).await?;
        }

        let leader = correct[0];
        let election = Duration::from_millis(self.config.time_to_election_ms);
        // Stop waiting early if the leader already decided.
        let _ = tokio::time::timeout(election, wait_for_decision(&mut statuses[leader.index()])).await;

        info!("👑 {} elected leader", leader);
        for id in order.iter().filter(|id| **id != leader) {
            network.send_to(*id, Envelope::from_coordinator(Message::Hold)).await?;
        }

        let leader_decided =
            tokio::time::timeout(settle, wait_for_decision(&mut statuses[leader.index()])).await.is_ok();
        if !leader_decided {
            warn!("⚠️ leader {} did not decide within {:?}", leader, settle);
        }

        // The leader's decide broadcast may still be in flight.
        let probe_wait = if leader_decided { settle } else { Duration::ZERO };
        let latency = match tokio::time::timeout(probe_wait, &mut latency_probe).await {
            Ok(joined) => joined.map_err(|e| SynodError::Other(format!("latency probe failed: {}", e)))?,
            Err(_) => None,
        };
        latency_probe.abort();

        network.shutdown().await;
        let statuses = join_all(handles)
            .await
            .into_iter()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SynodError::Other(format!("process driver failed: {}", e)))?;

        let report = RunReport {
            run_id,
            started_at,
            n,
            f,
            leader,
            faulty: faulty.to_vec(),
            statuses,
            latency,
        };

        if !report.is_consistent() {
            warn!("❌ run {} ended with conflicting decisions: {:?}", run_id, report.decided_values());
        }

        match (report.latency, &self.sink) {
            (Some(time_spent), Some(sink)) => {
                sink.record(&ResultRow {
                    run_id,
                    started_at,
                    n,
                    f,
                    time_to_election_ms: self.config.time_to_election_ms,
                    alpha: self.config.alpha,
                    time_spent,
                })
                .await?;
            }
            (None, Some(_)) => warn!("run {} produced no decision, nothing recorded", run_id),
            _ => {}
        }

        info!(
            "🏁 run {} finished: leader {} decided {:?} in {:?}",
            run_id,
            leader,
            report.leader_status().decision,
            report.latency
        );
        Ok(report)
    }
}

/// Resolves once the process has decided. Never resolves for a process
/// that went silent or whose driver stopped.
async fn wait_for_decision(status: &mut watch::Receiver<ProcessStatus<Value>>) {
    let decided = matches!(
        status.wait_for(|s| s.decision.is_some() || s.mode == Mode::Silent).await,
        Ok(s) if s.decision.is_some()
    );
    if !decided {
        std::future::pending::<()>().await;
    }
}
