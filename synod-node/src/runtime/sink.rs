use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use synod_common::utils::time::as_nanos_u64;
use synod_common::{Message, ProposalValue, Result, SynodError};
use synod_net::in_memory::Mailbox;

pub const CSV_HEADER: &str = "run_id,started_at,N,f,timeToElection,alpha,timeSpentInNanoSeconds";

/// One measured run.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub n: usize,
    pub f: usize,
    pub time_to_election_ms: u64,
    pub alpha: f64,
    /// From the first delivered `Launch` to the first delivered `Decide`.
    pub time_spent: Duration,
}

impl ResultRow {
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}\n",
            self.run_id,
            self.started_at.to_rfc3339(),
            self.n,
            self.f,
            self.time_to_election_ms,
            self.alpha,
            as_nanos_u64(self.time_spent)
        )
    }
}

/// Append-only CSV of run results, shared by concurrent runs.
pub struct ResultSink {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ResultSink {
    /// Truncates `path` and writes the header.
    pub async fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, format!("{}\n", CSV_HEADER)).await?;
        info!("📝 results file created at {:?}", path);
        Ok(Self { path, write_lock: Mutex::new(()) })
    }

    /// Appends to `path`, writing the header only if the file is new.
    pub async fn append_to<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if fs::try_exists(&path).await? {
            Ok(Self { path, write_lock: Mutex::new(()) })
        } else {
            Self::create(path).await
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record(&self, row: &ResultRow) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| SynodError::Sink(format!("{:?}: {}", self.path, e)))?;
        file.write_all(row.to_csv_line().as_bytes())
            .await
            .map_err(|e| SynodError::Sink(format!("{:?}: {}", self.path, e)))?;
        file.flush().await?;
        debug!("run {} recorded ({} ns)", row.run_id, as_nanos_u64(row.time_spent));
        Ok(())
    }
}

/// Watches a network tap and returns the time between the first `Launch`
/// and the first `Decide` delivered anywhere. `None` if the tap closes first.
pub async fn measure_decision_latency<V: ProposalValue>(mut tap: Mailbox<V>) -> Option<Duration> {
    let mut launched_at: Option<Instant> = None;
    while let Some(envelope) = tap.recv().await {
        match envelope.message {
            Message::Launch { .. } if launched_at.is_none() => {
                launched_at = Some(Instant::now());
            }
            Message::Decide { .. } => {
                if let Some(start) = launched_at {
                    return Some(start.elapsed());
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use synod_common::{Envelope, ProcessId};
    use tokio::sync::mpsc;

    fn row() -> ResultRow {
        ResultRow {
            run_id: Uuid::nil(),
            started_at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            n: 3,
            f: 1,
            time_to_election_ms: 500,
            alpha: 0.1,
            time_spent: Duration::from_micros(1500),
        }
    }

    #[test]
    fn test_csv_line_layout() {
        assert_eq!(
            row().to_csv_line(),
            "00000000-0000-0000-0000-000000000000,1970-01-01T00:00:00+00:00,3,1,500,0.1,1500000\n"
        );
    }

    #[tokio::test]
    async fn test_create_truncates_and_append_keeps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/results.csv");

        let sink = ResultSink::create(&path).await.unwrap();
        sink.record(&row()).await.unwrap();
        let sink = ResultSink::append_to(&path).await.unwrap();
        sink.record(&row()).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert_eq!(content.lines().next(), Some(CSV_HEADER));

        ResultSink::create(&path).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), format!("{}\n", CSV_HEADER));
    }

    #[tokio::test]
    async fn test_latency_needs_launch_first() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Envelope::from_process(ProcessId(0), Message::<u8>::Decide { value: 1 })).unwrap();
        tx.send(Envelope::from_coordinator(Message::<u8>::Launch { started_at: None })).unwrap();
        tx.send(Envelope::from_process(ProcessId(1), Message::<u8>::Decide { value: 1 })).unwrap();
        assert!(measure_decision_latency(rx).await.is_some());

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Envelope::from_process(ProcessId(0), Message::<u8>::Decide { value: 1 })).unwrap();
        drop(tx);
        assert_eq!(measure_decision_latency(rx).await, None);
    }
}
