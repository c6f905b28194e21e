use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use synod_common::{Envelope, ProcessId, ProposalValue};
use synod_net::Transport;

use crate::consensus::{Action, ConsensusProcess, ProcessStatus};

/// Runs one process as its own task.
///
/// The driver owns the process state and its mailbox, so handlers of one
/// process never run concurrently. After every message the current
/// [`ProcessStatus`] is published on a watch channel.
pub struct ProcessDriver<V: ProposalValue, T: Transport<V>> {
    process: ConsensusProcess<V>,
    transport: Arc<T>,
    mailbox: mpsc::UnboundedReceiver<Envelope<V>>,
    status_tx: watch::Sender<ProcessStatus<V>>,
}

impl<V: ProposalValue, T: Transport<V> + 'static> ProcessDriver<V, T> {
    pub fn new(
        process: ConsensusProcess<V>,
        transport: Arc<T>,
        mailbox: mpsc::UnboundedReceiver<Envelope<V>>,
    ) -> (Self, watch::Receiver<ProcessStatus<V>>) {
        let (status_tx, status_rx) = watch::channel(process.status());
        (Self { process, transport, mailbox, status_tx }, status_rx)
    }

    pub fn id(&self) -> ProcessId {
        self.process.id()
    }

    pub fn spawn(self) -> JoinHandle<ProcessStatus<V>> {
        tokio::spawn(self.run())
    }

    /// Handles messages until the mailbox closes and returns the final status.
    pub async fn run(mut self) -> ProcessStatus<V> {
        let id = self.process.id();
        debug!("🚀 driver for {} started", id);

        while let Some(envelope) = self.mailbox.recv().await {
            trace!(ballot = ?envelope.message.ballot(), "{} dequeued {}", id, envelope.message.kind());
            let actions = self.process.handle(envelope.from, envelope.message);
            self.dispatch(actions).await;
            self.status_tx.send_replace(self.process.status());
        }

        let status = self.process.status();
        info!("driver for {} stopped in {:?} (decision: {:?})", id, status.mode, status.decision);
        status
    }

    async fn dispatch(&self, actions: Vec<Action<V>>) {
        let id = self.process.id();
        for action in actions {
            match action {
                Action::Send { to, message } => {
                    trace!("📤 {} -> {}: {}", id, to, message);
                    if let Err(e) = self.transport.send_to(to, Envelope::from_process(id, message)).await {
                        debug!("{} could not reach {}: {}", id, to, e);
                    }
                }
                Action::Broadcast { message } => {
                    let Some(view) = self.process.membership() else {
                        warn!("{} has no membership, dropping {}", id, message);
                        continue;
                    };
                    trace!("📤 {} -> all: {}", id, message);
                    if let Err(e) = self.transport.broadcast(view, Envelope::from_process(id, message)).await {
                        debug!("{} broadcast incomplete: {}", id, e);
                    }
                }
            }
        }
    }
}
