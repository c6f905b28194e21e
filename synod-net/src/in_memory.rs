use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, trace};

use synod_common::{Envelope, ProcessId, ProposalValue};

use crate::codec::{decode_frame, encode_frame};
use crate::config::LinkConfig;
use crate::error::NetworkError;
use crate::ports::Transport;

pub type Mailbox<V> = mpsc::UnboundedReceiver<Envelope<V>>;

/// In-process network connecting the processes of one run.
///
/// Every send is encoded to a frame, delayed according to the
/// [`LinkConfig`] and decoded again right before it lands in the
/// recipient's mailbox.
pub struct InMemoryNetwork<V> {
    inner: Arc<Inner<V>>,
}

struct Inner<V> {
    mailboxes: RwLock<HashMap<ProcessId, mpsc::UnboundedSender<Envelope<V>>>>,
    taps: RwLock<Vec<mpsc::UnboundedSender<Envelope<V>>>>,
    config: LinkConfig,
    rng: Mutex<StdRng>,
}

impl<V> Clone for InMemoryNetwork<V> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<V: ProposalValue> InMemoryNetwork<V> {
    pub fn new(config: LinkConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner: Arc::new(Inner {
                mailboxes: RwLock::new(HashMap::new()),
                taps: RwLock::new(Vec::new()),
                config,
                rng: Mutex::new(rng),
            }),
        }
    }

    /// Registers `id` and returns its mailbox. Registering again replaces
    /// the previous mailbox.
    pub async fn register(&self, id: ProcessId) -> Mailbox<V> {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.inner.mailboxes.write().await.insert(id, tx).is_some() {
            debug!("mailbox of {} replaced", id);
        }
        rx
    }

    /// Observer stream receiving a copy of every delivered envelope.
    pub async fn tap(&self) -> Mailbox<V> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.taps.write().await.push(tx);
        rx
    }

    /// Drops every mailbox and tap sender. Drivers see their mailbox close
    /// once the in-flight deliveries are gone.
    pub async fn shutdown(&self) {
        self.inner.mailboxes.write().await.clear();
        self.inner.taps.write().await.clear();
    }

    async fn next_delay(&self) -> Duration {
        let config = &self.inner.config;
        if config.jitter_us == 0 {
            return config.base_latency();
        }
        let jitter = self.inner.rng.lock().await.gen_range(0..=config.jitter_us);
        config.base_latency() + Duration::from_micros(jitter)
    }
}

impl<V: ProposalValue> Inner<V> {
    async fn deliver(&self, to: ProcessId, frame: &[u8]) -> Result<(), NetworkError> {
        let envelope: Envelope<V> = decode_frame(frame)?;
        trace!("deliver {} -> {}: {}", fmt_sender(envelope.from), to, envelope.message);

        let sender = self
            .mailboxes
            .read()
            .await
            .get(&to)
            .cloned()
            .ok_or(NetworkError::PeerNotFound(to))?;

        sender.send(envelope.clone()).map_err(|_| NetworkError::SendError(to))?;

        let mut taps = self.taps.write().await;
        taps.retain(|tap| tap.send(envelope.clone()).is_ok());
        Ok(())
    }
}

fn fmt_sender(from: Option<ProcessId>) -> String {
    from.map(|id| id.to_string()).unwrap_or_else(|| "coordinator".to_string())
}

#[async_trait]
impl<V: ProposalValue> Transport<V> for InMemoryNetwork<V> {
    async fn send_to(&self, to: ProcessId, envelope: Envelope<V>) -> Result<(), NetworkError> {
        if !self.inner.mailboxes.read().await.contains_key(&to) {
            return Err(NetworkError::PeerNotFound(to));
        }
        let frame = encode_frame(&envelope)?;

        if self.inner.config.is_instant() {
            return self.inner.deliver(to, &frame).await;
        }

        let delay = self.next_delay().await;
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = inner.deliver(to, &frame).await {
                // Expected after shutdown; the run is already over.
                debug!("delayed delivery to {} dropped: {}", to, e);
            }
        });
        Ok(())
    }
}
