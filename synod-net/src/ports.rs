use async_trait::async_trait;

use synod_common::{Envelope, MembershipView, ProcessId, ProposalValue};

use crate::error::NetworkError;

/// Addressable send primitive the processes and the harness talk through.
#[async_trait]
pub trait Transport<V: ProposalValue>: Send + Sync {
    /// Delivers `envelope` to the process at `to`.
    async fn send_to(&self, to: ProcessId, envelope: Envelope<V>) -> Result<(), NetworkError>;

    /// Delivers `envelope` to every process in `view`, the sender included.
    ///
    /// Every peer is attempted even if an earlier send failed; the first
    /// failure is returned.
    async fn broadcast(&self, view: &MembershipView, envelope: Envelope<V>) -> Result<(), NetworkError> {
        let mut first_err = None;
        for peer in view.iter() {
            if let Err(e) = self.send_to(*peer, envelope.clone()).await {
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
