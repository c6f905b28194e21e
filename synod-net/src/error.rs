use synod_common::{utils::ProcessId, SynodError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Failed to send message to peer {0}")]
    SendError(ProcessId),

    #[error("Peer {0} not found")]
    PeerNotFound(ProcessId),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

impl From<NetworkError> for SynodError {
    fn from(e: NetworkError) -> Self {
        SynodError::Network(e.to_string())
    }
}
