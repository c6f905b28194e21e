//! Frame codec for envelopes crossing a link.
//!
//! A frame is a 4-byte big-endian length followed by the bincode body.

use serde::{de::DeserializeOwned, Serialize};

use synod_common::Envelope;

use crate::error::NetworkError;

pub const MAX_FRAME_LEN: usize = 1 << 20;

pub fn encode_frame<V: Serialize>(envelope: &Envelope<V>) -> Result<Vec<u8>, NetworkError> {
    let body = bincode::serialize(envelope).map_err(|e| NetworkError::Serialization(e.to_string()))?;
    if body.len() > MAX_FRAME_LEN {
        return Err(NetworkError::InvalidFrame(format!("frame too large: {} bytes", body.len())));
    }
    let mut frame = Vec::with_capacity(4 + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

pub fn decode_frame<V: DeserializeOwned>(frame: &[u8]) -> Result<Envelope<V>, NetworkError> {
    let (len_buf, body) = frame
        .split_first_chunk::<4>()
        .ok_or_else(|| NetworkError::InvalidFrame("missing length prefix".to_string()))?;
    let len = u32::from_be_bytes(*len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(NetworkError::InvalidFrame(format!("declared length {} exceeds limit", len)));
    }
    if body.len() != len {
        return Err(NetworkError::InvalidFrame(format!("declared {} bytes, got {}", len, body.len())));
    }
    bincode::deserialize(body).map_err(|e| NetworkError::Serialization(e.to_string()))
}
