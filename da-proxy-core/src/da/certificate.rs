// std
use std::fmt::{Debug, Formatter};
// crates
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
// internal
use crate::wire;

pub type BatchHeaderHash = [u8; 32];
pub type CertificateId = [u8; 32];

/// Leading byte of every key. Bump it, never reuse it, when the layout below changes.
pub const CERTIFICATE_VERSION: u8 = 0x00;

#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("empty certificate key")]
    Empty,
    #[error("unsupported certificate version {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("failed to encode certificate: {0}")]
    Encode(#[source] wire::Error),
    #[error("failed to decode certificate: {0}")]
    Decode(#[source] wire::Error),
}

/// Reference to the batch the network committed the blob into.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BatchReference {
    pub batch_id: u32,
    pub batch_header_hash: BatchHeaderHash,
    /// L1 block at which the batch was confirmed on chain.
    pub confirmation_block_number: u32,
}

impl Debug for BatchReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchReference")
            .field("batch_id", &self.batch_id)
            .field("batch_header_hash", &hex::encode(self.batch_header_hash))
            .field("confirmation_block_number", &self.confirmation_block_number)
            .finish()
    }
}

/// KZG commitment to the encoded blob, as an affine G1 point.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct G1Commitment {
    pub x: [u8; 32],
    pub y: [u8; 32],
}

impl Debug for G1Commitment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "G1Commitment({}, {})", hex::encode(self.x), hex::encode(self.y))
    }
}

/// Receipt of a successful dispersal. Serialized, it is the key handed back to callers.
#[derive(Clone, Eq, PartialEq, Debug, Serialize, Deserialize)]
pub struct Certificate {
    pub batch: BatchReference,
    pub blob_index: u32,
    pub commitment: G1Commitment,
    /// Length of the encoded blob in field elements.
    pub data_length: u32,
    pub inclusion_proof: Vec<u8>,
}

impl Certificate {
    /// Stable identifier of the dispersed blob: keccak256(batch_header_hash || blob_index).
    pub fn id(&self) -> CertificateId {
        let mut hasher = Keccak256::new();
        hasher.update(self.batch.batch_header_hash);
        hasher.update(self.blob_index.to_be_bytes());
        hasher.finalize().into()
    }

    /// Short human readable key for log fields.
    pub fn log_key(&self) -> String {
        format!("{}:{}", self.batch.batch_id, self.blob_index)
    }

    pub fn to_key(&self) -> Result<Vec<u8>, CertificateError> {
        let body = wire::serialize(self).map_err(CertificateError::Encode)?;
        let mut key = Vec::with_capacity(body.len() + 1);
        key.push(CERTIFICATE_VERSION);
        key.extend_from_slice(&body);
        Ok(key)
    }

    pub fn from_key(key: &[u8]) -> Result<Self, CertificateError> {
        let (version, body) = key.split_first().ok_or(CertificateError::Empty)?;
        if *version != CERTIFICATE_VERSION {
            return Err(CertificateError::UnsupportedVersion(*version));
        }
        wire::deserialize(body).map_err(CertificateError::Decode)
    }
}
