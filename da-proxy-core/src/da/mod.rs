pub mod archive;
pub mod certificate;
pub mod codec;

// crates
use async_trait::async_trait;
// internal
use crate::DynError;
pub use archive::{ArchivalClient, Locator};
pub use certificate::{
    BatchHeaderHash, BatchReference, Certificate, CertificateError, CertificateId, G1Commitment,
};
pub use codec::{BlobCodec, CodecError, DefaultBlobCodec};

/// Client of the DA network: transport encoding, dispersal and retrieval.
#[async_trait]
pub trait DaClient: Send + Sync {
    type Codec: BlobCodec;

    fn codec(&self) -> &Self::Codec;

    fn encode_blob(&self, data: &[u8]) -> Result<Vec<u8>, DynError> {
        self.codec().encode(data).map_err(Into::into)
    }

    fn decode_blob(&self, blob: &[u8]) -> Result<Vec<u8>, DynError> {
        self.codec().decode(blob).map_err(Into::into)
    }

    /// Submit the raw payload for dispersal and return the resulting certificate.
    async fn disperse(&self, data: &[u8]) -> Result<Certificate, DynError>;

    /// Fetch the encoded blob stored at `blob_index` of the given batch.
    async fn retrieve(
        &self,
        batch_header_hash: &BatchHeaderHash,
        blob_index: u32,
    ) -> Result<Vec<u8>, DynError>;
}

#[derive(Debug, thiserror::Error)]
pub enum VerifierError {
    /// The batch is known to the network but not yet buried under the required number of
    /// blocks. Callers waiting for confirmation may retry.
    #[error("batch {batch_id} not yet confirmed at depth {required_depth}")]
    ConfirmationDepthPending { batch_id: u32, required_depth: u64 },
    #[error("commitment does not match the encoded blob")]
    CommitmentMismatch,
    #[error(transparent)]
    Other(DynError),
}

impl VerifierError {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::ConfirmationDepthPending { .. })
    }
}

#[async_trait]
pub trait CommitmentVerifier: Send + Sync {
    /// Check `commitment` against the commitment of the encoded blob bytes.
    fn verify_commitment(
        &self,
        commitment: &G1Commitment,
        encoded_blob: &[u8],
    ) -> Result<(), VerifierError>;

    /// Check the certificate inclusion proof against the current on-chain state.
    async fn verify_certificate(&self, certificate: &Certificate) -> Result<(), VerifierError>;
}
