// std
use std::time::Duration;
// crates
use da_proxy_core::da::{CertificateError, VerifierError};
use da_proxy_core::DynError;

/// Failure of a store operation. Each variant names the phase that failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to decode DA certificate key: {0}")]
    MalformedCertificate(#[source] CertificateError),
    #[error("failed to encode DA certificate into a key: {0}")]
    CertificateEncoding(#[source] CertificateError),
    #[error("DA client failed to encode blob: {0}")]
    Encoding(#[source] DynError),
    #[error("encoded blob is larger than max blob size: blob length {blob_len}, encoded blob length {encoded_len}, max blob size {max_blob_size}")]
    BlobTooLarge {
        blob_len: usize,
        encoded_len: usize,
        max_blob_size: u64,
    },
    #[error("blob dispersal failed: {0}")]
    Dispersal(#[source] DynError),
    #[error("DA client failed to retrieve blob: {0}")]
    Retrieval(#[source] DynError),
    #[error("failed to decode retrieved blob: {0}")]
    Decoding(#[source] DynError),
    #[error("commitment verification failed: {0}")]
    CommitmentMismatch(#[source] VerifierError),
    #[error("DA certificate verification failed: {0}")]
    VerificationFailed(#[source] VerifierError),
    #[error("timed out after {timeout:?} waiting for the DA certificate to confirm ({attempts} attempts)")]
    ConfirmationTimeout { timeout: Duration, attempts: u32 },
    #[error("waiting for DA certificate confirmation was cancelled")]
    Cancelled,
    #[error("failed to archive encoded blob: {0}")]
    Archival(#[source] DynError),
    #[error("failed to look up archived blob: {0}")]
    ArchivalLookup(#[source] DynError),
    #[error("failed to fetch archived blob: {0}")]
    ArchivalFetch(#[source] DynError),
    #[error("value not found for key {0}")]
    KeyNotFound(String),
    #[error("key does not match the value content hash")]
    KeyMismatch,
}
