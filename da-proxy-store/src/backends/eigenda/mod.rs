pub mod confirmation;

// std
use std::sync::Arc;
use std::time::Duration;
// crates
use async_trait::async_trait;
use da_proxy_core::da::{ArchivalClient, Certificate, CommitmentVerifier, DaClient, Locator};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};
// internal
use self::confirmation::{ConfirmationError, ConfirmationWait, IntervalTicks};
use crate::{
    ArchivedKeyGeneratedStore, BackendType, KeyGeneratedStore, Stats, Store, StoreError,
};

/// Average Ethereum block time, the cadence at which batches can become confirmed.
pub const ETH_BLOCK_TIME: Duration = Duration::from_secs(12);

const fn default_poll_interval() -> Duration {
    ETH_BLOCK_TIME
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EigenDaStoreSettings {
    pub max_blob_size_bytes: u64,
    /// Number of L1 blocks to wait after the batch confirmation block before a certificate is
    /// accredited.
    pub eth_confirmation_depth: u64,
    /// Total time a write may spend between dispersal and confirmation.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub status_query_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,
}

impl Default for EigenDaStoreSettings {
    fn default() -> Self {
        Self {
            max_blob_size_bytes: 2 * 1024 * 1024,
            eth_confirmation_depth: 0,
            status_query_timeout: Duration::from_secs(30 * 60),
            poll_interval: ETH_BLOCK_TIME,
        }
    }
}

/// Storage interactions and verification of blobs dispersed to EigenDA, with a copy of every
/// confirmed blob kept in a secondary archival store.
pub struct EigenDaStore<Client, Verifier, Archive> {
    client: Arc<Client>,
    verifier: Arc<Verifier>,
    archive: Arc<Archive>,
    settings: EigenDaStoreSettings,
    shutdown: CancellationToken,
}

impl<Client, Verifier, Archive> EigenDaStore<Client, Verifier, Archive>
where
    Client: DaClient,
    Verifier: CommitmentVerifier,
    Archive: ArchivalClient,
{
    pub fn new(
        client: Arc<Client>,
        verifier: Arc<Verifier>,
        archive: Arc<Archive>,
        settings: EigenDaStoreSettings,
    ) -> Self {
        Self {
            client,
            verifier,
            archive,
            settings,
            shutdown: CancellationToken::new(),
        }
    }

    /// Abort every write currently waiting for confirmation, and every future one.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn decode_key(key: &[u8]) -> Result<Certificate, StoreError> {
        Certificate::from_key(key).map_err(StoreError::MalformedCertificate)
    }

    /// Disperse `value` and return the serialized certificate once it is confirmed and
    /// archived. Cancelling `cancel` aborts the confirmation wait with
    /// [`StoreError::Cancelled`].
    #[instrument(skip_all, fields(blob_len = value.len()))]
    pub async fn put_with_cancellation(
        &self,
        value: &[u8],
        cancel: CancellationToken,
    ) -> Result<Vec<u8>, StoreError> {
        let encoded_blob = self
            .client
            .encode_blob(value)
            .map_err(StoreError::Encoding)?;
        if encoded_blob.len() as u64 > self.settings.max_blob_size_bytes {
            return Err(StoreError::BlobTooLarge {
                blob_len: value.len(),
                encoded_len: encoded_blob.len(),
                max_blob_size: self.settings.max_blob_size_bytes,
            });
        }

        // nothing is submitted for a write that is already abandoned
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }

        let dispersal_start = Instant::now();
        let certificate = self
            .client
            .disperse(value)
            .await
            .map_err(StoreError::Dispersal)?;
        debug!(cert = %certificate.log_key(), "Blob dispersed");

        self.verifier
            .verify_commitment(&certificate.commitment, &encoded_blob)
            .map_err(StoreError::CommitmentMismatch)?;

        self.wait_for_confirmation(&certificate, dispersal_start, &cancel)
            .await?;

        // a certificate that cannot become a key must not leave an archive entry behind
        let key = certificate
            .to_key()
            .map_err(StoreError::CertificateEncoding)?;

        self.archive
            .store(&certificate, &encoded_blob)
            .await
            .map_err(|e| {
                error!(cert = %certificate.log_key(), "Failed to archive confirmed blob: {e}");
                StoreError::Archival(e)
            })?;

        info!(cert = %certificate.log_key(), key_len = key.len(), "Blob confirmed and archived");
        Ok(key)
    }

    async fn wait_for_confirmation(
        &self,
        certificate: &Certificate,
        dispersal_start: Instant,
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        let timeout = self.settings.status_query_timeout;
        let timed_out = |attempts| StoreError::ConfirmationTimeout { timeout, attempts };
        // the budget is shared with dispersal and fixed once, ticks never extend it
        if dispersal_start.elapsed() >= timeout {
            return Err(timed_out(0));
        }
        let deadline = dispersal_start + timeout;

        let ticks = IntervalTicks::new(self.settings.poll_interval);
        let wait = ConfirmationWait::new(
            self.verifier.as_ref(),
            certificate,
            ticks,
            self.settings.eth_confirmation_depth,
        );
        match wait.run(deadline, cancel).await {
            Ok(attempts) => {
                debug!(attempts, "Confirmation depth reached");
                Ok(())
            }
            Err(ConfirmationError::Cancelled) => Err(StoreError::Cancelled),
            Err(ConfirmationError::Timeout { attempts }) => {
                error!(cert = %certificate.log_key(), attempts, "Timed out waiting for DA certificate confirmation");
                Err(timed_out(attempts))
            }
            Err(ConfirmationError::Rejected(e)) => Err(StoreError::VerificationFailed(e)),
        }
    }
}

#[async_trait]
impl<Client, Verifier, Archive> Store for EigenDaStore<Client, Verifier, Archive>
where
    Client: DaClient,
    Verifier: CommitmentVerifier,
    Archive: ArchivalClient,
{
    // Entries are not tracked for EigenDA
    fn stats(&self) -> Option<Stats> {
        None
    }

    fn backend_type(&self) -> BackendType {
        BackendType::EigenDa
    }

    /// Recover the certificate from `key`, check the blob against its commitment and the
    /// certificate against the chain. A batch short of the confirmation depth is a rejection
    /// here, nothing waits.
    async fn verify(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let certificate = Self::decode_key(key)?;
        let encoded_blob = self
            .client
            .encode_blob(value)
            .map_err(StoreError::Encoding)?;
        self.verifier
            .verify_commitment(&certificate.commitment, &encoded_blob)
            .map_err(StoreError::CommitmentMismatch)?;
        self.verifier
            .verify_certificate(&certificate)
            .await
            .map_err(StoreError::VerificationFailed)
    }
}

#[async_trait]
impl<Client, Verifier, Archive> KeyGeneratedStore for EigenDaStore<Client, Verifier, Archive>
where
    Client: DaClient,
    Verifier: CommitmentVerifier,
    Archive: ArchivalClient,
{
    #[instrument(skip_all)]
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        let certificate = Self::decode_key(key)?;
        let encoded_blob = self
            .client
            .retrieve(&certificate.batch.batch_header_hash, certificate.blob_index)
            .await
            .map_err(StoreError::Retrieval)?;
        self.client
            .decode_blob(&encoded_blob)
            .map_err(StoreError::Decoding)
    }

    async fn put(&self, value: &[u8]) -> Result<Vec<u8>, StoreError> {
        self.put_with_cancellation(value, self.shutdown.child_token())
            .await
    }
}

#[async_trait]
impl<Client, Verifier, Archive> ArchivedKeyGeneratedStore
    for EigenDaStore<Client, Verifier, Archive>
where
    Client: DaClient,
    Verifier: CommitmentVerifier,
    Archive: ArchivalClient,
{
    async fn archive_locator(&self, key: &[u8]) -> Result<Locator, StoreError> {
        let certificate = Self::decode_key(key)?;
        self.archive
            .locator_for(&certificate)
            .await
            .map_err(StoreError::ArchivalLookup)
    }

    #[instrument(skip_all)]
    async fn get_from_archive(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        let certificate = Self::decode_key(key)?;
        let locator = self
            .archive
            .locator_for(&certificate)
            .await
            .map_err(StoreError::ArchivalLookup)?;
        info!(cert = %certificate.log_key(), %locator, "Found archived blob locator");
        let encoded_blob = self
            .archive
            .fetch(&locator)
            .await
            .map_err(StoreError::ArchivalFetch)?;
        self.client
            .decode_blob(&encoded_blob)
            .map_err(StoreError::Decoding)
    }
}
