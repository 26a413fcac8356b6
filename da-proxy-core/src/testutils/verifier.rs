// std
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
// crates
use async_trait::async_trait;
// internal
use super::{commitment_for, Call, CallJournal};
use crate::da::{Certificate, CommitmentVerifier, G1Commitment, VerifierError};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CertificateOutcome {
    Confirmed,
    /// Batch found on chain but the confirmation depth is not reached yet.
    Pending,
    Rejected,
}

/// Verifier replaying a script of certificate outcomes, then falling back to a fixed one.
pub struct MockVerifier {
    script: Mutex<VecDeque<CertificateOutcome>>,
    fallback: CertificateOutcome,
    required_depth: u64,
    latency: Duration,
    journal: CallJournal,
}

impl MockVerifier {
    pub fn new(journal: CallJournal) -> Self {
        Self::with_script(journal, [], CertificateOutcome::Confirmed)
    }

    pub fn with_script(
        journal: CallJournal,
        script: impl IntoIterator<Item = CertificateOutcome>,
        fallback: CertificateOutcome,
    ) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            required_depth: 6,
            latency: Duration::ZERO,
            journal,
        }
    }

    /// Answer every certificate verification only after `latency`, like a slow chain RPC.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// `pending` depth-not-reached answers followed by confirmation.
    pub fn pending_then_confirmed(journal: CallJournal, pending: usize) -> Self {
        Self::with_script(
            journal,
            std::iter::repeat(CertificateOutcome::Pending).take(pending),
            CertificateOutcome::Confirmed,
        )
    }
}

#[async_trait]
impl CommitmentVerifier for MockVerifier {
    fn verify_commitment(
        &self,
        commitment: &G1Commitment,
        encoded_blob: &[u8],
    ) -> Result<(), VerifierError> {
        self.journal.record(Call::VerifyCommitment);
        if commitment_for(encoded_blob) == *commitment {
            Ok(())
        } else {
            Err(VerifierError::CommitmentMismatch)
        }
    }

    async fn verify_certificate(&self, certificate: &Certificate) -> Result<(), VerifierError> {
        self.journal.record(Call::VerifyCertificate);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        match outcome {
            CertificateOutcome::Confirmed => Ok(()),
            CertificateOutcome::Pending => Err(VerifierError::ConfirmationDepthPending {
                batch_id: certificate.batch.batch_id,
                required_depth: self.required_depth,
            }),
            CertificateOutcome::Rejected => Err(VerifierError::Other(
                "inclusion proof does not match the batch root".into(),
            )),
        }
    }
}
