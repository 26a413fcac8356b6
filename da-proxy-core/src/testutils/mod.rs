//! Deterministic in-process collaborators for exercising stores without a DA network.
mod archive;
mod client;
mod verifier;

// std
use std::sync::{Arc, Mutex};
// crates
use sha3::{Digest, Keccak256, Sha3_256};
// internal
use crate::da::G1Commitment;
pub use archive::MemoryArchive;
pub use client::MockDaClient;
pub use verifier::{CertificateOutcome, MockVerifier};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Disperse,
    Retrieve,
    VerifyCommitment,
    VerifyCertificate,
    ArchiveStore,
    ArchiveLookup,
    ArchiveFetch,
}

/// Ordered record of collaborator calls, shared between the mocks of one test.
#[derive(Clone, Debug, Default)]
pub struct CallJournal(Arc<Mutex<Vec<Call>>>);

impl CallJournal {
    pub fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.0.lock().unwrap().iter().filter(|c| **c == call).count()
    }

    /// Position of the first occurrence of `call`, if any.
    pub fn position(&self, call: Call) -> Option<usize> {
        self.0.lock().unwrap().iter().position(|c| *c == call)
    }
}

/// Stand-in for a KZG commitment: binds both coordinates to the encoded bytes.
pub fn commitment_for(encoded_blob: &[u8]) -> G1Commitment {
    G1Commitment {
        x: Keccak256::digest(encoded_blob).into(),
        y: Sha3_256::digest(encoded_blob).into(),
    }
}

pub(crate) fn keccak(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}
