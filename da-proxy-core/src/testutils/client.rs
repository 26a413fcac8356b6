// std
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
// crates
use async_trait::async_trait;
// internal
use super::{commitment_for, keccak, Call, CallJournal};
use crate::da::codec::BYTES_PER_FIELD_ELEMENT;
use crate::da::{
    BatchHeaderHash, BatchReference, BlobCodec, Certificate, DaClient, DefaultBlobCodec,
};
use crate::DynError;

/// DA network that keeps every dispersed blob in memory, one blob per batch.
pub struct MockDaClient {
    codec: DefaultBlobCodec,
    blobs: Mutex<HashMap<(BatchHeaderHash, u32), Vec<u8>>>,
    next_batch: AtomicU32,
    journal: CallJournal,
    fail_dispersal: AtomicBool,
    tamper_commitment: AtomicBool,
    oversized_proofs: AtomicBool,
}

impl MockDaClient {
    pub fn new(journal: CallJournal) -> Self {
        Self {
            codec: DefaultBlobCodec,
            blobs: Mutex::new(HashMap::new()),
            next_batch: AtomicU32::new(1),
            journal,
            fail_dispersal: AtomicBool::new(false),
            tamper_commitment: AtomicBool::new(false),
            oversized_proofs: AtomicBool::new(false),
        }
    }

    pub fn fail_dispersal(&self, fail: bool) {
        self.fail_dispersal.store(fail, Ordering::SeqCst);
    }

    /// Hand out certificates whose commitment does not match the dispersed blob.
    pub fn tamper_commitment(&self, tamper: bool) {
        self.tamper_commitment.store(tamper, Ordering::SeqCst);
    }

    /// Hand out certificates whose inclusion proof is too large to fit in a key.
    pub fn oversized_proofs(&self, oversized: bool) {
        self.oversized_proofs.store(oversized, Ordering::SeqCst);
    }

    /// Drop every stored blob, as if the network had pruned them.
    pub fn forget_blobs(&self) {
        self.blobs.lock().unwrap().clear();
    }
}

#[async_trait]
impl DaClient for MockDaClient {
    type Codec = DefaultBlobCodec;

    fn codec(&self) -> &Self::Codec {
        &self.codec
    }

    async fn disperse(&self, data: &[u8]) -> Result<Certificate, DynError> {
        self.journal.record(Call::Disperse);
        if self.fail_dispersal.load(Ordering::SeqCst) {
            return Err("disperser rejected the blob".into());
        }
        let encoded = self.codec.encode(data)?;
        let mut commitment = commitment_for(&encoded);
        if self.tamper_commitment.load(Ordering::SeqCst) {
            commitment.x[0] ^= 0xff;
        }
        let inclusion_proof = if self.oversized_proofs.load(Ordering::SeqCst) {
            vec![0xaa; 1 << 17]
        } else {
            keccak(&encoded).to_vec()
        };
        let batch_id = self.next_batch.fetch_add(1, Ordering::SeqCst);
        let batch_header_hash = keccak(&batch_id.to_be_bytes());
        let certificate = Certificate {
            batch: BatchReference {
                batch_id,
                batch_header_hash,
                confirmation_block_number: 1_000 + batch_id,
            },
            blob_index: 0,
            commitment,
            data_length: (encoded.len() / BYTES_PER_FIELD_ELEMENT) as u32,
            inclusion_proof,
        };
        self.blobs
            .lock()
            .unwrap()
            .insert((batch_header_hash, 0), encoded);
        Ok(certificate)
    }

    async fn retrieve(
        &self,
        batch_header_hash: &BatchHeaderHash,
        blob_index: u32,
    ) -> Result<Vec<u8>, DynError> {
        self.journal.record(Call::Retrieve);
        self.blobs
            .lock()
            .unwrap()
            .get(&(*batch_header_hash, blob_index))
            .cloned()
            .ok_or_else(|| format!("blob {blob_index} not found in batch").into())
    }
}
