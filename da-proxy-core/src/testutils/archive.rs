// std
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
// crates
use async_trait::async_trait;
// internal
use super::{keccak, Call, CallJournal};
use crate::da::{ArchivalClient, Certificate, CertificateId, Locator};
use crate::DynError;

#[derive(Default)]
struct Failures {
    store: AtomicBool,
    lookup: AtomicBool,
    fetch: AtomicBool,
}

/// Archival store backed by two maps: certificate id to locator, locator to blob.
pub struct MemoryArchive {
    index: Mutex<HashMap<CertificateId, Locator>>,
    blobs: Mutex<HashMap<Locator, Vec<u8>>>,
    failures: Failures,
    journal: CallJournal,
}

impl MemoryArchive {
    pub fn new(journal: CallJournal) -> Self {
        Self {
            index: Mutex::new(HashMap::new()),
            blobs: Mutex::new(HashMap::new()),
            failures: Failures::default(),
            journal,
        }
    }

    pub fn fail_store(&self, fail: bool) {
        self.failures.store.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lookup(&self, fail: bool) {
        self.failures.lookup.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.failures.fetch.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ArchivalClient for MemoryArchive {
    async fn store(&self, certificate: &Certificate, encoded_blob: &[u8]) -> Result<(), DynError> {
        self.journal.record(Call::ArchiveStore);
        if self.failures.store.load(Ordering::SeqCst) {
            return Err("archive unavailable".into());
        }
        let locator = Locator::new(hex::encode(keccak(encoded_blob)));
        self.blobs
            .lock()
            .unwrap()
            .insert(locator.clone(), encoded_blob.to_vec());
        self.index.lock().unwrap().insert(certificate.id(), locator);
        Ok(())
    }

    async fn locator_for(&self, certificate: &Certificate) -> Result<Locator, DynError> {
        self.journal.record(Call::ArchiveLookup);
        if self.failures.lookup.load(Ordering::SeqCst) {
            return Err("archive index unavailable".into());
        }
        self.index
            .lock()
            .unwrap()
            .get(&certificate.id())
            .cloned()
            .ok_or_else(|| format!("no archived blob for {}", certificate.log_key()).into())
    }

    async fn fetch(&self, locator: &Locator) -> Result<Vec<u8>, DynError> {
        self.journal.record(Call::ArchiveFetch);
        if self.failures.fetch.load(Ordering::SeqCst) {
            return Err("archive gateway unavailable".into());
        }
        self.blobs
            .lock()
            .unwrap()
            .get(locator)
            .cloned()
            .ok_or_else(|| format!("no archived blob at {locator}").into())
    }
}
