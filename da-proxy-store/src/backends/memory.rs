// std
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
// crates
use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use sha3::{Digest, Keccak256};
use tracing::debug;
// internal
use crate::{BackendType, PrecomputedKeyStore, Stats, Store, StoreError};

#[serde_as]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStoreSettings {
    pub max_capacity: u64,
    /// Entries are evicted this long after they were inserted.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub expiration: Duration,
}

/// Content addressed store kept in process memory, keys are keccak256 of the value.
pub struct MemoryStore {
    cache: Cache<Vec<u8>, Vec<u8>>,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new(settings: MemoryStoreSettings) -> Self {
        let MemoryStoreSettings {
            max_capacity,
            expiration,
        } = settings;
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(expiration)
            .build();
        Self {
            cache,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn key_for(value: &[u8]) -> Vec<u8> {
        Keccak256::digest(value).to_vec()
    }

    /// Apply pending evictions and insertions so `stats` reflects them.
    pub async fn sync(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn stats(&self) -> Option<Stats> {
        Some(Stats {
            entries: self.cache.entry_count() as usize,
            reads: self.reads.load(Ordering::Relaxed),
        })
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Memory
    }

    async fn verify(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        if Self::key_for(value) == key {
            Ok(())
        } else {
            Err(StoreError::KeyMismatch)
        }
    }
}

#[async_trait]
impl PrecomputedKeyStore for MemoryStore {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        let value = self
            .cache
            .get(key)
            .await
            .ok_or_else(|| StoreError::KeyNotFound(hex::encode(key)))?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(value)
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        debug!(key = %hex::encode(key), len = value.len(), "Storing value in memory");
        self.cache.insert(key.to_vec(), value.to_vec()).await;
        Ok(())
    }
}
