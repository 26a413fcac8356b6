pub mod archive;
pub mod backends;
pub mod errors;
mod types;

// crates
use async_trait::async_trait;
use da_proxy_core::da::Locator;
// internal
pub use errors::StoreError;
pub use types::{BackendType, Stats};

/// Capability every backend provides.
#[async_trait]
pub trait Store: Send + Sync {
    /// Current usage metrics of the backend, if it keeps any.
    fn stats(&self) -> Option<Stats>;
    /// Backend type provider of the store.
    fn backend_type(&self) -> BackendType;
    /// Verify that `value` is the data associated with `key`.
    async fn verify(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
}

/// Store that derives the key from the write itself, the caller never chooses it.
#[async_trait]
pub trait KeyGeneratedStore: Store {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError>;
    /// Insert `value` and return the key it can be retrieved with.
    async fn put(&self, value: &[u8]) -> Result<Vec<u8>, StoreError>;
}

/// Key generated store that also keeps a copy of every blob in a secondary archival store.
#[async_trait]
pub trait ArchivedKeyGeneratedStore: KeyGeneratedStore {
    /// Locator of the archived copy of the blob behind `key`.
    async fn archive_locator(&self, key: &[u8]) -> Result<Locator, StoreError>;
    /// Blob behind `key`, served from the archival store instead of the DA network.
    async fn get_from_archive(&self, key: &[u8]) -> Result<Vec<u8>, StoreError>;
}

/// Store where the caller supplies the key, usually a content address.
#[async_trait]
pub trait PrecomputedKeyStore: Store {
    async fn get(&self, key: &[u8]) -> Result<Vec<u8>, StoreError>;
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
}
