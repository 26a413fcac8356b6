// std
use std::fmt::{Display, Formatter};
// crates
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
// internal
use crate::da::Certificate;
use crate::DynError;

/// Identifier of a blob inside the secondary archival store.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Locator(String);

impl Locator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Locator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for Locator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Secondary archival store keeping a copy of every confirmed encoded blob.
#[async_trait]
pub trait ArchivalClient: Send + Sync {
    async fn store(&self, certificate: &Certificate, encoded_blob: &[u8]) -> Result<(), DynError>;

    async fn locator_for(&self, certificate: &Certificate) -> Result<Locator, DynError>;

    async fn fetch(&self, locator: &Locator) -> Result<Vec<u8>, DynError>;
}
