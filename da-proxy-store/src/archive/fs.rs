// std
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
// crates
use async_trait::async_trait;
use da_proxy_core::da::{ArchivalClient, Certificate, Locator};
use da_proxy_core::DynError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncReadExt, AsyncWriteExt},
};
// internal

const BLOBS_DIR: &str = "blobs";
const INDEX_DIR: &str = "index";
const TEMP_SUFFIX: &str = ".tmp";

#[derive(Debug, thiserror::Error)]
pub enum FsArchiveError {
    #[error("no archived blob for certificate {0}")]
    NotArchived(String),
    #[error("no archived blob at locator {0}")]
    UnknownLocator(Locator),
    #[error("malformed locator {0}")]
    MalformedLocator(Locator),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FsArchiveSettings {
    pub base_dir: PathBuf,
}

/// Archival store on the local filesystem.
///
/// Encoded blobs are content addressed under `<base>/blobs/<keccak256(blob)>`, and
/// `<base>/index/<certificate id>` holds the locator of the blob a certificate was issued for.
pub struct FsArchive {
    blobs_dir: PathBuf,
    index_dir: PathBuf,
}

impl FsArchive {
    pub fn new(settings: FsArchiveSettings) -> Self {
        Self {
            blobs_dir: settings.base_dir.join(BLOBS_DIR),
            index_dir: settings.base_dir.join(INDEX_DIR),
        }
    }

    fn locator_of(encoded_blob: &[u8]) -> Locator {
        Locator::new(hex::encode(Keccak256::digest(encoded_blob)))
    }

    fn blob_path(&self, locator: &Locator) -> Result<PathBuf, FsArchiveError> {
        // locators end up in a path, only accept what `locator_of` produces
        let valid = locator.as_str().len() == 64
            && locator.as_str().bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(FsArchiveError::MalformedLocator(locator.clone()));
        }
        Ok(self.blobs_dir.join(locator.as_str()))
    }

    fn index_path(&self, certificate: &Certificate) -> PathBuf {
        self.index_dir.join(hex::encode(certificate.id()))
    }
}

async fn read_file(path: &Path) -> Result<Option<Vec<u8>>, std::io::Error> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            tracing::error!("Failed to open file {}: {e}", path.display());
            return Err(e);
        }
    };

    let mut contents = vec![];
    file.read_to_end(&mut contents).await?;
    Ok(Some(contents))
}

/// Write `data` beside `path` and rename it into place, so readers never see a partial file.
async fn write_file(path: &Path, data: &[u8]) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let temp = temp_path(path);
    let written = async {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp)
            .await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        tokio::fs::rename(&temp, path).await
    }
    .await;

    if written.is_err() {
        if let Err(e) = tokio::fs::remove_file(&temp).await {
            tracing::warn!("Failed to remove temporary file {}: {e}", temp.display());
        }
    }
    written
}

fn temp_path(path: &Path) -> PathBuf {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(format!(
        ".{}.{}{TEMP_SUFFIX}",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    path.with_file_name(name)
}

#[async_trait]
impl ArchivalClient for FsArchive {
    async fn store(&self, certificate: &Certificate, encoded_blob: &[u8]) -> Result<(), DynError> {
        let locator = Self::locator_of(encoded_blob);
        let blob_path = self.blob_path(&locator)?;
        write_file(&blob_path, encoded_blob).await?;
        // the index entry goes last so a locator never points to a missing blob
        write_file(&self.index_path(certificate), locator.as_str().as_bytes()).await?;
        tracing::debug!(cert = %certificate.log_key(), %locator, "Archived encoded blob");
        Ok(())
    }

    async fn locator_for(&self, certificate: &Certificate) -> Result<Locator, DynError> {
        let entry = read_file(&self.index_path(certificate))
            .await?
            .ok_or_else(|| FsArchiveError::NotArchived(certificate.log_key()))?;
        let locator = String::from_utf8(entry).map_err(|e| {
            FsArchiveError::MalformedLocator(Locator::new(
                String::from_utf8_lossy(e.as_bytes()).into_owned(),
            ))
        })?;
        Ok(Locator::from(locator))
    }

    async fn fetch(&self, locator: &Locator) -> Result<Vec<u8>, DynError> {
        let path = self.blob_path(locator)?;
        read_file(&path)
            .await?
            .ok_or_else(|| FsArchiveError::UnknownLocator(locator.clone()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use da_proxy_core::da::{BatchReference, G1Commitment};
    use rand::{thread_rng, RngCore};
    use tempfile::TempDir;

    fn certificate(blob_index: u32) -> Certificate {
        Certificate {
            batch: BatchReference {
                batch_id: 1,
                batch_header_hash: [9; 32],
                confirmation_block_number: 10,
            },
            blob_index,
            commitment: G1Commitment {
                x: [0; 32],
                y: [0; 32],
            },
            data_length: 1,
            inclusion_proof: vec![],
        }
    }

    fn archive(dir: &TempDir) -> FsArchive {
        FsArchive::new(FsArchiveSettings {
            base_dir: dir.path().to_path_buf(),
        })
    }

    #[tokio::test]
    async fn store_lookup_fetch() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir);
        let mut blob = vec![0u8; 1024];
        thread_rng().fill_bytes(&mut blob);

        archive.store(&certificate(0), &blob).await.unwrap();
        let locator = archive.locator_for(&certificate(0)).await.unwrap();
        assert_eq!(locator, FsArchive::locator_of(&blob));
        assert_eq!(archive.fetch(&locator).await.unwrap(), blob);
    }

    #[tokio::test]
    async fn unknown_certificate_is_not_found() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir);
        archive.store(&certificate(0), b"blob").await.unwrap();

        let err = archive.locator_for(&certificate(1)).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FsArchiveError>(),
            Some(FsArchiveError::NotArchived(_))
        ));
    }

    #[tokio::test]
    async fn unknown_locator_is_not_found() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir);
        let locator = FsArchive::locator_of(b"never stored");

        let err = archive.fetch(&locator).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FsArchiveError>(),
            Some(FsArchiveError::UnknownLocator(_))
        ));
    }

    #[tokio::test]
    async fn path_like_locators_are_rejected() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir);

        let err = archive
            .fetch(&Locator::new("../index/secret"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FsArchiveError>(),
            Some(FsArchiveError::MalformedLocator(_))
        ));
    }

    #[tokio::test]
    async fn rewrites_leave_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir);
        archive.store(&certificate(0), b"first").await.unwrap();
        archive.store(&certificate(0), b"second").await.unwrap();

        let locator = archive.locator_for(&certificate(0)).await.unwrap();
        assert_eq!(archive.fetch(&locator).await.unwrap(), b"second");
        for sub in [BLOBS_DIR, INDEX_DIR] {
            for entry in std::fs::read_dir(dir.path().join(sub)).unwrap() {
                let name = entry.unwrap().file_name().into_string().unwrap();
                assert!(!name.ends_with(TEMP_SUFFIX), "leftover {name}");
                assert_eq!(name.len(), 64);
            }
        }
    }

    #[tokio::test]
    async fn interrupted_write_is_invisible() {
        let dir = TempDir::new().unwrap();
        let archive = archive(&dir);
        archive.store(&certificate(0), b"complete").await.unwrap();
        let locator = archive.locator_for(&certificate(0)).await.unwrap();
        // what a crash between create and rename leaves behind
        let blob_path = archive.blob_path(&locator).unwrap();
        std::fs::write(temp_path(&blob_path), b"comp").unwrap();

        assert_eq!(archive.fetch(&locator).await.unwrap(), b"complete");
    }

    #[tokio::test]
    async fn survives_reopening() {
        let dir = TempDir::new().unwrap();
        archive(&dir)
            .store(&certificate(4), b"persisted")
            .await
            .unwrap();

        let reopened = archive(&dir);
        let locator = reopened.locator_for(&certificate(4)).await.unwrap();
        assert_eq!(reopened.fetch(&locator).await.unwrap(), b"persisted");
    }
}
