//! # Blob Storage
//!
//! The archival half of dual-store persistence: accepted payloads are written
//! as JSON documents under a per-source directory. The blob copy is a
//! durability nicety, not the system of record; the ingest pipeline logs and
//! continues when a write fails.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while writing a blob.
#[derive(Debug, Error)]
pub enum BlobError {
    #[error("failed to write blob {file_name}: {source}")]
    Io {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Location of a successfully written blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Directory holding the document
    pub file_path: String,
    /// File name within that directory
    pub file_name: String,
}

/// Destination for archival copies of accepted payloads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `contents` under the source's directory as `file_name`.
    async fn put(
        &self,
        source_id: Uuid,
        file_name: &str,
        contents: &[u8],
    ) -> Result<StoredBlob, BlobError>;
}

/// Filesystem-backed blob store rooted at a configured directory.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. Directories are created lazily per
    /// source on first write.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(
        &self,
        source_id: Uuid,
        file_name: &str,
        contents: &[u8],
    ) -> Result<StoredBlob, BlobError> {
        let dir = self.root.join(source_id.to_string());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| BlobError::Io {
                file_name: file_name.to_string(),
                source,
            })?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| BlobError::Io {
                file_name: file_name.to_string(),
                source,
            })?;

        Ok(StoredBlob {
            file_path: dir.to_string_lossy().into_owned(),
            file_name: file_name.to_string(),
        })
    }
}
