//! Filesystem store for uploaded file bytes

use bytes::Bytes;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Stores uploaded files under a single directory, one file per key
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Directory holding the blobs
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a new store, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Storage directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Key for a new upload: `{file_id}_{sanitized filename}`
    pub fn storage_key(file_id: Uuid, filename: &str) -> String {
        let base = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let safe: String = base
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if safe.is_empty() {
            file_id.to_string()
        } else {
            format!("{}_{}", file_id, safe)
        }
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(Error::internal(format!("Invalid storage key: {}", key)));
        }
        Ok(self.root.join(key))
    }

    /// Write bytes under `key`
    pub async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path(key)?;
        tokio::fs::write(&path, data).await?;
        tracing::debug!(key, bytes = data.len(), "blob stored");
        Ok(())
    }

    /// Read the bytes stored under `key`
    pub async fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.path(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::FileNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Whether `key` exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }
}
