//! File storage for uploaded images and design thumbnails.
//!
//! Callers validate uploads first; storage only writes bytes and returns the
//! public URL they are served from.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::config::MediaConfig;

/// Errors that can occur while storing a file.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage directory: {0}")]
    InvalidDirectory(String),

    #[error("invalid file extension: {0}")]
    InvalidExtension(String),
}

/// A file received in a multipart request.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::try_from(self.bytes.len()).unwrap_or(u64::MAX)
    }
}

/// Somewhere uploaded bytes can be kept.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store `bytes` under `directory` with a fresh name ending in
    /// `extension`, returning the public URL.
    ///
    /// The extension comes from the detected file type, never from the
    /// client's filename.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the file cannot be written or the extension
    /// is not a short alphanumeric token.
    async fn save(
        &self,
        directory: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError>;
}

/// A collision-free stored name with the given extension.
fn stored_name(extension: &str) -> Result<String, StorageError> {
    let valid = !extension.is_empty()
        && extension.len() <= 5
        && extension.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if !valid {
        return Err(StorageError::InvalidExtension(extension.to_owned()));
    }
    Ok(format!("{}.{extension}", Uuid::new_v4().simple()))
}

fn check_directory(directory: &str) -> Result<(), StorageError> {
    let valid = !directory.is_empty()
        && directory
            .split('/')
            .all(|part| !part.is_empty() && part != ".." && part != ".");
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidDirectory(directory.to_owned()))
    }
}

/// Files on the local filesystem under the media root.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    url_prefix: String,
}

impl LocalFileStorage {
    #[must_use]
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            url_prefix: config.url_prefix.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save(
        &self,
        directory: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        check_directory(directory)?;
        let name = stored_name(extension)?;
        let dir = self.root.join(directory);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), bytes).await?;
        tracing::debug!(directory, file = %name, size = bytes.len(), "Stored upload");
        Ok(format!("{}/{directory}/{name}", self.url_prefix))
    }
}

/// Files kept in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryFileStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStorage {
    /// Bytes stored at `url`.
    #[must_use]
    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.files.lock().get(url).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn save(
        &self,
        directory: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        check_directory(directory)?;
        let url = format!("/media/{directory}/{}", stored_name(extension)?);
        self.files.lock().insert(url.clone(), bytes.to_vec());
        Ok(url)
    }
}
