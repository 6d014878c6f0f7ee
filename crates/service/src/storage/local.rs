use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use super::{check_extension, StorageError};

/// Upload directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    max_bytes: u64,
}

/// A completed upload.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Client-supplied name, used for `Content-Disposition` on download.
    pub original_name: String,
    pub path: PathBuf,
    /// Lowercase extension without the dot.
    pub file_type: String,
    pub size: u64,
}

/// An upload in progress. Dropping it without [`PendingUpload::finish`] leaves a
/// partial file; call [`PendingUpload::abort`] on every error path.
pub struct PendingUpload {
    file: fs::File,
    original_name: String,
    path: PathBuf,
    file_type: String,
    written: u64,
    limit: u64,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self { root: root.into(), max_bytes }
    }

    pub fn max_bytes(&self) -> u64 { self.max_bytes }

    /// `file-<unix millis>-<random>.<ext>`
    fn generate_name(ext: &str) -> String {
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        format!("file-{}-{}.{}", Utc::now().timestamp_millis(), suffix, ext)
    }

    /// Validate the name and open a fresh destination file.
    pub async fn begin(&self, original_name: &str) -> Result<PendingUpload, StorageError> {
        let file_type = check_extension(original_name)?;
        fs::create_dir_all(&self.root).await?;
        let path = self.root.join(Self::generate_name(&file_type));
        let file = fs::OpenOptions::new().write(true).create_new(true).open(&path).await?;
        debug!(path = %path.display(), "upload_started");
        Ok(PendingUpload {
            file,
            original_name: original_name.to_string(),
            path,
            file_type,
            written: 0,
            limit: self.max_bytes,
        })
    }

    /// Store a whole buffer in one go.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredFile, StorageError> {
        let mut upload = self.begin(original_name).await?;
        if let Err(e) = upload.write_chunk(bytes).await {
            upload.abort().await;
            return Err(e);
        }
        upload.finish().await
    }

    /// Delete a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        match fs::remove_file(path.as_ref()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of several files; failures are logged.
    pub async fn remove_all<I, P>(&self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        for p in paths {
            if let Err(e) = self.remove(p.as_ref()).await {
                warn!(path = %p.as_ref().display(), error = %e, "stored_file_remove_failed");
            }
        }
    }
}

impl PendingUpload {
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let next = self.written + chunk.len() as u64;
        if next > self.limit {
            return Err(StorageError::TooLarge { limit: self.limit });
        }
        self.file.write_all(chunk).await?;
        self.written = next;
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StoredFile, StorageError> {
        let flushed = self.file.flush().await;
        if let Err(e) = flushed {
            self.abort().await;
            return Err(e.into());
        }
        Ok(StoredFile {
            original_name: self.original_name,
            path: self.path,
            file_type: self.file_type,
            size: self.written,
        })
    }

    /// Close and delete the partial file.
    pub async fn abort(self) {
        let PendingUpload { file, path, .. } = self;
        drop(file);
        if let Err(e) = fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %e, "partial_upload_remove_failed");
        }
    }
}
