/// Local-directory adapter for [`FileStore`]
///
/// Objects are plain files directly under `root`. Writes go to a temporary
/// file first and are renamed into place, so readers never see a partial
/// image.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

use super::{validate_avatar, validate_key, FileStore, StoredObject};
use crate::error::{DomainError, DomainResult};

#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

fn io_error(action: &str, err: std::io::Error) -> DomainError {
    DomainError::Storage(format!("Failed to {}: {}", action, err))
}

impl LocalFileStore {
    /// Opens the store, creating `root` if needed
    pub async fn open(root: impl Into<PathBuf>) -> DomainResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| io_error("create avatar directory", e))?;

        info!(root = %root.display(), "Local file store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

/// Writes `data` to `temp_path` and renames it onto `path`
///
/// Once the temporary file exists it is removed on every failure.
async fn write_atomically(temp_path: &Path, path: &Path, data: &[u8]) -> DomainResult<()> {
    let file = tokio::fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(temp_path)
        .await
        .map_err(|e| io_error("create object", e))?;

    let result = async {
        let mut file = file;
        file.write_all(data)
            .await
            .map_err(|e| io_error("write object", e))?;
        file.sync_all()
            .await
            .map_err(|e| io_error("sync object", e))?;
        drop(file);

        tokio::fs::rename(temp_path, path)
            .await
            .map_err(|e| io_error("store object", e))
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(temp_path).await;
    }
    result
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn upload(&self, data: Bytes) -> DomainResult<String> {
        let format = validate_avatar(&data)?;
        let key = format!("{}.{}", Uuid::new_v4(), format.extension());

        let path = self.path_for(&key);
        let temp_path = self.root.join(format!(".{}.tmp", key));

        write_atomically(&temp_path, &path, &data).await?;

        debug!(key = %key, bytes = data.len(), "Object stored");
        Ok(key)
    }

    async fn get(&self, key: &str) -> DomainResult<StoredObject> {
        let format = validate_key(key)?;

        match tokio::fs::read(self.path_for(key)).await {
            Ok(data) => Ok(StoredObject {
                data: Bytes::from(data),
                content_type: format.content_type(),
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(DomainError::NotFound(format!("Object '{}' not found", key)))
            }
            Err(e) => Err(io_error("read object", e)),
        }
    }

    async fn remove(&self, key: &str) -> DomainResult<()> {
        validate_key(key)?;

        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => {
                debug!(key, "Object removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(key, "Object already absent");
                Ok(())
            }
            Err(e) => Err(io_error("remove object", e)),
        }
    }
}
