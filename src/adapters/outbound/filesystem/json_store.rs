use crate::compilation::domain::{Catalog, CompiledRecord};
use crate::ports::outbound::{CatalogStore, CompiledStore};
use crate::shared::error::StoreError;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Maximum store file size (100 MB)
const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// On-disk wrapper written around every snapshot
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotEnvelope<'a, T: ?Sized> {
    revision: Uuid,
    written_at: DateTime<Utc>,
    change_description: &'a str,
    data: &'a T,
}

/// JsonFileStore adapter persisting the catalog and the compiled snapshot as JSON files
///
/// Each write produces a complete new file: the snapshot is serialized into
/// a temporary file next to the target, flushed, then renamed over it, so a
/// reader never sees a half-written snapshot. Files written by hand (without
/// the envelope) are accepted on read.
///
/// # Security
/// - Rejects symbolic links on read and write
/// - Rejects non-regular files
/// - Enforces a maximum file size of 100 MB
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    catalog_path: PathBuf,
    compiled_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(catalog_path: PathBuf, compiled_path: PathBuf) -> Self {
        Self {
            catalog_path,
            compiled_path,
        }
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }

    pub fn compiled_path(&self) -> &Path {
        &self.compiled_path
    }

    /// Reads a snapshot file; a missing file yields `None`
    async fn load<T>(path: PathBuf) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let loaded = tokio::task::spawn_blocking(move || -> Result<Option<T>> {
            let Some(content) = safe_read_file(&path)? else {
                return Ok(None);
            };
            Ok(Some(parse_snapshot(&path, &content)?))
        })
        .await??;
        Ok(loaded)
    }

    async fn store<T>(path: PathBuf, data: &T, change_description: &str) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let envelope = SnapshotEnvelope {
            revision: Uuid::new_v4(),
            written_at: Utc::now(),
            change_description,
            data,
        };
        let content =
            serde_json::to_vec_pretty(&envelope).map_err(|e| StoreError::WriteFailed {
                path: path.clone(),
                details: format!("Failed to serialize snapshot: {}", e),
            })?;

        tokio::task::spawn_blocking(move || write_atomically(&path, &content)).await??;
        Ok(())
    }
}

/// Safely reads a store file with security checks
fn safe_read_file(path: &Path) -> std::result::Result<Option<String>, StoreError> {
    // symlink_metadata does not follow the link
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(StoreError::ReadFailed {
                path: path.to_path_buf(),
                details: format!("Failed to read file metadata: {}", e),
            })
        }
    };

    if metadata.is_symlink() {
        return Err(StoreError::SecurityError {
            path: path.to_path_buf(),
            reason: "Store file is a symbolic link. For security reasons, symbolic links are not allowed.".to_string(),
        });
    }

    if !metadata.is_file() {
        return Err(StoreError::SecurityError {
            path: path.to_path_buf(),
            reason: "Store path is not a regular file".to_string(),
        });
    }

    if metadata.len() > MAX_FILE_SIZE {
        return Err(StoreError::SecurityError {
            path: path.to_path_buf(),
            reason: format!(
                "File size ({} bytes) exceeds maximum allowed size ({} bytes)",
                metadata.len(),
                MAX_FILE_SIZE
            ),
        });
    }

    fs::read_to_string(path)
        .map(Some)
        .map_err(|e| StoreError::ReadFailed {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
}

fn parse_snapshot<T: DeserializeOwned>(
    path: &Path,
    content: &str,
) -> std::result::Result<T, StoreError> {
    let parse_failed = |e: serde_json::Error| StoreError::ParseFailed {
        path: path.to_path_buf(),
        details: e.to_string(),
    };

    let mut value: serde_json::Value = serde_json::from_str(content).map_err(parse_failed)?;
    let is_envelope = value.get("revision").is_some() && value.get("data").is_some();
    let data = if is_envelope {
        value["data"].take()
    } else {
        value
    };
    serde_json::from_value(data).map_err(parse_failed)
}

fn write_atomically(path: &Path, content: &[u8]) -> std::result::Result<(), StoreError> {
    let write_failed = |details: String| StoreError::WriteFailed {
        path: path.to_path_buf(),
        details,
    };

    let parent = match path.parent() {
        Some(parent) if parent != Path::new("") => parent,
        _ => Path::new("."),
    };
    if !parent.is_dir() {
        return Err(write_failed(format!(
            "Parent directory does not exist: {}",
            parent.display()
        )));
    }

    if let Ok(metadata) = fs::symlink_metadata(path) {
        if metadata.is_symlink() {
            return Err(StoreError::SecurityError {
                path: path.to_path_buf(),
                reason: "Store file is a symbolic link. For security reasons, writing to symbolic links is not allowed.".to_string(),
            });
        }
    }

    // Same directory as the target so the rename never crosses file systems
    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| write_failed(format!("Failed to create temporary file: {}", e)))?;
    temp.write_all(content)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| write_failed(e.to_string()))?;
    temp.persist(path)
        .map_err(|e| write_failed(format!("Failed to replace store file: {}", e.error)))?;

    Ok(())
}

#[async_trait]
impl CatalogStore for JsonFileStore {
    async fn read_catalog(&self) -> Result<Catalog> {
        match Self::load(self.catalog_path.clone()).await? {
            Some(catalog) => Ok(catalog),
            None => Err(StoreError::ReadFailed {
                path: self.catalog_path.clone(),
                details: "File not found".to_string(),
            }
            .into()),
        }
    }

    async fn write_catalog(&self, catalog: &Catalog, change_description: &str) -> Result<()> {
        Self::store(self.catalog_path.clone(), catalog, change_description).await
    }
}

#[async_trait]
impl CompiledStore for JsonFileStore {
    async fn read_compiled(&self) -> Result<Option<Vec<CompiledRecord>>> {
        Self::load(self.compiled_path.clone()).await
    }

    async fn write_compiled(
        &self,
        compiled: &[CompiledRecord],
        change_description: &str,
    ) -> Result<()> {
        Self::store(self.compiled_path.clone(), compiled, change_description).await
    }
}
