//! File-per-document store

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;

use crate::{DocumentStore, PersistenceError, Result};

const DOC_EXTENSION: &str = "doc";
const TEMP_EXTENSION: &str = "tmp";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Stores each document as `<base>/<percent-encoded key>.doc`.
///
/// Writes go to a sibling temporary file that is renamed over the target, so
/// a reader never observes a half-written document. Every write gets its own
/// temporary name, so overlapping writes of one key never share a file; the
/// last rename wins. The temporary file is removed when the write or rename
/// fails.
#[derive(Debug, Clone)]
pub struct DiskDocumentStore {
    base_path: PathBuf,
}

impl DiskDocumentStore {
    /// Create new disk storage with base path
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(PersistenceError::invalid_key(key));
        }
        let file_name = format!("{}.{}", urlencoding::encode(key), DOC_EXTENSION);
        Ok(self.base_path.join(file_name))
    }

    async fn ensure_base_dir(&self) -> Result<()> {
        if !fs::try_exists(&self.base_path).await? {
            fs::create_dir_all(&self.base_path).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for DiskDocumentStore {
    async fn get_doc(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.key_path(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn store_doc(&self, key: &str, doc: &[u8]) -> Result<()> {
        self.ensure_base_dir().await?;

        let path = self.key_path(key)?;
        let temp_path = path.with_extension(format!(
            "{}.{}-{}.{}",
            DOC_EXTENSION,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
            TEMP_EXTENSION
        ));

        let written = match fs::write(&temp_path, doc).await {
            Ok(()) => fs::rename(&temp_path, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %temp_path.display(),
                        "Failed to remove temporary document: {}",
                        cleanup
                    );
                }
            }
            return Err(e.into());
        }
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        if !fs::try_exists(&self.base_path).await? {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(true, |ext| ext != DOC_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match urlencoding::decode(stem) {
                Ok(key) if key.starts_with(prefix) => keys.push(key.into_owned()),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(file = %path.display(), "Skipping undecodable document name: {}", e)
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn name(&self) -> &str {
        "disk"
    }
}
