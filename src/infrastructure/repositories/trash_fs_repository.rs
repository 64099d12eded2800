use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};

use crate::common::errors::{DomainError, Result};
use crate::domain::entities::trash_entry::TrashEntry;
use crate::domain::repositories::trash_repository::TrashRepository;

const ENTRIES_FILE: &str = "trash_entries.json";
const LIMIT_FILE: &str = "trash_limit.json";

/// Trash repository backed by the file system.
///
/// Each key lives in its own JSON file inside `trash_dir`.
pub struct TrashFsRepository {
    trash_dir: PathBuf,
    entries_path: PathBuf,
    limit_path: PathBuf,
    save_mutex: Mutex<()>,
}

impl TrashFsRepository {
    pub fn new(trash_dir: impl AsRef<Path>) -> Self {
        let trash_dir = trash_dir.as_ref().to_path_buf();
        Self {
            entries_path: trash_dir.join(ENTRIES_FILE),
            limit_path: trash_dir.join(LIMIT_FILE),
            trash_dir,
            save_mutex: Mutex::new(()),
        }
    }

    pub fn entries_path(&self) -> &Path {
        &self.entries_path
    }

    pub fn limit_path(&self) -> &Path {
        &self.limit_path
    }

    /// Makes sure the trash directory exists
    async fn ensure_trash_dir(&self) -> Result<()> {
        if !fs::try_exists(&self.trash_dir).await.unwrap_or(false) {
            fs::create_dir_all(&self.trash_dir).await
                .map_err(|e| DomainError::persistence(
                    "Trash",
                    format!("Failed to create trash directory {}: {}", self.trash_dir.display(), e)
                ))?;
        }
        Ok(())
    }

    /// Reads and decodes a key; `None` if it was never written
    async fn read_key<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::persistence(
                    "Trash",
                    format!("Failed to read {}: {}", path.display(), e)
                ));
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str::<T>(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                error!("Error parsing {}: {}", path.display(), e);
                // Back up the corrupt file before it gets overwritten
                let backup_path = path.with_extension("json.bak");
                if let Err(copy_err) = fs::copy(path, &backup_path).await {
                    error!("Failed to backup corrupted trash file: {}", copy_err);
                } else {
                    info!("Backed up corrupted trash file to {}", backup_path.display());
                }
                Err(DomainError::persistence(
                    "Trash",
                    format!("Corrupted trash file {}: {}", path.display(), e)
                ).with_source(e))
            }
        }
    }

    /// Writes a key atomically (temp file + rename)
    async fn write_key<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let _lock = self.save_mutex.lock().await;
        self.ensure_trash_dir().await?;

        let json = serde_json::to_string_pretty(value)?;

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &json).await
            .map_err(|e| DomainError::persistence(
                "Trash",
                format!("Failed to write temporary file {}: {}", temp_path.display(), e)
            ))?;

        fs::rename(&temp_path, path).await
            .map_err(|e| DomainError::persistence(
                "Trash",
                format!("Failed to rename {} to {}: {}", temp_path.display(), path.display(), e)
            ))?;

        debug!("Saved {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl TrashRepository for TrashFsRepository {
    #[instrument(skip(self))]
    async fn load_entries(&self) -> Result<Option<Vec<TrashEntry>>> {
        self.read_key(&self.entries_path).await
    }

    #[instrument(skip(self, entries), fields(count = entries.len()))]
    async fn save_entries(&self, entries: &[TrashEntry]) -> Result<()> {
        self.write_key(&self.entries_path, entries).await
    }

    async fn load_limit(&self) -> Result<Option<usize>> {
        self.read_key(&self.limit_path).await
    }

    async fn save_limit(&self, limit: usize) -> Result<()> {
        self.write_key(&self.limit_path, &limit).await
    }
}
