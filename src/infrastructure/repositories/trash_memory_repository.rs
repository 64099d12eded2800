use std::sync::RwLock;

use async_trait::async_trait;

use crate::common::errors::{DomainError, Result};
use crate::domain::entities::trash_entry::TrashEntry;
use crate::domain::repositories::trash_repository::TrashRepository;

/// In-process trash store, used when nothing should touch the disk
#[derive(Default)]
pub struct TrashMemoryRepository {
    entries: RwLock<Option<Vec<TrashEntry>>>,
    limit: RwLock<Option<usize>>,
}

impl TrashMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> DomainError {
        DomainError::internal_error("Trash", "Trash store lock poisoned")
    }
}

#[async_trait]
impl TrashRepository for TrashMemoryRepository {
    async fn load_entries(&self) -> Result<Option<Vec<TrashEntry>>> {
        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        Ok(entries.clone())
    }

    async fn save_entries(&self, entries: &[TrashEntry]) -> Result<()> {
        let mut stored = self.entries.write().map_err(|_| Self::poisoned())?;
        *stored = Some(entries.to_vec());
        Ok(())
    }

    async fn load_limit(&self) -> Result<Option<usize>> {
        let limit = self.limit.read().map_err(|_| Self::poisoned())?;
        Ok(*limit)
    }

    async fn save_limit(&self, limit: usize) -> Result<()> {
        let mut stored = self.limit.write().map_err(|_| Self::poisoned())?;
        *stored = Some(limit);
        Ok(())
    }
}
