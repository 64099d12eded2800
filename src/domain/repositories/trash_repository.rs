use async_trait::async_trait;

use crate::common::errors::Result;
use crate::domain::entities::trash_entry::TrashEntry;

/// Persistence port for the trash queue.
///
/// The queue is stored under two keys: the ordered entry list and the
/// capacity limit. `Ok(None)` means the key has never been written.
#[async_trait]
pub trait TrashRepository: Send + Sync {
    async fn load_entries(&self) -> Result<Option<Vec<TrashEntry>>>;
    async fn save_entries(&self, entries: &[TrashEntry]) -> Result<()>;
    async fn load_limit(&self) -> Result<Option<usize>>;
    async fn save_limit(&self, limit: usize) -> Result<()>;
}
