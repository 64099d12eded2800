use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use crate::application::ports::collection_ports::CollectionService;
use crate::application::services::remote::bounded;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::trash_entry::{TrashEntry, TrashStub};
use crate::domain::repositories::trash_repository::TrashRepository;

/// Trash queue shared by every entry point of the application
pub type SharedTrashQueue = Arc<Mutex<TrashQueue>>;

/// Result of a soft delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SoftDeleteOutcome {
    /// Entries actually added (duplicates are skipped)
    pub added: usize,
    /// Entries evicted for capacity and deleted on the server
    pub evicted: usize,
    /// Whether the resulting state was persisted
    pub persisted: bool,
}

/// Result of emptying the trash
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyOutcome {
    pub deleted: usize,
    pub failed: usize,
}

/// Bounded queue of soft-deleted items.
///
/// Ordered by insertion, oldest first. Every mutation is written through the
/// repository; if a write fails the change stays in memory and the next
/// successful write reconciles it.
pub struct TrashQueue {
    entries: VecDeque<TrashEntry>,
    index: HashSet<String>,
    last_batch: Vec<String>,
    limit: usize,
    repository: Arc<dyn TrashRepository>,
    service: Arc<dyn CollectionService>,
    timeout: Duration,
    dirty: bool,
    limit_dirty: bool,
}

impl TrashQueue {
    /// Creates an empty queue without reading storage
    pub fn new(
        repository: Arc<dyn TrashRepository>,
        service: Arc<dyn CollectionService>,
        limit: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            entries: VecDeque::new(),
            index: HashSet::new(),
            last_batch: Vec::new(),
            limit: limit.max(1),
            repository,
            service,
            timeout,
            dirty: false,
            limit_dirty: false,
        }
    }

    /// Loads the persisted queue; missing or corrupt data yields an empty queue
    #[instrument(skip(repository, service))]
    pub async fn load(
        repository: Arc<dyn TrashRepository>,
        service: Arc<dyn CollectionService>,
        default_limit: usize,
        timeout: Duration,
    ) -> Self {
        let mut queue = Self::new(repository.clone(), service, default_limit, timeout);

        match repository.load_limit().await {
            Ok(Some(limit)) if limit > 0 => queue.limit = limit,
            Ok(Some(_)) => warn!("Ignoring persisted trash limit of 0"),
            Ok(None) => debug!("No persisted trash limit, using {}", default_limit),
            Err(e) => warn!("Failed to load trash limit, using default: {}", e),
        }

        let entries = match repository.load_entries().await {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load trash entries, starting empty: {}", e);
                Vec::new()
            }
        };

        for entry in entries {
            if queue.index.insert(entry.id.clone()) {
                queue.entries.push_back(entry);
            } else {
                warn!("Dropping duplicate persisted trash entry {}", entry.id);
            }
        }

        info!("Loaded trash queue with {} entries (limit {})", queue.entries.len(), queue.limit);
        queue
    }

    /// Wraps the queue for sharing between views
    pub fn into_shared(self) -> SharedTrashQueue {
        Arc::new(Mutex::new(self))
    }

    /// Moves the ids not already in the trash into it.
    ///
    /// `resolve_stub` supplies name and preview and may return
    /// `TrashStub::unknown()` for ids without local metadata. The batch is
    /// persisted and then pruned, so on return the length never exceeds the
    /// limit.
    #[instrument(skip(self, ids, resolve_stub), fields(batch = ids.len()))]
    pub async fn soft_delete<F>(&mut self, ids: &[String], mut resolve_stub: F) -> SoftDeleteOutcome
    where
        F: FnMut(&str) -> TrashStub,
    {
        let mut batch = Vec::new();
        for id in ids {
            if self.index.contains(id) {
                debug!("Item {} already in trash, skipping", id);
                continue;
            }
            let entry = TrashEntry::new(id.clone(), resolve_stub(id));
            self.index.insert(id.clone());
            self.entries.push_back(entry);
            batch.push(id.clone());
        }

        let added = batch.len();
        if added > 0 {
            self.last_batch = batch;
        }

        self.persist().await;
        let evicted = self.prune().await;

        info!("Moved {} items to trash ({} evicted)", added, evicted);
        SoftDeleteOutcome {
            added,
            evicted,
            persisted: !self.is_dirty(),
        }
    }

    /// Evicts the oldest entries while the limit is exceeded.
    ///
    /// Each eviction attempts a permanent delete; on failure the entry is
    /// dropped from the queue anyway and the failure is only logged.
    pub async fn prune(&mut self) -> usize {
        let mut evicted = 0;

        while self.entries.len() > self.limit {
            let Some(entry) = self.entries.pop_front() else {
                break;
            };
            self.index.remove(&entry.id);
            self.last_batch.retain(|id| id != &entry.id);

            self.delete_remote(&entry.id).await;
            evicted += 1;
        }

        if evicted > 0 {
            debug!("Pruned {} trash entries down to limit {}", evicted, self.limit);
            self.persist().await;
        }

        evicted
    }

    /// Takes out the newest entry without deleting it on the server
    pub async fn undo_last(&mut self) -> Option<TrashEntry> {
        let entry = self.entries.pop_back()?;
        self.index.remove(&entry.id);
        self.last_batch.retain(|id| id != &entry.id);
        self.persist().await;

        debug!("Undid trash entry {}", entry.id);
        Some(entry)
    }

    /// Undoes whatever is left of the last batch
    pub async fn undo_last_batch(&mut self) -> Vec<TrashEntry> {
        let batch: HashSet<String> = std::mem::take(&mut self.last_batch).into_iter().collect();
        if batch.is_empty() {
            return Vec::new();
        }

        let restored = self.take_where(|entry| batch.contains(&entry.id));
        if !restored.is_empty() {
            self.persist().await;
        }
        restored
    }

    /// Takes the given ids out of the trash, in any order
    pub async fn restore(&mut self, ids: &[String]) -> Vec<TrashEntry> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let restored = self.take_where(|entry| wanted.contains(entry.id.as_str()));

        if !restored.is_empty() {
            self.last_batch.retain(|id| !wanted.contains(id.as_str()));
            self.persist().await;
        }
        restored
    }

    /// Permanently deletes every entry and clears the queue
    #[instrument(skip(self))]
    pub async fn empty_all(&mut self) -> EmptyOutcome {
        let entries: Vec<TrashEntry> = self.entries.drain(..).collect();
        self.index.clear();
        self.last_batch.clear();

        let mut outcome = EmptyOutcome::default();
        for entry in &entries {
            if self.delete_remote(&entry.id).await {
                outcome.deleted += 1;
            } else {
                outcome.failed += 1;
            }
        }

        self.persist().await;
        info!("Emptied trash: {} deleted, {} failed", outcome.deleted, outcome.failed);
        outcome
    }

    /// Changes the capacity. Nothing is pruned now; the new limit applies on
    /// the next soft delete. A failed write is retried with the next one.
    pub async fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit == 0 {
            return Err(DomainError::validation_error("Trash", "Trash limit must be at least 1"));
        }

        self.limit = limit;
        self.persist_limit().await;
        Ok(())
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &TrashEntry> {
        self.entries.iter()
    }

    /// Ids of the last batch still in the trash
    pub fn last_batch(&self) -> &[String] {
        &self.last_batch
    }

    /// True while entries or the limit have unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.limit_dirty
    }

    fn take_where<P>(&mut self, mut predicate: P) -> Vec<TrashEntry>
    where
        P: FnMut(&TrashEntry) -> bool,
    {
        let mut taken = Vec::new();
        let mut kept = VecDeque::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            if predicate(&entry) {
                taken.push(entry);
            } else {
                kept.push_back(entry);
            }
        }
        self.entries = kept;
        for entry in &taken {
            self.index.remove(&entry.id);
        }
        taken
    }

    /// Best-effort permanent delete; `NotFound` counts as success
    async fn delete_remote(&self, id: &str) -> bool {
        let result = bounded(self.timeout, "permanent_delete", self.service.permanent_delete(id)).await;
        match result {
            Ok(()) => {
                debug!("Permanently deleted {}", id);
                true
            }
            Err(e) if e.is_not_found() => {
                debug!("Item {} already gone on the server", id);
                true
            }
            Err(e) => {
                error!("Permanent delete of {} failed, dropping from trash anyway: {}", id, e);
                false
            }
        }
    }

    async fn persist_limit(&mut self) -> bool {
        match self.repository.save_limit(self.limit).await {
            Ok(()) => {
                self.limit_dirty = false;
                true
            }
            Err(e) => {
                warn!("Failed to persist trash limit {}: {}", self.limit, e);
                self.limit_dirty = true;
                false
            }
        }
    }

    async fn persist(&mut self) -> bool {
        if self.limit_dirty {
            self.persist_limit().await;
        }

        let snapshot: Vec<TrashEntry> = self.entries.iter().cloned().collect();
        match self.repository.save_entries(&snapshot).await {
            Ok(()) => {
                self.dirty = false;
                true
            }
            Err(e) => {
                warn!("Failed to persist trash queue ({} entries): {}", snapshot.len(), e);
                self.dirty = true;
                false
            }
        }
    }
}
