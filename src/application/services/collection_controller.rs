use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::application::dtos::pagination::PaginationDto;
use crate::application::dtos::snapshot_dto::{count_items, BrowserSnapshot, OperationKind, OperationReport};
use crate::application::dtos::trash_dto::TrashEntryDto;
use crate::application::ports::collection_ports::CollectionService;
use crate::application::services::page_cache::{LoadOutcome, PageCache, PageRequest, PageResponse};
use crate::application::services::remote::bounded;
use crate::application::services::selection_set::SelectionSet;
use crate::application::services::trash_queue::SharedTrashQueue;
use crate::common::config::AppConfig;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::collection::{CollectionKey, ItemFilter};
use crate::domain::entities::item::Item;
use crate::domain::entities::trash_entry::TrashStub;

/// Modifier keys held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickModifiers {
    pub shift: bool,
    pub ctrl: bool,
}

impl ClickModifiers {
    pub const NONE: Self = Self { shift: false, ctrl: false };
    pub const CTRL: Self = Self { shift: false, ctrl: true };
    pub const SHIFT: Self = Self { shift: true, ctrl: false };
}

/// Full-listing fetch issued by select-all, stamped like a page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub key: CollectionKey,
    pub generation: u64,
}

impl ListingRequest {
    pub async fn execute(self, service: &dyn CollectionService, timeout: Duration) -> ListingResponse {
        let result = bounded(timeout, "list_all", service.list_all(&self.key)).await;
        ListingResponse { request: self, result }
    }
}

#[derive(Debug)]
pub struct ListingResponse {
    pub request: ListingRequest,
    pub result: Result<Vec<Item>>,
}

/// Next step of a select-all
#[derive(Debug)]
pub enum SelectAllStep {
    /// Served from the loaded window
    Done(OperationReport),
    /// The host must execute the listing and hand it to `apply_full_listing`
    Fetch(ListingRequest),
}

/// Orchestrates paging, selection and the trash queue for the active collection.
///
/// The page cache and selection live as long as the selected collection and
/// filter; the trash queue is process-wide and shared with other views.
pub struct CollectionController {
    service: Arc<dyn CollectionService>,
    trash: SharedTrashQueue,
    page_cache: PageCache,
    selection: SelectionSet,
    pending_listing: Option<u64>,
    timeout: Duration,
    metadata_lookup_limit: usize,
    snapshot_tx: watch::Sender<BrowserSnapshot>,
}

impl CollectionController {
    pub fn new(service: Arc<dyn CollectionService>, trash: SharedTrashQueue, config: &AppConfig) -> Self {
        let (snapshot_tx, _) = watch::channel(BrowserSnapshot::default());
        Self {
            service,
            trash,
            page_cache: PageCache::new(config.collection.page_size),
            selection: SelectionSet::new(),
            pending_listing: None,
            timeout: config.timeouts.network_timeout(),
            metadata_lookup_limit: config.collection.metadata_lookup_limit,
            snapshot_tx,
        }
    }

    /// Receiver that observes every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<BrowserSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn service(&self) -> Arc<dyn CollectionService> {
        self.service.clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn trash(&self) -> SharedTrashQueue {
        self.trash.clone()
    }

    pub fn page_cache(&self) -> &PageCache {
        &self.page_cache
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    // ---- collection identity -------------------------------------------------

    /// Switches to `collection_id` seen through `filter`, discarding the window,
    /// the selection and any pending fetch results
    #[instrument(skip(self))]
    pub async fn select_collection(&mut self, collection_id: &str, filter: ItemFilter) {
        let key = CollectionKey::new(collection_id, filter);
        info!("Selecting collection {}", key);
        self.page_cache.reset(key);
        self.selection.clear();
        self.pending_listing = None;
        self.publish().await;
    }

    /// Applies a new filter to the active collection
    pub async fn set_filter(&mut self, filter: ItemFilter) -> Result<()> {
        let collection_id = self.page_cache.key()
            .map(|key| key.collection_id.clone())
            .ok_or_else(|| DomainError::validation_error("Collection", "No collection selected"))?;

        self.select_collection(&collection_id, filter).await;
        Ok(())
    }

    // ---- paging --------------------------------------------------------------

    /// Reserves the load slot; `None` if a load is pending or nothing is left.
    ///
    /// Scroll triggers arriving while a request is outstanding are dropped.
    pub async fn request_more(&mut self) -> Result<Option<PageRequest>> {
        let request = self.page_cache.begin_load()?;
        if request.is_some() {
            self.publish().await;
        }
        Ok(request)
    }

    /// Feeds a finished page request back into the window
    pub async fn apply_page(&mut self, response: PageResponse) -> Result<LoadOutcome> {
        let outcome = self.page_cache.apply(response);
        self.publish().await;
        outcome
    }

    /// Fetches the next page and waits for it
    pub async fn load_more(&mut self) -> Result<OperationReport> {
        if self.page_cache.is_loading() {
            return Ok(OperationReport::new(OperationKind::LoadMore, 0, "Already loading"));
        }

        let outcome = match self.request_more().await? {
            Some(request) => {
                let response = request.execute(self.service.as_ref(), self.timeout).await;
                self.apply_page(response).await?
            }
            None => LoadOutcome::Exhausted,
        };

        let message = match outcome {
            LoadOutcome::Appended { added, total } => {
                format!("Loaded {} ({} of {})", count_items(added), self.page_cache.len(), total)
            }
            LoadOutcome::Exhausted => "Everything is loaded".to_string(),
            LoadOutcome::InFlight => "Already loading".to_string(),
            LoadOutcome::Stale => "Discarded results for a previous collection".to_string(),
        };
        Ok(OperationReport::new(OperationKind::LoadMore, outcome.added(), message))
    }

    // ---- selection -----------------------------------------------------------

    /// Plain click selects only `id`, ctrl toggles it, shift extends a range
    /// from the anchor over the loaded window
    pub async fn click(&mut self, id: &str, modifiers: ClickModifiers) {
        let trashed = self.trashed_ids().await;
        if trashed.contains(id) {
            debug!("Ignoring click on trashed item {}", id);
            return;
        }

        if modifiers.shift {
            // Ranges run over the visible window; trashed items are hidden
            let visible: Vec<Item> = self.page_cache.items()
                .iter()
                .filter(|item| !trashed.contains(item.id()))
                .cloned()
                .collect();
            self.selection.select_range(id, &visible);
        } else if modifiers.ctrl {
            self.selection.toggle(id);
        } else {
            self.selection.select_only(id);
        }
        self.publish().await;
    }

    /// First half of select-all.
    ///
    /// If the loaded window already covers the total the selection is filled
    /// right away, otherwise a full listing request is returned.
    pub async fn begin_select_all(&mut self) -> Result<SelectAllStep> {
        let key = self.page_cache.key().cloned()
            .ok_or_else(|| DomainError::validation_error("Collection", "No collection selected"))?;
        let total = self.page_cache.total().unwrap_or(usize::MAX);

        if !SelectionSet::needs_full_listing(total, self.page_cache.len()) {
            let trashed = self.trashed_ids().await;
            let ids: Vec<String> = self.page_cache.items()
                .iter()
                .map(|item| item.id().to_string())
                .filter(|id| !trashed.contains(id))
                .collect();
            let n = self.selection.replace_all(ids);
            self.publish().await;
            return Ok(SelectAllStep::Done(
                OperationReport::new(OperationKind::SelectAll, n, format!("Selected {}", count_items(n)))
            ));
        }

        let generation = self.page_cache.generation();
        self.pending_listing = Some(generation);
        debug!("Requesting full listing for {}", key);
        Ok(SelectAllStep::Fetch(ListingRequest { key, generation }))
    }

    /// Second half of select-all. A failed listing leaves the selection as it was.
    pub async fn apply_full_listing(&mut self, response: ListingResponse) -> Result<OperationReport> {
        let ListingResponse { request, result } = response;

        let current = self.page_cache.key() == Some(&request.key)
            && self.pending_listing == Some(request.generation);
        if !current {
            debug!("Discarding stale full listing for {}", request.key);
            return Ok(OperationReport::new(
                OperationKind::SelectAll,
                0,
                "Discarded results for a previous collection",
            ));
        }

        self.pending_listing = None;
        let items = result?;

        let trashed = self.trashed_ids().await;
        let ids: Vec<String> = items
            .into_iter()
            .map(|item| item.id().to_string())
            .filter(|id| !trashed.contains(id))
            .collect();
        let n = self.selection.replace_all(ids);
        self.publish().await;

        info!("Selected all {} items of {}", n, request.key);
        Ok(OperationReport::new(OperationKind::SelectAll, n, format!("Selected {}", count_items(n))))
    }

    /// Selects every item of the active listing, fetching the full id set if needed
    pub async fn select_all(&mut self) -> Result<OperationReport> {
        match self.begin_select_all().await? {
            SelectAllStep::Done(report) => Ok(report),
            SelectAllStep::Fetch(request) => {
                let response = request.execute(self.service.as_ref(), self.timeout).await;
                self.apply_full_listing(response).await
            }
        }
    }

    pub async fn clear_selection(&mut self) {
        self.selection.clear();
        self.pending_listing = None;
        self.publish().await;
    }

    // ---- trash ---------------------------------------------------------------

    /// Soft-deletes the current selection
    #[instrument(skip(self))]
    pub async fn delete_selection(&mut self) -> Result<OperationReport> {
        let ids = self.selection.ordered_ids(self.page_cache.items());
        if ids.is_empty() {
            return Err(DomainError::validation_error("Item", "Nothing selected to delete"));
        }

        let report = self.soft_delete(&ids).await;
        self.selection.clear();
        self.pending_listing = None;
        self.publish().await;
        Ok(report)
    }

    /// Soft-deletes a single item, e.g. from a detail view
    pub async fn delete_item(&mut self, id: &str) -> Result<OperationReport> {
        if id.trim().is_empty() {
            return Err(DomainError::validation_error("Item", "Item id must not be empty"));
        }

        let ids = vec![id.to_string()];
        let report = self.soft_delete(&ids).await;
        self.selection.remove_ids([id]);
        self.publish().await;
        Ok(report)
    }

    /// Takes the most recent trash entry back out
    pub async fn undo(&mut self) -> Result<OperationReport> {
        let entry = self.trash.lock().await.undo_last().await
            .ok_or_else(|| DomainError::validation_error("Trash", "Nothing to undo"))?;

        self.publish().await;
        Ok(OperationReport::new(OperationKind::Undo, 1, format!("Restored {}", entry.display_name)))
    }

    /// Takes the whole most recent delete batch back out
    pub async fn undo_batch(&mut self) -> Result<OperationReport> {
        let restored = self.trash.lock().await.undo_last_batch().await;
        if restored.is_empty() {
            return Err(DomainError::validation_error("Trash", "Nothing to undo"));
        }

        self.publish().await;
        Ok(OperationReport::new(
            OperationKind::Undo,
            restored.len(),
            format!("Restored {}", count_items(restored.len())),
        ))
    }

    pub async fn restore(&mut self, ids: &[String]) -> Result<OperationReport> {
        let restored = self.trash.lock().await.restore(ids).await;
        if restored.is_empty() {
            return Err(DomainError::validation_error("Trash", "None of the items are in the trash"));
        }

        self.publish().await;
        Ok(OperationReport::new(
            OperationKind::Restore,
            restored.len(),
            format!("Restored {}", count_items(restored.len())),
        ))
    }

    pub async fn empty_trash(&mut self) -> Result<OperationReport> {
        let outcome = self.trash.lock().await.empty_all().await;
        self.publish().await;

        let mut message = format!("Permanently deleted {}", count_items(outcome.deleted));
        if outcome.failed > 0 {
            message.push_str(&format!(" ({} failed)", outcome.failed));
        }
        Ok(OperationReport::new(OperationKind::EmptyTrash, outcome.deleted, message))
    }

    /// Changes the trash capacity; enforced on the next delete
    pub async fn set_trash_limit(&mut self, limit: usize) -> Result<OperationReport> {
        self.trash.lock().await.set_limit(limit).await?;
        self.publish().await;
        Ok(OperationReport::new(
            OperationKind::SetTrashLimit,
            limit,
            format!("Trash keeps up to {}", count_items(limit)),
        ))
    }

    // ---- view model ----------------------------------------------------------

    pub async fn snapshot(&self) -> BrowserSnapshot {
        let trash = self.trash.lock().await;

        let mut hidden_count = 0;
        let page_window: Vec<Item> = self.page_cache.items()
            .iter()
            .filter(|item| {
                let trashed = trash.contains(item.id());
                if trashed {
                    hidden_count += 1;
                }
                !trashed
            })
            .cloned()
            .collect();

        let mut selected_ids: Vec<String> = self.selection.ids().map(str::to_string).collect();
        selected_ids.sort();

        let total = self.page_cache.total();
        BrowserSnapshot {
            collection: self.page_cache.key().cloned(),
            page_window,
            hidden_count,
            total,
            pagination: PaginationDto::new(self.page_cache.len(), self.page_cache.page_size(), total),
            has_more: self.page_cache.has_more(),
            is_loading: self.page_cache.is_loading() || self.pending_listing.is_some(),
            selected_ids,
            all_selected: !self.selection.is_empty()
                && total.is_some_and(|t| self.selection.is_all_selected(t)),
            anchor_id: self.selection.anchor().map(str::to_string),
            trash_entries: trash.entries().map(TrashEntryDto::from).collect(),
            trash_limit: trash.limit(),
        }
    }

    async fn publish(&self) {
        let snapshot = self.snapshot().await;
        self.snapshot_tx.send_replace(snapshot);
    }

    async fn trashed_ids(&self) -> HashSet<String> {
        self.trash.lock().await.entries().map(|entry| entry.id.clone()).collect()
    }

    async fn soft_delete(&mut self, ids: &[String]) -> OperationReport {
        let mut stubs = self.resolve_stubs(ids).await;

        let outcome = {
            let mut trash = self.trash.lock().await;
            trash.soft_delete(ids, |id| stubs.remove(id).unwrap_or_else(TrashStub::unknown)).await
        };

        if !outcome.persisted {
            warn!("Trash change kept in memory only; it will be written on the next successful save");
        }

        let mut message = format!("Moved {} to trash", count_items(outcome.added));
        if outcome.evicted > 0 {
            message.push_str(&format!(" ({} permanently deleted)", count_items(outcome.evicted)));
        }
        OperationReport::new(OperationKind::Delete, outcome.added, message)
    }

    /// Display data for trash stubs: the page window first, then a capped
    /// number of metadata lookups; anything left becomes a placeholder
    async fn resolve_stubs(&self, ids: &[String]) -> HashMap<String, TrashStub> {
        let mut stubs = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();

        for id in ids {
            match self.page_cache.get(id) {
                Some(item) => {
                    stubs.insert(id.clone(), TrashStub::from(item));
                }
                None => missing.push(id.clone()),
            }
        }

        if missing.is_empty() {
            return stubs;
        }

        let lookups = missing.iter().take(self.metadata_lookup_limit).map(|id| {
            let service = self.service.clone();
            let timeout = self.timeout;
            async move {
                let result = bounded(timeout, "get_item_metadata", service.get_item_metadata(id)).await;
                (id, result)
            }
        });

        for (id, result) in join_all(lookups).await {
            match result {
                Ok(item) => {
                    stubs.insert(id.clone(), TrashStub::from(&item));
                }
                Err(e) => debug!("No metadata for {}, using placeholder: {}", id, e),
            }
        }

        if missing.len() > self.metadata_lookup_limit {
            debug!(
                "{} trashed items beyond the lookup cap get placeholder stubs",
                missing.len() - self.metadata_lookup_limit
            );
        }

        stubs
    }
}
