use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::application::ports::collection_ports::{CollectionService, ListedPage};
use crate::application::services::remote::bounded;
use crate::common::errors::{DomainError, Result};
use crate::domain::entities::collection::CollectionKey;
use crate::domain::entities::item::Item;

/// A page fetch stamped with the listing it was issued for.
///
/// Executing the request does not borrow the cache, so the host can keep
/// mutating other state while the call is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub key: CollectionKey,
    pub generation: u64,
    pub page_index: usize,
    pub page_size: usize,
}

impl PageRequest {
    pub async fn execute(self, service: &dyn CollectionService, timeout: Duration) -> PageResponse {
        let result = bounded(
            timeout,
            "list_page",
            service.list_page(&self.key, self.page_index, self.page_size),
        ).await;

        PageResponse { request: self, result }
    }
}

/// Result of a `PageRequest`, fed back through `PageCache::apply`
#[derive(Debug)]
pub struct PageResponse {
    pub request: PageRequest,
    pub result: Result<ListedPage>,
}

/// What a load attempt did to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Items were appended; `total` is the server-reported count
    Appended { added: usize, total: usize },
    /// The window already covers the total; nothing was fetched
    Exhausted,
    /// Another load for this window is still pending; the trigger was dropped
    InFlight,
    /// The response belonged to a previous collection/filter and was discarded
    Stale,
}

impl LoadOutcome {
    pub fn added(&self) -> usize {
        match self {
            LoadOutcome::Appended { added, .. } => *added,
            _ => 0,
        }
    }
}

/// Ordered prefix of the active listing, grown one page at a time
#[derive(Debug)]
pub struct PageCache {
    key: Option<CollectionKey>,
    generation: u64,
    page_size: usize,
    window: Vec<Item>,
    positions: HashMap<String, usize>,
    total: Option<usize>,
    next_page: usize,
    in_flight: bool,
}

impl PageCache {
    pub fn new(page_size: usize) -> Self {
        Self {
            key: None,
            generation: 0,
            page_size: page_size.max(1),
            window: Vec::new(),
            positions: HashMap::new(),
            total: None,
            next_page: 0,
            in_flight: false,
        }
    }

    /// Discards the window and starts over for `key`.
    ///
    /// Bumping the generation makes every response still in flight stale.
    pub fn reset(&mut self, key: CollectionKey) {
        debug!("Resetting page cache for {}", key);
        self.key = Some(key);
        self.generation += 1;
        self.window.clear();
        self.positions.clear();
        self.total = None;
        self.next_page = 0;
        self.in_flight = false;
    }

    /// Reserves the single load slot and builds the next page request.
    ///
    /// Returns `Ok(None)` when a load is already pending or the window is
    /// complete.
    pub fn begin_load(&mut self) -> Result<Option<PageRequest>> {
        let key = self.key.clone()
            .ok_or_else(|| DomainError::validation_error("Collection", "No collection selected"))?;

        if self.in_flight {
            debug!("Page load already in flight for {}, dropping trigger", key);
            return Ok(None);
        }

        if !self.has_more() {
            return Ok(None);
        }

        self.in_flight = true;
        Ok(Some(PageRequest {
            key,
            generation: self.generation,
            page_index: self.next_page,
            page_size: self.page_size,
        }))
    }

    /// Applies a finished page request.
    ///
    /// On failure the window is left untouched and the load slot is freed.
    pub fn apply(&mut self, response: PageResponse) -> Result<LoadOutcome> {
        let PageResponse { request, result } = response;

        if request.generation != self.generation || self.key.as_ref() != Some(&request.key) {
            debug!("Discarding stale page {} for {}", request.page_index, request.key);
            return Ok(LoadOutcome::Stale);
        }

        self.in_flight = false;
        let page = result?;

        let total = page.total;
        let mut added = 0;
        for item in page.items {
            if self.window.len() >= total {
                break;
            }
            if self.positions.contains_key(item.id()) {
                warn!("Item {} listed twice for {}, skipping", item.id(), request.key);
                continue;
            }
            self.positions.insert(item.id().to_string(), self.window.len());
            self.window.push(item);
            added += 1;
        }

        if added == 0 && self.window.len() < total {
            // The server ran out of items before reaching its own total
            warn!(
                "Empty page {} for {} with {} of {} loaded; closing window",
                request.page_index, request.key, self.window.len(), total
            );
            self.total = Some(self.window.len());
        } else if total < self.window.len() {
            // Items vanished server-side since earlier pages; keep what is loaded
            warn!(
                "Total for {} shrank to {} below {} loaded items; closing window",
                request.key, total, self.window.len()
            );
            self.total = Some(self.window.len());
        } else {
            self.total = Some(total);
        }
        self.next_page += 1;

        debug!("Loaded {} items for {} ({} / {})", added, request.key, self.window.len(), total);
        Ok(LoadOutcome::Appended { added, total: self.total.unwrap_or(total) })
    }

    /// Fetches and appends the next page
    pub async fn load_next(
        &mut self,
        service: &dyn CollectionService,
        timeout: Duration,
    ) -> Result<LoadOutcome> {
        if self.in_flight {
            return Ok(LoadOutcome::InFlight);
        }

        match self.begin_load()? {
            Some(request) => {
                let response = request.execute(service, timeout).await;
                self.apply(response)
            }
            None => Ok(LoadOutcome::Exhausted),
        }
    }

    /// True while the total is unknown or the window is shorter than it
    pub fn has_more(&self) -> bool {
        if self.key.is_none() {
            return false;
        }
        self.total.map_or(true, |total| self.window.len() < total)
    }

    pub fn key(&self) -> Option<&CollectionKey> {
        self.key.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn items(&self) -> &[Item] {
        &self.window
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn total(&self) -> Option<usize> {
        self.total
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.positions.get(id).map(|&pos| &self.window[pos])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }
}
