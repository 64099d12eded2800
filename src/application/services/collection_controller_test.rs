use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use async_trait::async_trait;

use crate::common::config::AppConfig;
use crate::common::errors::{Result, DomainError, ErrorKind};
use crate::application::dtos::snapshot_dto::OperationKind;
use crate::application::ports::collection_ports::{CollectionService, ListedPage};
use crate::application::services::collection_controller::{ClickModifiers, CollectionController};
use crate::application::services::page_cache::LoadOutcome;
use crate::application::services::trash_queue::{SharedTrashQueue, TrashQueue};
use crate::domain::entities::collection::{CaptionFilter, CollectionKey, ItemFilter};
use crate::domain::entities::item::{Item, ItemFlags};
use crate::domain::entities::trash_entry::UNKNOWN_NAME;
use crate::infrastructure::repositories::trash_memory_repository::TrashMemoryRepository;

const TIMEOUT: Duration = Duration::from_secs(5);

fn item(n: usize) -> Item {
    Item::new(format!("img-{n:03}"), format!("img_{n:03}.png"), format!("/thumbs/{n}"), ItemFlags::default())
}

fn id(n: usize) -> String {
    format!("img-{n:03}")
}

// In-memory collection service for testing
struct FakeCollectionService {
    items: Vec<Item>,
    fail_listing: AtomicBool,
    deleted: Mutex<Vec<String>>,
    metadata_calls: Mutex<Vec<String>>,
}

impl FakeCollectionService {
    fn with_items(total: usize) -> Self {
        Self {
            items: (0..total).map(item).collect(),
            fail_listing: AtomicBool::new(false),
            deleted: Mutex::new(Vec::new()),
            metadata_calls: Mutex::new(Vec::new()),
        }
    }

    fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CollectionService for FakeCollectionService {
    async fn list_page(&self, _key: &CollectionKey, page_index: usize, page_size: usize) -> Result<ListedPage> {
        let start = (page_index * page_size).min(self.items.len());
        let end = (start + page_size).min(self.items.len());
        Ok(ListedPage {
            items: self.items[start..end].to_vec(),
            total: self.items.len(),
        })
    }

    async fn list_all(&self, _key: &CollectionKey) -> Result<Vec<Item>> {
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(DomainError::fetch("Collection", "503 Service Unavailable"));
        }
        Ok(self.items.clone())
    }

    async fn permanent_delete(&self, item_id: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(item_id.to_string());
        Ok(())
    }

    async fn get_item_metadata(&self, item_id: &str) -> Result<Item> {
        self.metadata_calls.lock().unwrap().push(item_id.to_string());
        self.items.iter()
            .find(|item| item.id() == item_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Item", item_id))
    }
}

fn config(page_size: usize) -> AppConfig {
    let mut config = AppConfig::default();
    config.collection.page_size = page_size;
    config
}

fn trash(service: Arc<FakeCollectionService>, limit: usize) -> SharedTrashQueue {
    TrashQueue::new(Arc::new(TrashMemoryRepository::new()), service, limit, TIMEOUT).into_shared()
}

async fn controller(total: usize, config: &AppConfig) -> (CollectionController, Arc<FakeCollectionService>) {
    let service = Arc::new(FakeCollectionService::with_items(total));
    let trash = trash(service.clone(), config.trash.default_limit);
    let mut controller = CollectionController::new(service.clone(), trash, config);
    controller.select_collection("holiday", ItemFilter::default()).await;
    (controller, service)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_more_fills_snapshot() {
        let (mut controller, _) = controller(120, &config(50)).await;

        let report = controller.load_more().await.unwrap();
        assert_eq!(report.kind, OperationKind::LoadMore);
        assert_eq!(report.affected, 50);
        controller.load_more().await.unwrap();

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.page_window.len(), 100);
        assert_eq!(snapshot.total, Some(120));
        assert!(snapshot.has_more);
        assert_eq!(snapshot.pagination.pages_loaded, 2);
        assert_eq!(snapshot.pagination.total_pages, Some(3));

        controller.load_more().await.unwrap();
        let last = controller.load_more().await.unwrap();
        assert_eq!(last.affected, 0);
        assert!(!controller.snapshot().await.has_more);
    }

    #[tokio::test]
    async fn test_page_for_previous_collection_is_discarded() {
        let (mut controller, service) = controller(30, &config(10)).await;

        let request = controller.request_more().await.unwrap().unwrap();
        // A second trigger while the first is pending is dropped
        assert!(controller.request_more().await.unwrap().is_none());

        controller.select_collection("portraits", ItemFilter::default()).await;
        let response = request.execute(service.as_ref(), TIMEOUT).await;

        assert_eq!(controller.apply_page(response).await.unwrap(), LoadOutcome::Stale);
        let snapshot = controller.snapshot().await;
        assert!(snapshot.page_window.is_empty());
        assert_eq!(snapshot.collection.unwrap().collection_id, "portraits");
    }

    #[tokio::test]
    async fn test_selection_changes_while_page_pending() {
        let (mut controller, service) = controller(30, &config(10)).await;
        controller.load_more().await.unwrap();

        let request = controller.request_more().await.unwrap().unwrap();
        controller.click(&id(1), ClickModifiers::CTRL).await;
        controller.click(&id(3), ClickModifiers::CTRL).await;
        let response = request.execute(service.as_ref(), TIMEOUT).await;
        controller.apply_page(response).await.unwrap();

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.page_window.len(), 20);
        assert_eq!(snapshot.selected_ids, vec![id(1), id(3)]);
    }

    #[tokio::test]
    async fn test_click_modifiers() {
        let (mut controller, _) = controller(10, &config(10)).await;
        controller.load_more().await.unwrap();

        controller.click(&id(2), ClickModifiers::NONE).await;
        controller.click(&id(5), ClickModifiers::SHIFT).await;
        assert_eq!(controller.selection().len(), 4);

        controller.click(&id(4), ClickModifiers::CTRL).await;
        assert!(!controller.selection().contains(&id(4)));

        // Plain click collapses the selection
        controller.click(&id(7), ClickModifiers::NONE).await;
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.selected_ids, vec![id(7)]);
        assert_eq!(snapshot.anchor_id, Some(id(7)));
    }

    #[tokio::test]
    async fn test_shift_range_skips_trashed_items() {
        let (mut controller, _) = controller(10, &config(10)).await;
        controller.load_more().await.unwrap();
        controller.click(&id(0), ClickModifiers::NONE).await;
        controller.delete_item(&id(2)).await.unwrap();

        controller.click(&id(1), ClickModifiers::NONE).await;
        controller.click(&id(4), ClickModifiers::SHIFT).await;

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.selected_ids, vec![id(1), id(3), id(4)]);
        let trash = controller.trash();
        let trash = trash.lock().await;
        assert!(snapshot.selected_ids.iter().all(|selected| !trash.contains(selected)));
    }

    #[tokio::test]
    async fn test_select_all_fetches_unloaded_ids() {
        let (mut controller, _) = controller(120, &config(50)).await;
        controller.load_more().await.unwrap();

        let report = controller.select_all().await.unwrap();

        assert_eq!(report.affected, 120);
        assert_eq!(report.message, "Selected 120 items");
        let snapshot = controller.snapshot().await;
        assert!(snapshot.all_selected);
        assert!(snapshot.selected_ids.contains(&id(119)));
        assert_eq!(snapshot.page_window.len(), 50);
    }

    #[tokio::test]
    async fn test_failed_select_all_keeps_selection() {
        let (mut controller, service) = controller(120, &config(50)).await;
        controller.load_more().await.unwrap();
        controller.click(&id(1), ClickModifiers::NONE).await;
        service.fail_listing.store(true, Ordering::SeqCst);

        let err = controller.select_all().await.unwrap_err();

        assert!(err.is_fetch_error());
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.selected_ids, vec![id(1)]);
        assert!(!snapshot.all_selected);
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn test_listing_for_previous_filter_is_discarded() {
        let (mut controller, _) = controller(120, &config(50)).await;
        controller.load_more().await.unwrap();

        let service = controller.service();
        let step = controller.begin_select_all().await.unwrap();
        let request = match step {
            crate::application::services::collection_controller::SelectAllStep::Fetch(request) => request,
            other => panic!("expected a full listing request, got {:?}", other),
        };

        controller
            .set_filter(ItemFilter::default().with_caption(CaptionFilter::Uncaptioned))
            .await
            .unwrap();
        let response = request.execute(service.as_ref(), TIMEOUT).await;
        let report = controller.apply_full_listing(response).await.unwrap();

        assert_eq!(report.affected, 0);
        assert!(controller.selection().is_empty());
    }

    #[tokio::test]
    async fn test_delete_then_undo() {
        let (mut controller, service) = controller(10, &config(10)).await;
        controller.load_more().await.unwrap();
        controller.click(&id(2), ClickModifiers::CTRL).await;
        controller.click(&id(4), ClickModifiers::CTRL).await;

        let report = controller.delete_selection().await.unwrap();
        assert_eq!(report.affected, 2);
        assert_eq!(report.message, "Moved 2 items to trash");

        let snapshot = controller.snapshot().await;
        assert!(snapshot.selected_ids.is_empty());
        assert_eq!(snapshot.hidden_count, 2);
        assert_eq!(snapshot.page_window.len(), 8);
        assert_eq!(snapshot.trash_entries.len(), 2);
        assert_eq!(snapshot.trash_entries[0].display_name, "img_002.png");

        let undo = controller.undo().await.unwrap();
        assert_eq!(undo.message, "Restored img_004.png");
        assert_eq!(controller.snapshot().await.hidden_count, 1);

        let batch = controller.undo_batch().await.unwrap();
        assert_eq!(batch.message, "Restored 1 item");

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.page_window.len(), 10);
        assert!(snapshot.trash_entries.is_empty());
        assert!(service.deleted().is_empty(), "undo must never reach the server");

        let err = controller.undo().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_delete_with_empty_selection_is_rejected() {
        let (mut controller, _) = controller(10, &config(10)).await;
        let err = controller.delete_selection().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_trashed_items_are_not_reselected() {
        let (mut controller, _) = controller(10, &config(10)).await;
        controller.load_more().await.unwrap();
        controller.click(&id(0), ClickModifiers::NONE).await;
        controller.delete_selection().await.unwrap();

        let report = controller.select_all().await.unwrap();

        assert_eq!(report.affected, 9);
        assert!(!controller.selection().contains(&id(0)));
    }

    #[tokio::test]
    async fn test_detail_view_delete_shares_trash() {
        let (mut controller, _) = controller(10, &config(10)).await;
        controller.load_more().await.unwrap();
        controller.click(&id(1), ClickModifiers::CTRL).await;
        controller.click(&id(6), ClickModifiers::CTRL).await;

        let report = controller.delete_item(&id(6)).await.unwrap();

        assert_eq!(report.message, "Moved 1 item to trash");
        assert_eq!(controller.selection().ids().collect::<Vec<_>>(), vec![id(1).as_str()]);
        assert!(controller.trash().lock().await.contains(&id(6)));

        // Deleting it again is a no-op
        let again = controller.delete_item(&id(6)).await.unwrap();
        assert_eq!(again.affected, 0);
    }

    #[tokio::test]
    async fn test_unloaded_ids_get_metadata_or_placeholder() {
        let mut config = config(2);
        config.collection.metadata_lookup_limit = 1;
        let (mut controller, service) = controller(6, &config).await;
        controller.load_more().await.unwrap();
        controller.select_all().await.unwrap();

        controller.delete_selection().await.unwrap();

        let snapshot = controller.snapshot().await;
        let names: Vec<&str> = snapshot.trash_entries.iter().map(|e| e.display_name.as_str()).collect();
        assert_eq!(names[..3], ["img_000.png", "img_001.png", "img_002.png"]);
        assert!(names[3..].iter().all(|name| *name == UNKNOWN_NAME));
        assert_eq!(*service.metadata_calls.lock().unwrap(), vec![id(2)]);
    }

    #[tokio::test]
    async fn test_eviction_reported_and_deleted_remotely() {
        let mut config = config(10);
        config.trash.default_limit = 2;
        let (mut controller, service) = controller(10, &config).await;
        controller.load_more().await.unwrap();
        for n in 0..3 {
            controller.click(&id(n), ClickModifiers::CTRL).await;
        }

        let report = controller.delete_selection().await.unwrap();

        assert_eq!(report.message, "Moved 3 items to trash (1 item permanently deleted)");
        assert_eq!(service.deleted(), vec![id(0)]);
        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.trash_entries.len(), 2);
        // The evicted item is still in the window; the server decides on the next load
        assert_eq!(snapshot.hidden_count, 2);
    }

    #[tokio::test]
    async fn test_restore_and_empty_trash() {
        let (mut controller, service) = controller(10, &config(10)).await;
        controller.load_more().await.unwrap();
        controller.select_all().await.unwrap();
        controller.delete_selection().await.unwrap();

        let restored = controller.restore(&[id(7), id(3)]).await.unwrap();
        assert_eq!(restored.affected, 2);

        let emptied = controller.empty_trash().await.unwrap();
        assert_eq!(emptied.message, "Permanently deleted 8 items");
        let deleted: HashSet<String> = service.deleted().into_iter().collect();
        assert!(!deleted.contains(&id(3)));
        assert_eq!(deleted.len(), 8);
        assert!(controller.snapshot().await.trash_entries.is_empty());

        let err = controller.restore(&[id(7)]).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_set_trash_limit_publishes() {
        let (mut controller, _) = controller(10, &config(10)).await;
        let mut rx = controller.subscribe();

        controller.set_trash_limit(5).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().trash_limit, 5);
        assert!(controller.set_trash_limit(0).await.is_err());
    }

    #[tokio::test]
    async fn test_set_filter_without_collection() {
        let service = Arc::new(FakeCollectionService::with_items(3));
        let config = config(10);
        let mut controller = CollectionController::new(service.clone(), trash(service, 10), &config);

        let err = controller.set_filter(ItemFilter::default().with_search("cat")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(controller.load_more().await.is_err());
    }
}
