use async_trait::async_trait;

use crate::common::errors::Result;
use crate::domain::entities::collection::CollectionKey;
use crate::domain::entities::item::Item;

/// One page of a listing plus the server-side total for the same key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListedPage {
    pub items: Vec<Item>,
    pub total: usize,
}

/// Secondary port for the remote collection service
///
/// Implementations must keep the listing order stable between successive
/// page requests for the same key.
#[cfg_attr(any(test, feature = "test_utils"), mockall::automock)]
#[async_trait]
pub trait CollectionService: Send + Sync + 'static {
    /// Lists page `page_index` (0-based) of the collection seen through its filter
    async fn list_page(
        &self,
        key: &CollectionKey,
        page_index: usize,
        page_size: usize,
    ) -> Result<ListedPage>;

    /// Lists every item matching the key, used by select-all
    async fn list_all(&self, key: &CollectionKey) -> Result<Vec<Item>>;

    /// Permanently removes an item; `NotFound` if it is already gone
    async fn permanent_delete(&self, item_id: &str) -> Result<()>;

    /// Fetches display metadata for a single item
    async fn get_item_metadata(&self, item_id: &str) -> Result<Item>;
}
