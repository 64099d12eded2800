use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::application::ports::collection_ports::{CollectionService, ListedPage};
use crate::common::config::AppConfig;
use crate::common::errors::{DomainError, ErrorContext, ErrorKind, Result};
use crate::domain::entities::collection::{CaptionFilter, CollectionKey};
use crate::domain::entities::item::{Item, ItemFlags};

/// File record as returned by the collection API
#[derive(Debug, Deserialize)]
struct FileRecord {
    id: String,
    filename: String,
    #[serde(default)]
    has_caption: bool,
    #[serde(default)]
    quality_score: Option<u8>,
    #[serde(default)]
    quality_flags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct FilePage {
    items: Vec<FileRecord>,
    total: usize,
}

#[derive(Debug, Deserialize)]
struct FileListing {
    items: Vec<FileRecord>,
}

/// Collection service backed by the HTTP JSON API
pub struct HttpCollectionService {
    client: Client,
    base_url: String,
}

impl HttpCollectionService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .with_context(|| "Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(config.service.base_url.clone(), config.timeouts.network_timeout())
    }

    fn files_url(&self, collection_id: &str) -> String {
        format!("{}/api/folders/{}/files", self.base_url, collection_id)
    }

    fn file_url(&self, item_id: &str) -> String {
        format!("{}/api/files/{}", self.base_url, item_id)
    }

    fn thumbnail_url(&self, item_id: &str) -> String {
        format!("{}/thumbnail", self.file_url(item_id))
    }

    /// Query parameters describing the filter half of a key
    fn filter_query(key: &CollectionKey) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(search) = &key.filter.search {
            query.push(("search", search.clone()));
        }
        if key.filter.caption != CaptionFilter::All {
            query.push(("caption", key.filter.caption.as_str().to_string()));
        }
        query
    }

    fn to_item(&self, record: FileRecord) -> Item {
        let thumbnail = self.thumbnail_url(&record.id);
        Item::new(
            record.id,
            record.filename,
            thumbnail,
            ItemFlags {
                has_caption: record.has_caption,
                quality_score: record.quality_score,
                quality_flags: record.quality_flags.unwrap_or_default(),
            },
        )
    }

    /// Maps non-success statuses onto domain errors
    async fn check_status(response: Response, entity_id: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::NOT_FOUND {
            return Err(DomainError::not_found("Item", entity_id));
        }

        let body = response.text().await.unwrap_or_default();
        Err(DomainError::new(
            ErrorKind::Fetch,
            "Collection",
            format!("Request for {} failed ({}): {}", entity_id, status, body.trim()),
        ))
    }
}

#[async_trait]
impl CollectionService for HttpCollectionService {
    #[instrument(skip(self, key), fields(key = %key))]
    async fn list_page(
        &self,
        key: &CollectionKey,
        page_index: usize,
        page_size: usize,
    ) -> Result<ListedPage> {
        let mut query = Self::filter_query(key);
        // The API counts pages from 1
        query.push(("page", (page_index + 1).to_string()));
        query.push(("page_size", page_size.to_string()));

        let response = self.client
            .get(self.files_url(&key.collection_id))
            .query(&query)
            .send()
            .await?;
        let page: FilePage = Self::check_status(response, &key.collection_id).await?
            .json()
            .await?;

        debug!("Fetched page {} with {} items (total {})", page_index, page.items.len(), page.total);
        Ok(ListedPage {
            total: page.total,
            items: page.items.into_iter().map(|record| self.to_item(record)).collect(),
        })
    }

    #[instrument(skip(self, key), fields(key = %key))]
    async fn list_all(&self, key: &CollectionKey) -> Result<Vec<Item>> {
        let response = self.client
            .get(format!("{}/all", self.files_url(&key.collection_id)))
            .query(&Self::filter_query(key))
            .send()
            .await?;
        let listing: FileListing = Self::check_status(response, &key.collection_id).await?
            .json()
            .await?;

        Ok(listing.items.into_iter().map(|record| self.to_item(record)).collect())
    }

    #[instrument(skip(self))]
    async fn permanent_delete(&self, item_id: &str) -> Result<()> {
        let response = self.client.delete(self.file_url(item_id)).send().await?;
        Self::check_status(response, item_id).await?;
        Ok(())
    }

    async fn get_item_metadata(&self, item_id: &str) -> Result<Item> {
        let response = self.client.get(self.file_url(item_id)).send().await?;
        let record: FileRecord = Self::check_status(response, item_id).await?
            .json()
            .await?;
        Ok(self.to_item(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::collection::ItemFilter;

    fn service() -> HttpCollectionService {
        HttpCollectionService::new("http://localhost:8000/", Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_urls_drop_trailing_slash() {
        let service = service();
        assert_eq!(service.files_url("f1"), "http://localhost:8000/api/folders/f1/files");
        assert_eq!(service.file_url("abc"), "http://localhost:8000/api/files/abc");
        assert_eq!(service.thumbnail_url("abc"), "http://localhost:8000/api/files/abc/thumbnail");
    }

    #[test]
    fn test_filter_query_omits_defaults() {
        let plain = CollectionKey::new("f1", ItemFilter::default());
        assert!(HttpCollectionService::filter_query(&plain).is_empty());

        let filtered = CollectionKey::new(
            "f1",
            ItemFilter::default().with_search("cat").with_caption(CaptionFilter::Uncaptioned),
        );
        let query = HttpCollectionService::filter_query(&filtered);
        assert_eq!(query[0], ("search", "cat".to_string()));
        assert_eq!(query[1].0, "caption");
    }

    #[test]
    fn test_record_maps_to_item() {
        let page: FilePage = serde_json::from_str(
            r#"{"items": [{"id": "x1", "filename": "x1.png", "has_caption": true,
                "quality_score": 4, "quality_flags": ["blurry"], "width": 512}], "total": 9}"#
        ).unwrap();

        let item = service().to_item(page.items.into_iter().next().unwrap());
        assert_eq!(item.id(), "x1");
        assert_eq!(item.name(), "x1.png");
        assert!(item.has_caption());
        assert_eq!(item.flags().quality_score, Some(4));
        assert_eq!(item.thumbnail(), "http://localhost:8000/api/files/x1/thumbnail");
        assert_eq!(page.total, 9);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let record: FileRecord = serde_json::from_str(r#"{"id": "y", "filename": "y.jpg"}"#).unwrap();
        let item = service().to_item(record);
        assert!(!item.has_caption());
        assert!(item.flags().quality_flags.is_empty());
    }
}
