use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::item::Item;

/// Name shown for trashed items whose metadata could not be resolved
pub const UNKNOWN_NAME: &str = "Unknown";

/// Display data captured when an item is soft-deleted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashStub {
    pub display_name: String,
    pub preview_ref: Option<String>,
}

impl TrashStub {
    /// Placeholder for ids with no locally known metadata
    pub fn unknown() -> Self {
        Self {
            display_name: UNKNOWN_NAME.to_string(),
            preview_ref: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.preview_ref.is_none() && self.display_name == UNKNOWN_NAME
    }
}

impl From<&Item> for TrashStub {
    fn from(item: &Item) -> Self {
        Self {
            display_name: item.name().to_string(),
            preview_ref: Some(item.thumbnail().to_string()),
        }
    }
}

/// An item waiting in the local trash queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashEntry {
    /// Identifier of the trashed item
    pub id: String,
    pub display_name: String,
    pub preview_ref: Option<String>,
    pub inserted_at: DateTime<Utc>,
}

impl TrashEntry {
    pub fn new(id: impl Into<String>, stub: TrashStub) -> Self {
        Self {
            id: id.into(),
            display_name: stub.display_name,
            preview_ref: stub.preview_ref,
            inserted_at: Utc::now(),
        }
    }

    /// Seconds the entry has spent in the trash
    pub fn age_secs(&self) -> i64 {
        (Utc::now() - self.inserted_at).num_seconds().max(0)
    }
}
