use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::trash_entry::TrashEntry;

/// DTO representing an item in the trash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashEntryDto {
    pub id: String,
    pub display_name: String,
    pub preview_ref: Option<String>,
    pub trashed_at: DateTime<Utc>,
    pub age_secs: i64,
}

impl From<&TrashEntry> for TrashEntryDto {
    fn from(entry: &TrashEntry) -> Self {
        Self {
            id: entry.id.clone(),
            display_name: entry.display_name.clone(),
            preview_ref: entry.preview_ref.clone(),
            trashed_at: entry.inserted_at,
            age_secs: entry.age_secs(),
        }
    }
}
