use serde::Serialize;

use crate::application::dtos::pagination::PaginationDto;
use crate::application::dtos::trash_dto::TrashEntryDto;
use crate::domain::entities::collection::CollectionKey;
use crate::domain::entities::item::Item;

/// Read-only view model published after every mutating operation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BrowserSnapshot {
    /// Active collection and filter, if any
    pub collection: Option<CollectionKey>,
    /// Loaded items in listing order, minus those sitting in the trash
    pub page_window: Vec<Item>,
    /// Loaded items hidden because they are in the trash
    pub hidden_count: usize,
    /// Server-reported total for the active listing
    pub total: Option<usize>,
    pub pagination: PaginationDto,
    pub has_more: bool,
    pub is_loading: bool,
    /// Selected ids, sorted
    pub selected_ids: Vec<String>,
    pub all_selected: bool,
    pub anchor_id: Option<String>,
    /// Trash contents, oldest first
    pub trash_entries: Vec<TrashEntryDto>,
    pub trash_limit: usize,
}

/// Kind of user operation a report refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    LoadMore,
    SelectAll,
    Delete,
    Undo,
    Restore,
    EmptyTrash,
    SetTrashLimit,
}

/// Success signal for the view layer, with a count-qualified message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationReport {
    pub kind: OperationKind,
    pub affected: usize,
    pub message: String,
}

impl OperationReport {
    pub fn new(kind: OperationKind, affected: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            affected,
            message: message.into(),
        }
    }
}

/// "1 item" / "3 items"
pub fn count_items(n: usize) -> String {
    if n == 1 {
        "1 item".to_string()
    } else {
        format!("{} items", n)
    }
}
