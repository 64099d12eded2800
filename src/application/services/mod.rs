pub mod collection_controller;
pub mod page_cache;
pub mod selection_set;
pub mod trash_queue;

mod remote;

#[cfg(test)]
mod collection_controller_test;

// Re-exports for convenience
pub use collection_controller::{ClickModifiers, CollectionController};
pub use page_cache::PageCache;
pub use selection_set::SelectionSet;
pub use trash_queue::{SharedTrashQueue, TrashQueue};
