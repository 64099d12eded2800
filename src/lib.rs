// Main modules of the crate
pub mod common;
pub mod domain;
pub mod application;
pub mod infrastructure;

// Common public re-exports
pub use application::services::collection_controller::{ClickModifiers, CollectionController};
pub use application::services::trash_queue::{SharedTrashQueue, TrashQueue};
pub use application::dtos::snapshot_dto::{BrowserSnapshot, OperationReport};
pub use common::config::AppConfig;
pub use common::errors::{DomainError, ErrorKind, Result};
pub use infrastructure::repositories::TrashFsRepository;
pub use infrastructure::services::HttpCollectionService;
