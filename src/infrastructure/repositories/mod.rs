pub mod trash_fs_repository;
pub mod trash_memory_repository;

// Re-exports for convenience
pub use trash_fs_repository::TrashFsRepository;
pub use trash_memory_repository::TrashMemoryRepository;
