pub mod pagination;
pub mod snapshot_dto;
pub mod trash_dto;
