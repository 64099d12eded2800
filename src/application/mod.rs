pub mod dtos;
pub mod ports;
pub mod services;

// Re-export the main ports
pub use ports::collection_ports::{CollectionService, ListedPage};
