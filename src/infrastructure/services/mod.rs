pub mod http_collection_service;

pub use http_collection_service::HttpCollectionService;
