use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gallerist::application::services::trash_queue::TrashQueue;
use gallerist::domain::entities::collection::ItemFilter;
use gallerist::{AppConfig, CollectionController, HttpCollectionService, TrashFsRepository};

/// Gallerist - headless collection browser
///
/// Opens the collection named by `GALLERIST_COLLECTION_ID`, loads its first
/// page and prints the resulting browser snapshot as JSON. The trash queue is
/// read from (and kept in) `GALLERIST_TRASH_DIR`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration from environment variables
    let config = AppConfig::from_env();

    let collection_id = std::env::var("GALLERIST_COLLECTION_ID")
        .context("GALLERIST_COLLECTION_ID must name the collection to open")?;
    let mut filter = ItemFilter::default();
    if let Ok(search) = std::env::var("GALLERIST_SEARCH") {
        filter = filter.with_search(search);
    }

    let service = Arc::new(HttpCollectionService::from_config(&config)?);
    let repository = Arc::new(TrashFsRepository::new(&config.trash.storage_dir));
    let trash = TrashQueue::load(
        repository,
        service.clone(),
        config.trash.default_limit,
        config.timeouts.network_timeout(),
    ).await.into_shared();

    let mut controller = CollectionController::new(service, trash, &config);
    controller.select_collection(&collection_id, filter).await;

    let report = controller.load_more().await?;
    info!("{}", report.message);

    let snapshot = controller.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
