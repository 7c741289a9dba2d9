use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::providers::ProviderRegistry;
use crate::services::{VectorStore, create_backend};

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    // Providers may be unresolvable here (missing credential) without
    // that being fatal for a status report.
    let (embedding_provider, embedding_dimensions, provider_error) =
        match ProviderRegistry::from_config(&config.providers) {
            Ok(registry) => {
                let embedding = registry.embedding();
                (embedding.name().to_string(), embedding.dimensions(), None)
            }
            Err(e) => (
                format!("{} (unresolved)", config.providers.embedding),
                0,
                Some(e),
            ),
        };

    let (vector_store_connected, points_count) =
        if let Ok(store) = create_backend(&config.vector_store) {
            let connected = store.health_check().await.unwrap_or(false);
            let points = if connected {
                store.stats().await.map_or(0, |s| s.points_count)
            } else {
                0
            };
            (connected, points)
        } else {
            (false, 0)
        };

    let status = StatusInfo {
        vector_store_url: config.vector_store.url.clone(),
        collection: config.vector_store.collection.clone(),
        vector_store_connected,
        points_count,
        embedding_provider,
        embedding_dimensions,
        generation_model: config.providers.generation_model.clone(),
    };

    print!("{}", formatter.format_status(&status));

    if !vector_store_connected || provider_error.is_some() {
        eprintln!();
        if !vector_store_connected {
            eprintln!(
                "Warning: Qdrant not reachable at {}. Start with: docker compose up -d qdrant",
                config.vector_store.url
            );
        }
        if let Some(e) = provider_error {
            eprintln!("Warning: providers not resolvable: {e}");
        }
    }

    Ok(())
}
