mod cache;
mod client;
mod table;

pub use cache::CachedEmbeddingProvider;
pub use client::HttpEmbeddingProvider;
pub use table::TableEmbeddingProvider;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::config::{EmbeddingConfig, ProviderKind};

/// Source of skill embeddings.
///
/// Returns one vector per input string, in input order. Any skill that cannot
/// be embedded fails the whole batch with `EmbeddingUnavailable`; there is no
/// zero-vector fallback.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    async fn embed(&self, skills: &[String]) -> crate::error::Result<Vec<Vec<f32>>>;
}

/// Build the configured provider, wrapped in a cache if enabled.
pub fn provider_from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        ProviderKind::Http => Arc::new(
            HttpEmbeddingProvider::new(config).context("Failed to create embedding client")?,
        ),
        ProviderKind::Table => Arc::new(
            TableEmbeddingProvider::load(&config.table_path)
                .context("Failed to load embedding table")?,
        ),
    };

    info!(
        "Embedding provider ready: {} (cache={})",
        provider.name(),
        config.cache
    );

    if config.cache {
        Ok(Arc::new(CachedEmbeddingProvider::new(
            provider,
            config.cache_capacity,
        )))
    } else {
        Ok(provider)
    }
}
