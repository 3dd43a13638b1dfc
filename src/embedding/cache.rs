use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::EmbeddingProvider;
use crate::error::{EngineError, Result};

/// In-process embedding cache in front of another provider.
///
/// Only cache misses are forwarded, still as a single batch. Assumes the
/// inner provider is deterministic per skill string. Pays off for long-lived
/// library callers running many analyses; a single CLI run never hits it.
///
/// Entries are never evicted. Once `capacity` vectors are held, further
/// misses are returned to the caller without being stored.
pub struct CachedEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    cache: DashMap<String, Vec<f32>>,
    capacity: usize,
}

impl CachedEmbeddingProvider {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, capacity: usize) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[async_trait]
impl EmbeddingProvider for CachedEmbeddingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn embed(&self, skills: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut misses: Vec<String> = skills
            .iter()
            .filter(|skill| !self.cache.contains_key(skill.as_str()))
            .cloned()
            .collect();
        misses.sort();
        misses.dedup();

        let mut fetched: HashMap<String, Vec<f32>> = HashMap::new();
        if !misses.is_empty() {
            debug!(
                "Embedding cache: {} hits, {} misses",
                skills.len() - misses.len(),
                misses.len()
            );
            let vectors = self.inner.embed(&misses).await?;
            if vectors.len() != misses.len() {
                return Err(EngineError::EmbeddingUnavailable(format!(
                    "{} returned {} embeddings for {} skills",
                    self.inner.name(),
                    vectors.len(),
                    misses.len()
                )));
            }
            for (skill, vector) in misses.into_iter().zip(vectors) {
                if self.cache.len() < self.capacity {
                    self.cache.insert(skill.clone(), vector.clone());
                }
                fetched.insert(skill, vector);
            }
        }

        skills
            .iter()
            .map(|skill| {
                if let Some(vector) = fetched.get(skill) {
                    return Ok(vector.clone());
                }
                self.cache
                    .get(skill.as_str())
                    .map(|entry| entry.value().clone())
                    .ok_or_else(|| {
                        EngineError::EmbeddingUnavailable(format!("no embedding for '{}'", skill))
                    })
            })
            .collect()
    }
}
