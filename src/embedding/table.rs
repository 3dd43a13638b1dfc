use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use super::EmbeddingProvider;
use crate::error::{EngineError, Result};

/// Precomputed skill embeddings, looked up by exact skill string.
#[derive(Debug, Clone, Default)]
pub struct TableEmbeddingProvider {
    vectors: HashMap<String, Vec<f32>>,
}

impl TableEmbeddingProvider {
    pub fn new(vectors: HashMap<String, Vec<f32>>) -> Self {
        Self { vectors }
    }

    /// Load a JSON object mapping skill name to vector.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            EngineError::EmbeddingUnavailable(format!("{}: {}", path.display(), e))
        })?;
        let vectors: HashMap<String, Vec<f32>> = serde_json::from_str(&raw).map_err(|e| {
            EngineError::EmbeddingUnavailable(format!("{}: {}", path.display(), e))
        })?;

        info!("Loaded {} precomputed embeddings from {:?}", vectors.len(), path);
        Ok(Self::new(vectors))
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Vec<f32>)> for TableEmbeddingProvider {
    fn from_iter<I: IntoIterator<Item = (S, Vec<f32>)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for TableEmbeddingProvider {
    fn name(&self) -> &str {
        "table"
    }

    async fn embed(&self, skills: &[String]) -> Result<Vec<Vec<f32>>> {
        skills
            .iter()
            .map(|skill| {
                self.vectors.get(skill).cloned().ok_or_else(|| {
                    EngineError::EmbeddingUnavailable(format!("no embedding for '{}'", skill))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_in_order() {
        let table: TableEmbeddingProvider =
            [("Python", vec![1.0, 0.0]), ("SQL", vec![0.0, 1.0])].into_iter().collect();

        let vectors = table
            .embed(&["SQL".to_string(), "Python".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_unknown_skill_fails_batch() {
        let table: TableEmbeddingProvider = [("Python", vec![1.0])].into_iter().collect();

        let err = table
            .embed(&["Python".to_string(), "COBOL".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EmbeddingUnavailable(msg) if msg.contains("COBOL")));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.json");
        std::fs::write(&path, r#"{"Python": [0.1, 0.2], "SQL": [0.3, 0.4]}"#).unwrap();

        let table = TableEmbeddingProvider::load(&path).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("embeddings.json");
        std::fs::write(&path, r#"{"Python": "not a vector"}"#).unwrap();

        assert!(TableEmbeddingProvider::load(&path).is_err());
    }
}
