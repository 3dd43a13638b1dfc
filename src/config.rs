use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub matching: MatchingConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub vocabulary_path: PathBuf,
    pub roles_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    pub normalize_cutoff: f64,
    pub missing_threshold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Http,
    Table,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout_secs: u64,
    pub table_path: PathBuf,
    pub cache: bool,
    /// Upper bound on cached vectors; later misses are served uncached
    pub cache_capacity: usize,
}

impl Config {
    /// Load configuration from defaults, an optional file, and `SKILLS__*`
    /// environment variables (in increasing priority).
    pub fn load(path: Option<&str>) -> std::result::Result<Self, config::ConfigError> {
        // Load .env file
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder()
            .set_default("data.vocabulary_path", "data/skills.json")?
            .set_default("data.roles_path", "data/roles.json")?
            .set_default("matching.normalize_cutoff", 0.7)?
            .set_default("matching.missing_threshold", 0.8)?
            .set_default("embedding.provider", "http")?
            .set_default("embedding.base_url", "http://localhost:8080/v1")?
            .set_default("embedding.model", "all-MiniLM-L6-v2")?
            .set_default("embedding.api_key", "")?
            .set_default("embedding.timeout_secs", 30)?
            .set_default("embedding.table_path", "data/embeddings.json")?
            .set_default("embedding.cache", false)?
            .set_default("embedding.cache_capacity", 10_000)?;

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        let config = builder
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .prefix("SKILLS"),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        check_unit_interval("matching.normalize_cutoff", self.matching.normalize_cutoff)?;
        check_unit_interval("matching.missing_threshold", self.matching.missing_threshold)?;
        if self.embedding.timeout_secs == 0 {
            return Err(EngineError::InvalidInput(
                "embedding.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Bearer token, if one is configured
    pub fn api_key(&self) -> Option<&str> {
        let key = self.api_key.trim();
        (!key.is_empty()).then_some(key)
    }
}

pub(crate) fn check_unit_interval(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidInput(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}
