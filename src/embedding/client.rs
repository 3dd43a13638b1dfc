use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::{EngineError, Result};

/// Client for an OpenAI-compatible `/embeddings` endpoint.
///
/// Makes a single request per batch. Retries, if wanted, belong in front of
/// the service, not here.
pub struct HttpEmbeddingProvider {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl HttpEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EngineError::EmbeddingUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            url: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key().map(str::to_string),
        })
    }

    fn unavailable(&self, reason: impl std::fmt::Display) -> EngineError {
        error!("Embedding request to {} failed: {}", self.url, reason);
        EngineError::EmbeddingUnavailable(format!("{}: {}", self.url, reason))
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, skills: &[String]) -> Result<Vec<Vec<f32>>> {
        if skills.is_empty() {
            return Ok(vec![]);
        }

        debug!("Requesting embeddings for {} skills", skills.len());

        let mut request = self.client.post(&self.url).json(&EmbeddingRequest {
            model: &self.model,
            input: skills,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| self.unavailable(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.unavailable(format!("HTTP {}: {}", status, body)));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| self.unavailable(format!("malformed response: {}", e)))?;

        if body.data.len() != skills.len() {
            return Err(self.unavailable(format!(
                "expected {} embeddings, got {}",
                skills.len(),
                body.data.len()
            )));
        }

        let mut slots: Vec<Option<Vec<f32>>> = vec![None; skills.len()];
        for item in body.data {
            let slot = slots
                .get_mut(item.index)
                .filter(|slot| slot.is_none())
                .ok_or_else(|| self.unavailable(format!("bad embedding index {}", item.index)))?;
            *slot = Some(item.embedding);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EmbeddingConfig, ProviderKind};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str, api_key: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: ProviderKind::Http,
            base_url: base_url.to_string(),
            model: "test-model".to_string(),
            api_key: api_key.to_string(),
            timeout_secs: 5,
            table_path: "unused.json".into(),
            cache: false,
            cache_capacity: 0,
        }
    }

    fn skills(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_embed_reorders_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(json!({"model": "test-model", "input": ["Python", "SQL"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 1, "embedding": [0.0, 1.0]},
                    {"index": 0, "embedding": [1.0, 0.0]}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            HttpEmbeddingProvider::new(&config(&format!("{}/v1/", server.uri()), "sk-test"))
                .unwrap();
        let vectors = provider.embed(&skills(&["Python", "SQL"])).await.unwrap();

        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let provider = HttpEmbeddingProvider::new(&config(&server.uri(), "")).unwrap();
        let err = provider.embed(&skills(&["Python"])).await.unwrap_err();

        assert!(matches!(err, EngineError::EmbeddingUnavailable(msg) if msg.contains("503")));
    }

    #[tokio::test]
    async fn test_length_mismatch_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [1.0, 0.0]}]
            })))
            .mount(&server)
            .await;

        let provider = HttpEmbeddingProvider::new(&config(&server.uri(), "")).unwrap();
        let err = provider.embed(&skills(&["Python", "SQL"])).await.unwrap_err();

        assert!(matches!(err, EngineError::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn test_duplicate_index_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 0, "embedding": [1.0]},
                    {"index": 0, "embedding": [0.5]}
                ]
            })))
            .mount(&server)
            .await;

        let provider = HttpEmbeddingProvider::new(&config(&server.uri(), "")).unwrap();
        assert!(provider.embed(&skills(&["Python", "SQL"])).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let provider = HttpEmbeddingProvider::new(&config("http://127.0.0.1:9", "")).unwrap();
        assert!(provider.embed(&[]).await.unwrap().is_empty());
    }
}
