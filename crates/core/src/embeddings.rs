use crate::error::ProviderError;
use crate::models::Chunk;
use crate::traits::EmbeddingProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct EmbeddingClientConfig {
    /// Full URL of the embeddings endpoint, e.g. `http://host/v1/embeddings`.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// Client for an external embedding endpoint speaking the
/// `{input, model}` → `{data: [{embedding: [...]}]}` wire format.
pub struct HttpEmbeddingClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}

impl HttpEmbeddingClient {
    pub fn new(config: EmbeddingClientConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            endpoint: config.endpoint,
            model: config.model,
            api_key: config.api_key,
            client,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            input: text,
            model: &self.model,
        });

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                details: details.chars().take(200).collect(),
            });
        }

        let payload: EmbeddingResponse = response
            .json()
            .await
            .map_err(|error| ProviderError::Malformed(error.to_string()))?;

        let vector = payload
            .data
            .into_iter()
            .next()
            .map(|row| row.embedding)
            .ok_or_else(|| ProviderError::Malformed("response contained no embedding".to_string()))?;

        if vector.is_empty() {
            return Err(ProviderError::Malformed(
                "response embedding was empty".to_string(),
            ));
        }

        Ok(vector)
    }
}

/// Outcome of embedding one chunk: either a vector or the reason it failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkVector {
    Embedded(Vec<f32>),
    Failed(String),
}

/// Per-chunk embedding results for one batch, in input order.
#[derive(Debug, Default)]
pub struct ChunkVectorBatch {
    pub items: Vec<(String, ChunkVector)>,
}

impl ChunkVectorBatch {
    pub fn embedded_count(&self) -> usize {
        self.items
            .iter()
            .filter(|(_, outcome)| matches!(outcome, ChunkVector::Embedded(_)))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.items.len() - self.embedded_count()
    }
}

/// Embeds every chunk in the batch, one at a time. A chunk whose provider
/// call fails gets a `Failed` outcome with the cause; the batch itself never
/// aborts, so one bad chunk cannot sink the rest of the document.
pub async fn embed_chunks(provider: &dyn EmbeddingProvider, chunks: &[Chunk]) -> ChunkVectorBatch {
    let mut batch = ChunkVectorBatch::default();

    for chunk in chunks {
        let outcome = match provider.embed(&chunk.content).await {
            Ok(vector) => ChunkVector::Embedded(vector),
            Err(error) => {
                warn!(
                    chunk_id = %chunk.id,
                    document_id = %chunk.document_id,
                    %error,
                    "chunk embedding failed, continuing batch"
                );
                ChunkVector::Failed(error.to_string())
            }
        };
        batch.items.push((chunk.id.clone(), outcome));
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FlakyEmbedder {
        fn model(&self) -> &str {
            "test-embed"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            if text.contains("poison") {
                Err(ProviderError::Status {
                    status: 500,
                    details: "upstream exploded".to_string(),
                })
            } else {
                Ok(vec![1.0, 0.0])
            }
        }
    }

    fn chunk(id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: "doc-1".to_string(),
            content: content.to_string(),
            page: Some(1),
            embedding: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let chunks = vec![
            chunk("c1", "fine"),
            chunk("c2", "poison pill"),
            chunk("c3", "also fine"),
        ];

        let batch = embed_chunks(&FlakyEmbedder, &chunks).await;

        assert_eq!(batch.items.len(), 3);
        assert_eq!(batch.embedded_count(), 2);
        assert_eq!(batch.failed_count(), 1);
        assert!(matches!(batch.items[1].1, ChunkVector::Failed(_)));
        assert_eq!(batch.items[1].0, "c2");
    }

    #[test]
    fn response_body_parses_expected_shape() {
        let body = r#"{"data":[{"embedding":[0.25,-0.5,1.0]}]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data[0].embedding, vec![0.25, -0.5, 1.0]);
    }

    #[test]
    fn response_without_data_rows_is_detectable() {
        let body = r#"{"data":[]}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.data.is_empty());
    }
}
