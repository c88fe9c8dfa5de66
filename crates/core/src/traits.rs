use crate::error::{IngestError, ProviderError};
use crate::models::PageText;
use async_trait::async_trait;
use std::path::Path;

/// Converts an uploaded file into an ordered sequence of page texts.
/// Implementations are registered per MIME type; see `ExtractorRegistry`.
pub trait TextExtractor: Send + Sync {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError>;
}

/// Turns text into a fixed-length vector using a named embedding model.
///
/// Ingestion and querying must go through the same provider instance so both
/// sides of a similarity search live in the same embedding space.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the model producing the vectors, stamped onto the index.
    fn model(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError>;
}

/// Produces a free-text answer from a question plus retrieved context.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, question: &str, context: &[String]) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct VectorPoint {
    pub chunk_id: String,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarChunk {
    pub chunk_id: String,
    pub score: f32,
}

/// Nearest-neighbor lookup over chunk embeddings. `add` is append-only per
/// document; entries are immutable once written.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Inserts points for a document. Points with empty vectors (failed
    /// embeddings) are skipped, not rejected.
    async fn add(
        &self,
        document_id: &str,
        model: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), IngestError>;

    /// Returns up to `top_k` chunk ids by descending similarity. Ties break
    /// toward earlier-inserted entries; an empty index yields an empty result.
    async fn search(
        &self,
        query: &[f32],
        model: &str,
        top_k: usize,
    ) -> Result<Vec<SimilarChunk>, IngestError>;

    /// Drops every point owned by the document. Unknown ids are a no-op.
    async fn remove_document(&self, document_id: &str) -> Result<(), IngestError>;

    async fn size(&self) -> usize;
}
