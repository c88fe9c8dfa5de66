use crate::chunking::split_pages;
use crate::embeddings::{embed_chunks, ChunkVector};
use crate::error::IngestError;
use crate::extractor::ExtractorRegistry;
use crate::models::{Chunk, IngestionOptions, ProcessingStatus};
use crate::store::DocumentStore;
use crate::traits::{EmbeddingProvider, VectorIndex, VectorPoint};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

// Stage progress floors shown to pollers. UI cues, not measured progress;
// the store clamps updates so the recorded value never goes backwards.
pub const PROGRESS_EXTRACTING: u8 = 10;
pub const PROGRESS_CHUNKING: u8 = 30;
pub const PROGRESS_EMBEDDING: u8 = 50;
pub const PROGRESS_INDEXING: u8 = 80;
pub const PROGRESS_COMPLETED: u8 = 100;

/// Result of one ingestion run.
#[derive(Debug)]
pub struct ProcessingReport {
    pub success: bool,
    pub message: Option<String>,
    pub chunks: Vec<Chunk>,
}

/// Drives an uploaded file through extract → chunk → embed → index,
/// advancing the owning document's status and progress at each stage.
///
/// Stage failures (extraction, chunk storage, indexing) mark the document
/// failed and abort the run. Embedding is per-chunk tolerant: a chunk whose
/// provider call fails is recorded with an error and an empty vector, and
/// the run proceeds to indexing with whatever chunks have embeddings.
pub struct IngestionPipeline {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    extractors: ExtractorRegistry,
    options: IngestionOptions,
}

impl IngestionPipeline {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        extractors: ExtractorRegistry,
        options: IngestionOptions,
    ) -> Self {
        Self {
            store,
            index,
            embedder,
            extractors,
            options,
        }
    }

    /// Runs the full pipeline for one document. Never returns an error:
    /// failures are recorded on the document and reported in the result so
    /// background callers have nothing to propagate.
    pub async fn process_document(&self, document_id: &str, file_path: &Path) -> ProcessingReport {
        match self.run(document_id, file_path).await {
            Ok(chunks) => ProcessingReport {
                success: true,
                message: None,
                chunks,
            },
            Err(failure) => {
                error!(document_id, error = %failure, "ingestion failed");
                let _ = self
                    .store
                    .update_document_status(document_id, ProcessingStatus::Failed, 0)
                    .await;
                let _ = self
                    .store
                    .set_document_error(document_id, &failure.to_string())
                    .await;
                ProcessingReport {
                    success: false,
                    message: Some(failure.to_string()),
                    chunks: Vec::new(),
                }
            }
        }
    }

    async fn run(&self, document_id: &str, file_path: &Path) -> Result<Vec<Chunk>, IngestError> {
        let document = self
            .store
            .document(document_id)
            .await
            .map_err(|error| IngestError::NotFound(error.to_string()))?
            .ok_or_else(|| IngestError::NotFound(document_id.to_string()))?;

        self.set_status(document_id, ProcessingStatus::Extracting, PROGRESS_EXTRACTING)
            .await?;
        let extractor = self
            .extractors
            .get(&document.filetype)
            .ok_or_else(|| IngestError::UnsupportedType(document.filetype.clone()))?;
        let pages = extractor.extract_pages(file_path)?;
        info!(document_id, pages = pages.len(), "extracted page text");

        self.set_status(document_id, ProcessingStatus::Chunking, PROGRESS_CHUNKING)
            .await?;
        // Chunks are persisted one at a time so pollers see partial progress.
        let mut chunks = Vec::new();
        for new_chunk in split_pages(document_id, &pages, self.options.chunk_max_chars) {
            let chunk = self
                .store
                .create_chunk(new_chunk)
                .await
                .map_err(|error| IngestError::Chunking(error.to_string()))?;
            chunks.push(chunk);
        }
        self.store
            .set_document_chunk_count(document_id, chunks.len())
            .await
            .map_err(|error| IngestError::Chunking(error.to_string()))?;
        info!(document_id, chunk_count = chunks.len(), "chunks persisted");

        self.set_status(document_id, ProcessingStatus::Embedding, PROGRESS_EMBEDDING)
            .await?;
        let batch = embed_chunks(self.embedder.as_ref(), &chunks).await;
        for ((chunk_id, outcome), chunk) in batch.items.iter().zip(chunks.iter_mut()) {
            *chunk = match outcome {
                ChunkVector::Embedded(vector) => self
                    .store
                    .attach_chunk_embedding(chunk_id, vector.clone())
                    .await
                    .map_err(|error| IngestError::Chunking(error.to_string()))?,
                ChunkVector::Failed(reason) => self
                    .store
                    .record_chunk_embedding_error(chunk_id, reason)
                    .await
                    .map_err(|error| IngestError::Chunking(error.to_string()))?,
            };
        }
        if batch.failed_count() > 0 {
            warn!(
                document_id,
                failed = batch.failed_count(),
                embedded = batch.embedded_count(),
                "proceeding to indexing without the failed chunks"
            );
        }

        self.set_status(document_id, ProcessingStatus::Indexing, PROGRESS_INDEXING)
            .await?;
        let points: Vec<VectorPoint> = chunks
            .iter()
            .filter(|chunk| chunk.has_embedding())
            .map(|chunk| VectorPoint {
                chunk_id: chunk.id.clone(),
                vector: chunk.embedding.clone().unwrap_or_default(),
            })
            .collect();
        self.index
            .add(document_id, self.embedder.model(), points)
            .await?;

        self.set_status(document_id, ProcessingStatus::Completed, PROGRESS_COMPLETED)
            .await?;
        info!(document_id, "ingestion completed");
        Ok(chunks)
    }

    async fn set_status(
        &self,
        document_id: &str,
        status: ProcessingStatus,
        progress: u8,
    ) -> Result<(), IngestError> {
        self.store
            .update_document_status(document_id, status, progress)
            .await
            .map_err(|error| IngestError::NotFound(error.to_string()))?;
        Ok(())
    }
}
