use crate::error::StoreError;
use crate::models::{
    Chunk, Document, Message, NewChunk, NewDocument, ProcessingStatus, SourceReference,
};
use async_trait::async_trait;

/// Persistence contract for documents, chunks, and the chat message log.
///
/// One pipeline run is the only writer for a given document's status and
/// progress, but pollers read concurrently, so updates must be immediately
/// visible. Implementations clamp progress to `max(old, new)` so a recorded
/// value never goes backwards, even when a failing run requests 0.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn create_document(&self, new: NewDocument) -> Result<Document, StoreError>;

    /// All documents, newest upload first.
    async fn documents(&self) -> Result<Vec<Document>, StoreError>;

    async fn document(&self, id: &str) -> Result<Option<Document>, StoreError>;

    async fn update_document_status(
        &self,
        id: &str,
        status: ProcessingStatus,
        progress: u8,
    ) -> Result<Document, StoreError>;

    async fn set_document_chunk_count(
        &self,
        id: &str,
        chunk_count: usize,
    ) -> Result<Document, StoreError>;

    async fn set_document_error(&self, id: &str, error: &str) -> Result<Document, StoreError>;

    /// Deletes the document and every chunk it owns. Returns `false` when the
    /// id is unknown; never an error.
    async fn delete_document(&self, id: &str) -> Result<bool, StoreError>;

    async fn create_chunk(&self, new: NewChunk) -> Result<Chunk, StoreError>;

    async fn chunk(&self, id: &str) -> Result<Option<Chunk>, StoreError>;

    /// Chunks owned by the document, in creation order.
    async fn chunks_for_document(&self, document_id: &str) -> Result<Vec<Chunk>, StoreError>;

    async fn attach_chunk_embedding(
        &self,
        id: &str,
        embedding: Vec<f32>,
    ) -> Result<Chunk, StoreError>;

    async fn record_chunk_embedding_error(
        &self,
        id: &str,
        error: &str,
    ) -> Result<Chunk, StoreError>;

    async fn create_message(
        &self,
        content: &str,
        is_user: bool,
        sources: Option<Vec<SourceReference>>,
    ) -> Result<Message, StoreError>;

    /// All messages in chronological order.
    async fn messages(&self) -> Result<Vec<Message>, StoreError>;

    async fn clear_messages(&self) -> Result<(), StoreError>;
}
