//! In-memory [`DocumentStore`] reference implementation.
//!
//! Rows live in `Vec`s behind `std::sync::RwLock`, in creation order, keyed
//! by uuid v4 ids. Suitable for a single-process deployment and for tests;
//! persistent backends implement the same trait.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    Chunk, Document, Message, NewChunk, NewDocument, ProcessingStatus, SourceReference,
};
use crate::store::DocumentStore;

#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<Vec<Document>>,
    chunks: RwLock<Vec<Chunk>>,
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(&self, new: NewDocument) -> Result<Document, StoreError> {
        let document = Document {
            id: Uuid::new_v4().to_string(),
            filename: new.filename,
            filesize: new.filesize,
            filetype: new.filetype,
            status: ProcessingStatus::Pending,
            progress: 0,
            uploaded_at: Utc::now(),
            chunk_count: None,
            error: None,
        };
        self.documents.write().unwrap().push(document.clone());
        Ok(document)
    }

    async fn documents(&self) -> Result<Vec<Document>, StoreError> {
        let guard = self.documents.read().unwrap();
        // Reverse insertion order first so equal timestamps still list the
        // most recently created document first after the stable sort.
        let mut documents: Vec<Document> = guard.iter().rev().cloned().collect();
        documents.sort_by(|left, right| right.uploaded_at.cmp(&left.uploaded_at));
        Ok(documents)
    }

    async fn document(&self, id: &str) -> Result<Option<Document>, StoreError> {
        let guard = self.documents.read().unwrap();
        Ok(guard.iter().find(|document| document.id == id).cloned())
    }

    async fn update_document_status(
        &self,
        id: &str,
        status: ProcessingStatus,
        progress: u8,
    ) -> Result<Document, StoreError> {
        let mut guard = self.documents.write().unwrap();
        let document = guard
            .iter_mut()
            .find(|document| document.id == id)
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))?;

        document.status = status;
        document.progress = document.progress.max(progress);
        Ok(document.clone())
    }

    async fn set_document_chunk_count(
        &self,
        id: &str,
        chunk_count: usize,
    ) -> Result<Document, StoreError> {
        let mut guard = self.documents.write().unwrap();
        let document = guard
            .iter_mut()
            .find(|document| document.id == id)
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))?;

        document.chunk_count = Some(chunk_count);
        Ok(document.clone())
    }

    async fn set_document_error(&self, id: &str, error: &str) -> Result<Document, StoreError> {
        let mut guard = self.documents.write().unwrap();
        let document = guard
            .iter_mut()
            .find(|document| document.id == id)
            .ok_or_else(|| StoreError::DocumentNotFound(id.to_string()))?;

        document.error = Some(error.to_string());
        Ok(document.clone())
    }

    async fn delete_document(&self, id: &str) -> Result<bool, StoreError> {
        let mut documents = self.documents.write().unwrap();
        let before = documents.len();
        documents.retain(|document| document.id != id);

        if documents.len() == before {
            return Ok(false);
        }

        self.chunks
            .write()
            .unwrap()
            .retain(|chunk| chunk.document_id != id);
        Ok(true)
    }

    async fn create_chunk(&self, new: NewChunk) -> Result<Chunk, StoreError> {
        let owner_exists = self
            .documents
            .read()
            .unwrap()
            .iter()
            .any(|document| document.id == new.document_id);
        if !owner_exists {
            return Err(StoreError::DocumentNotFound(new.document_id));
        }

        let chunk = Chunk {
            id: Uuid::new_v4().to_string(),
            document_id: new.document_id,
            content: new.content,
            page: new.page,
            embedding: None,
            error: None,
        };
        self.chunks.write().unwrap().push(chunk.clone());
        Ok(chunk)
    }

    async fn chunk(&self, id: &str) -> Result<Option<Chunk>, StoreError> {
        let guard = self.chunks.read().unwrap();
        Ok(guard.iter().find(|chunk| chunk.id == id).cloned())
    }

    async fn chunks_for_document(&self, document_id: &str) -> Result<Vec<Chunk>, StoreError> {
        let guard = self.chunks.read().unwrap();
        Ok(guard
            .iter()
            .filter(|chunk| chunk.document_id == document_id)
            .cloned()
            .collect())
    }

    async fn attach_chunk_embedding(
        &self,
        id: &str,
        embedding: Vec<f32>,
    ) -> Result<Chunk, StoreError> {
        let mut guard = self.chunks.write().unwrap();
        let chunk = guard
            .iter_mut()
            .find(|chunk| chunk.id == id)
            .ok_or_else(|| StoreError::ChunkNotFound(id.to_string()))?;

        chunk.embedding = Some(embedding);
        Ok(chunk.clone())
    }

    async fn record_chunk_embedding_error(
        &self,
        id: &str,
        error: &str,
    ) -> Result<Chunk, StoreError> {
        let mut guard = self.chunks.write().unwrap();
        let chunk = guard
            .iter_mut()
            .find(|chunk| chunk.id == id)
            .ok_or_else(|| StoreError::ChunkNotFound(id.to_string()))?;

        chunk.embedding = Some(Vec::new());
        chunk.error = Some(error.to_string());
        Ok(chunk.clone())
    }

    async fn create_message(
        &self,
        content: &str,
        is_user: bool,
        sources: Option<Vec<SourceReference>>,
    ) -> Result<Message, StoreError> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            content: content.to_string(),
            is_user,
            timestamp: Utc::now(),
            sources,
        };
        self.messages.write().unwrap().push(message.clone());
        Ok(message)
    }

    async fn messages(&self) -> Result<Vec<Message>, StoreError> {
        Ok(self.messages.read().unwrap().clone())
    }

    async fn clear_messages(&self) -> Result<(), StoreError> {
        self.messages.write().unwrap().clear();
        Ok(())
    }
}
