use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an uploaded document as the ingestion pipeline advances it.
///
/// Transitions only move forward through the processing stages, or jump to
/// `Failed` from any non-terminal stage. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Extracting,
    Chunking,
    Embedding,
    Indexing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcessingStatus::Completed | ProcessingStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub filesize: u64,
    pub filetype: String,
    pub status: ProcessingStatus,
    /// 0–100. Never decreases for a given document; see `DocumentStore`.
    pub progress: u8,
    pub uploaded_at: DateTime<Utc>,
    /// Set once chunking completes; equals the number of chunk rows created.
    pub chunk_count: Option<usize>,
    pub error: Option<String>,
}

/// Upload-time fields for a new document record.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub filename: String,
    pub filesize: u64,
    pub filetype: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub page: Option<u32>,
    /// Absent until the embedder succeeds for this chunk.
    pub embedding: Option<Vec<f32>>,
    /// Recorded when embedding this chunk failed; such chunks are never indexed.
    pub error: Option<String>,
}

impl Chunk {
    pub fn has_embedding(&self) -> bool {
        self.embedding.as_ref().is_some_and(|vector| !vector.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct NewChunk {
    pub document_id: String,
    pub content: String,
    pub page: Option<u32>,
}

/// Citation attached to an assistant message, pointing back into a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceReference {
    pub text: String,
    pub document_id: String,
    pub document_name: String,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    pub sources: Option<Vec<SourceReference>>,
}

/// One page of extracted text, 1-indexed.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct IngestionOptions {
    /// Maximum characters per chunk. A page longer than this is split into
    /// multiple chunks carrying the same page number.
    pub chunk_max_chars: usize,
    /// Number of chunks retrieved per question.
    pub top_k: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            chunk_max_chars: 500,
            top_k: 4,
        }
    }
}
