use thiserror::Error;

/// Stage-level ingestion failures. Any of these marks the owning document as
/// failed and aborts the run; per-chunk embedding failures are not errors at
/// this level and are recorded on the chunk instead.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("chunk storage failed: {0}")]
    Chunking(String),

    #[error("vector index write failed: {0}")]
    Indexing(String),

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("embedding model mismatch: index holds {indexed}, request used {requested}")]
    ModelMismatch { indexed: String, requested: String },
}

/// Failures talking to an external embedding or generation endpoint.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider returned status {status}: {details}")]
    Status { status: u16, details: String },

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    #[error("chunk not found: {0}")]
    ChunkNotFound(String),
}

/// Internal answer-engine failures. These never reach callers of
/// `AnswerEngine::answer_question`; they are converted into an apologetic
/// answer with no sources.
#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("index error: {0}")]
    Index(#[from] IngestError),
}

pub type Result<T, E = IngestError> = std::result::Result<T, E>;
