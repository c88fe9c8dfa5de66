pub mod answer;
pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod generation;
pub mod index;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod stores;
pub mod traits;

pub use answer::{
    Answer, AnswerEngine, APOLOGY_ANSWER, NO_KNOWLEDGE_BASE_ANSWER, NO_MATCH_ANSWER,
};
pub use chunking::split_pages;
pub use embeddings::{
    embed_chunks, ChunkVector, ChunkVectorBatch, EmbeddingClientConfig, HttpEmbeddingClient,
};
pub use error::{AnswerError, IngestError, ProviderError, StoreError};
pub use extractor::{
    DocxTextExtractor, ExtractorRegistry, PdfTextExtractor, PlainTextExtractor, MIME_DOCX,
    MIME_PDF, MIME_TXT,
};
pub use generation::{GenerationClientConfig, HttpGenerationClient};
pub use index::MemoryVectorIndex;
pub use models::{
    Chunk, Document, IngestionOptions, Message, NewChunk, NewDocument, PageText,
    ProcessingStatus, SourceReference,
};
pub use pipeline::{IngestionPipeline, ProcessingReport};
pub use store::DocumentStore;
pub use stores::MemoryStore;
pub use traits::{
    EmbeddingProvider, GenerationProvider, SimilarChunk, TextExtractor, VectorIndex, VectorPoint,
};
