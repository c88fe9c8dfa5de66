use crate::error::AnswerError;
use crate::models::{ProcessingStatus, SourceReference};
use crate::store::DocumentStore;
use crate::traits::{EmbeddingProvider, GenerationProvider, VectorIndex};
use std::sync::Arc;
use tracing::{error, info};

/// Fixed reply when no document has finished ingestion yet.
pub const NO_KNOWLEDGE_BASE_ANSWER: &str =
    "I don't have any documents in my knowledge base yet. Please upload some documents first.";

/// Fixed reply when retrieval finds nothing relevant.
pub const NO_MATCH_ANSWER: &str = "I couldn't find information related to that in your \
documents. Try rephrasing the question or uploading more relevant documents.";

/// Fixed reply when anything goes wrong internally.
pub const APOLOGY_ANSWER: &str =
    "I'm sorry, I ran into an error while trying to answer your question. Please try again.";

#[derive(Debug, Clone)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SourceReference>,
}

impl Answer {
    fn without_sources(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            sources: Vec::new(),
        }
    }
}

/// Answers questions over the ingested knowledge base: embeds the question
/// with the same provider used at ingestion, retrieves the top-k most similar
/// chunks, and asks the generation provider for an answer bounded to that
/// context. Internal failures degrade to [`APOLOGY_ANSWER`]; callers never
/// see an error.
pub struct AnswerEngine {
    store: Arc<dyn DocumentStore>,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    top_k: usize,
}

impl AnswerEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
        top_k: usize,
    ) -> Self {
        Self {
            store,
            index,
            embedder,
            generator,
            top_k,
        }
    }

    pub async fn answer_question(&self, question: &str) -> Answer {
        match self.try_answer(question).await {
            Ok(answer) => answer,
            Err(failure) => {
                error!(error = %failure, "answer engine degraded to apology");
                Answer::without_sources(APOLOGY_ANSWER)
            }
        }
    }

    async fn try_answer(&self, question: &str) -> Result<Answer, AnswerError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnswerError::EmptyQuestion);
        }

        let documents = self.store.documents().await?;
        let any_completed = documents
            .iter()
            .any(|document| document.status == ProcessingStatus::Completed);
        if !any_completed {
            return Ok(Answer::without_sources(NO_KNOWLEDGE_BASE_ANSWER));
        }

        let query_vector = self.embedder.embed(question).await?;
        let hits = self
            .index
            .search(&query_vector, self.embedder.model(), self.top_k)
            .await?;
        if hits.is_empty() {
            return Ok(Answer::without_sources(NO_MATCH_ANSWER));
        }

        // Resolve hits back to chunk rows and their owning documents. A hit
        // whose chunk or document was deleted since indexing is dropped.
        let mut context = Vec::new();
        let mut sources = Vec::new();
        for hit in &hits {
            let Some(chunk) = self.store.chunk(&hit.chunk_id).await? else {
                continue;
            };
            let Some(document) = self.store.document(&chunk.document_id).await? else {
                continue;
            };

            context.push(chunk.content.clone());
            sources.push(SourceReference {
                text: chunk.content,
                document_id: document.id,
                document_name: document.filename,
                page: chunk.page,
            });
        }

        if context.is_empty() {
            return Ok(Answer::without_sources(NO_MATCH_ANSWER));
        }

        info!(
            retrieved = context.len(),
            "generating answer from retrieved chunks"
        );
        let answer = self.generator.generate(question, &context).await?;

        Ok(Answer { answer, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::index::MemoryVectorIndex;
    use crate::models::{NewChunk, NewDocument};
    use crate::stores::MemoryStore;
    use crate::traits::VectorPoint;
    use async_trait::async_trait;

    const MODEL: &str = "test-embed";

    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn model(&self) -> &str {
            MODEL
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
            // Crude two-axis embedding so tests can steer similarity.
            let hydraulics = text.contains("hydraulic") as u8 as f32;
            let finance = text.contains("revenue") as u8 as f32;
            Ok(vec![hydraulics, finance])
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl EmbeddingProvider for BrokenEmbedder {
        fn model(&self) -> &str {
            MODEL
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            Err(ProviderError::Status {
                status: 503,
                details: "unavailable".to_string(),
            })
        }
    }

    struct EchoGenerator;

    #[async_trait]
    impl GenerationProvider for EchoGenerator {
        async fn generate(
            &self,
            question: &str,
            context: &[String],
        ) -> Result<String, ProviderError> {
            Ok(format!("{} chunks about: {}", context.len(), question))
        }
    }

    async fn seed_document(
        store: &MemoryStore,
        index: &MemoryVectorIndex,
        embedder: &KeywordEmbedder,
        filename: &str,
        contents: &[&str],
    ) -> String {
        let document = store
            .create_document(NewDocument {
                filename: filename.to_string(),
                filesize: 100,
                filetype: "text/plain".to_string(),
            })
            .await
            .unwrap();

        let mut points = Vec::new();
        for (page, content) in contents.iter().enumerate() {
            let chunk = store
                .create_chunk(NewChunk {
                    document_id: document.id.clone(),
                    content: content.to_string(),
                    page: Some(page as u32 + 1),
                })
                .await
                .unwrap();
            let vector = embedder.embed(content).await.unwrap();
            store
                .attach_chunk_embedding(&chunk.id, vector.clone())
                .await
                .unwrap();
            points.push(VectorPoint {
                chunk_id: chunk.id,
                vector,
            });
        }
        index.add(&document.id, MODEL, points).await.unwrap();

        store
            .update_document_status(&document.id, ProcessingStatus::Completed, 100)
            .await
            .unwrap();
        document.id
    }

    fn engine(
        store: Arc<MemoryStore>,
        index: Arc<MemoryVectorIndex>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> AnswerEngine {
        AnswerEngine::new(store, index, embedder, Arc::new(EchoGenerator), 3)
    }

    #[tokio::test]
    async fn empty_knowledge_base_gets_fixed_answer() {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryVectorIndex::new(MODEL));
        let engine = engine(store, index, Arc::new(KeywordEmbedder));

        let answer = engine.answer_question("what is the revenue?").await;
        assert_eq!(answer.answer, NO_KNOWLEDGE_BASE_ANSWER);
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn pending_documents_do_not_count_as_knowledge() {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryVectorIndex::new(MODEL));
        store
            .create_document(NewDocument {
                filename: "still-processing.pdf".to_string(),
                filesize: 100,
                filetype: "application/pdf".to_string(),
            })
            .await
            .unwrap();
        let engine = engine(store, index, Arc::new(KeywordEmbedder));

        let answer = engine.answer_question("anything?").await;
        assert_eq!(answer.answer, NO_KNOWLEDGE_BASE_ANSWER);
    }

    #[tokio::test]
    async fn answer_carries_sources_from_retrieved_chunks() {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryVectorIndex::new(MODEL));
        let embedder = KeywordEmbedder;
        let document_id = seed_document(
            &store,
            &index,
            &embedder,
            "manual.txt",
            &["the hydraulic pump needs 20 bar", "unrelated appendix"],
        )
        .await;

        let engine = engine(store, index, Arc::new(KeywordEmbedder));
        let answer = engine
            .answer_question("how much pressure does the hydraulic pump need?")
            .await;

        assert!(answer.answer.contains("chunks about"));
        assert!(!answer.sources.is_empty());
        assert_eq!(answer.sources[0].document_id, document_id);
        assert_eq!(answer.sources[0].document_name, "manual.txt");
        assert_eq!(answer.sources[0].page, Some(1));
        assert!(answer.sources[0].text.contains("hydraulic"));
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_apology() {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryVectorIndex::new(MODEL));
        seed_document(
            &store,
            &index,
            &KeywordEmbedder,
            "manual.txt",
            &["the hydraulic pump needs 20 bar"],
        )
        .await;

        let engine = engine(store, index, Arc::new(BrokenEmbedder));
        let answer = engine.answer_question("hydraulic?").await;
        assert_eq!(answer.answer, APOLOGY_ANSWER);
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn empty_question_degrades_to_apology() {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryVectorIndex::new(MODEL));
        let engine = engine(store, index, Arc::new(KeywordEmbedder));

        let answer = engine.answer_question("   ").await;
        assert_eq!(answer.answer, APOLOGY_ANSWER);
    }

    #[tokio::test]
    async fn deleted_chunks_are_dropped_from_results() {
        let store = Arc::new(MemoryStore::new());
        let index = Arc::new(MemoryVectorIndex::new(MODEL));
        let document_id = seed_document(
            &store,
            &index,
            &KeywordEmbedder,
            "manual.txt",
            &["the hydraulic pump needs 20 bar"],
        )
        .await;

        // Another completed document keeps the knowledge-base guard open
        // after the first one disappears.
        seed_document(
            &store,
            &index,
            &KeywordEmbedder,
            "other.txt",
            &["quarterly revenue grew"],
        )
        .await;

        // Simulate deletion racing a stale index entry: chunks are gone but
        // the vectors were not evicted.
        store.delete_document(&document_id).await.unwrap();

        let engine = engine(store, index, Arc::new(KeywordEmbedder));
        let answer = engine.answer_question("hydraulic pressure?").await;
        assert!(answer
            .sources
            .iter()
            .all(|source| source.document_id != document_id));
    }
}
