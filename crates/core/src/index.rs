use crate::error::IngestError;
use crate::traits::{SimilarChunk, VectorIndex, VectorPoint};
use async_trait::async_trait;
use std::sync::RwLock;

struct IndexEntry {
    chunk_id: String,
    document_id: String,
    vector: Vec<f32>,
}

/// Brute-force in-memory vector index. Entries keep insertion order, which is
/// the tiebreaker for equal similarity scores. Every vector is stamped with
/// the embedding model the index was built for; mixing models silently
/// degrades retrieval, so mismatched writes and queries are rejected.
pub struct MemoryVectorIndex {
    model: String,
    entries: RwLock<Vec<IndexEntry>>,
}

impl MemoryVectorIndex {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            entries: RwLock::new(Vec::new()),
        }
    }

    fn check_model(&self, requested: &str) -> Result<(), IngestError> {
        if requested != self.model {
            return Err(IngestError::ModelMismatch {
                indexed: self.model.clone(),
                requested: requested.to_string(),
            });
        }
        Ok(())
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a < f32::EPSILON || mag_b < f32::EPSILON {
        0.0
    } else {
        dot / (mag_a * mag_b)
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn add(
        &self,
        document_id: &str,
        model: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), IngestError> {
        self.check_model(model)?;

        let mut entries = self.entries.write().unwrap();
        for point in points {
            // Chunks whose embedding failed arrive with an empty vector and
            // must never become searchable.
            if point.vector.is_empty() {
                continue;
            }
            entries.push(IndexEntry {
                chunk_id: point.chunk_id,
                document_id: document_id.to_string(),
                vector: point.vector,
            });
        }
        Ok(())
    }

    async fn search(
        &self,
        query: &[f32],
        model: &str,
        top_k: usize,
    ) -> Result<Vec<SimilarChunk>, IngestError> {
        self.check_model(model)?;

        let entries = self.entries.read().unwrap();
        let mut hits: Vec<SimilarChunk> = entries
            .iter()
            .map(|entry| SimilarChunk {
                chunk_id: entry.chunk_id.clone(),
                score: cosine_similarity(query, &entry.vector),
            })
            .collect();

        // Stable sort: equal scores keep insertion order, so the
        // earlier-inserted chunk wins the tie.
        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    async fn remove_document(&self, document_id: &str) -> Result<(), IngestError> {
        self.entries
            .write()
            .unwrap()
            .retain(|entry| entry.document_id != document_id);
        Ok(())
    }

    async fn size(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}
