//! The embed → normalize → search round trip.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::document::Candidate;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, with_deadline};
use crate::normalize::normalize;
use crate::vectorstore::VectorStore;

/// Turns a question into an ordered list of knowledge base candidates.
///
/// Embedding failures propagate. Store failures do not: they are logged and
/// reported as an empty candidate set so the caller falls back gracefully.
pub struct KnowledgeRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    match_threshold: Option<f32>,
    call_timeout: Duration,
}

impl KnowledgeRetriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        call_timeout: Duration,
    ) -> Self {
        Self { embedder, store, match_threshold: None, call_timeout }
    }

    /// Forward an advisory pre-filter to the store.
    pub fn with_match_threshold(mut self, threshold: Option<f32>) -> Self {
        self.match_threshold = threshold;
        self
    }

    /// Embed and normalize `text`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingError`] if the provider fails or times out,
    /// and [`RagError::DegenerateVector`] if it returns a zero vector.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let raw = with_deadline(self.call_timeout, self.embedder.embed(text), |message| {
            RagError::EmbeddingError { provider: "embedder".to_string(), message }
        })
        .await?;
        normalize(&raw)
    }

    /// Retrieve up to `k` candidates for `question`, nearest first.
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<Candidate>> {
        let query = self.embed_query(question).await?;
        Ok(self.search(&query, k).await)
    }

    /// Search with an already-normalized query vector.
    ///
    /// Always returns candidates sorted ascending by distance, at most `k`
    /// long. Candidates with a non-finite distance are discarded.
    pub async fn search(&self, query: &[f32], k: usize) -> Vec<Candidate> {
        let search = self.store.search(query, k, self.match_threshold);
        let result = with_deadline(self.call_timeout, search, |message| {
            RagError::VectorStoreError { backend: "store".to_string(), message }
        })
        .await;

        let mut candidates = match result {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, kind = %e.kind(), "knowledge search failed; treating as no candidates");
                return Vec::new();
            }
        };

        let returned = candidates.len();
        candidates.retain(|c| c.distance.is_finite());
        if candidates.len() != returned {
            warn!(dropped = returned - candidates.len(), "discarded candidates with non-finite distance");
        }
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        candidates.truncate(k);

        debug!(candidate_count = candidates.len(), "knowledge search completed");
        candidates
    }
}
