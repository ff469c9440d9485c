//! Vector store trait for the curated knowledge base.

use async_trait::async_trait;

use crate::document::{Candidate, KnowledgeEntry};
use crate::error::Result;

/// A stored entry's identity and current content, used to skip unchanged rows
/// during ingestion.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub chunk_id: String,
    pub content: String,
}

/// A storage backend for knowledge entries with nearest-neighbor search.
///
/// The store owns the knowledge base; the concierge only reads from it while
/// answering and writes to it during ingestion.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Search for the `top_k` entries nearest to a normalized query embedding.
    ///
    /// `match_threshold` is forwarded to backends that support a server-side
    /// pre-filter. It is advisory: the confidence gate is always re-applied
    /// locally to whatever comes back.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        match_threshold: Option<f32>,
    ) -> Result<Vec<Candidate>>;

    /// Look up an entry by its chunk identifier.
    async fn find(&self, chunk_id: &str) -> Result<Option<StoredEntry>>;

    /// Insert or replace an entry, keyed by `chunk_id`.
    async fn upsert(&self, entry: &KnowledgeEntry) -> Result<()>;

    /// Return every stored raw embedding, keyed by chunk identifier.
    async fn raw_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>>;

    /// Overwrite the normalized embedding of one entry.
    async fn update_normalized(&self, chunk_id: &str, embedding_norm: &[f32]) -> Result<()>;
}
