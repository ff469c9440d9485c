//! In-memory vector store using cosine distance.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency knowledge
//! store backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is
//! suitable for development, testing, and small curated knowledge bases.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Candidate, KnowledgeEntry};
use crate::error::{RagError, Result};
use crate::vectorstore::{StoredEntry, VectorStore};

/// An in-memory knowledge store ranking entries by cosine distance.
///
/// Entries are keyed by `chunk_id`. Search compares the query against each
/// entry's `embedding_norm` and reports `1 - cosine_similarity` as the
/// distance, so `0.0` is an exact match. The advisory `match_threshold` is
/// ignored.
///
/// # Example
///
/// ```rust,ignore
/// use concierge_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.upsert(&entry).await?;
/// let hits = store.search(&query, 5, None).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<HashMap<String, KnowledgeEntry>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Fetch a full entry, including both embeddings.
    pub async fn get(&self, chunk_id: &str) -> Option<KnowledgeEntry> {
        self.entries.read().await.get(chunk_id).cloned()
    }
}

/// Cosine distance (`1 - cosine similarity`) between two vectors.
///
/// Returns `None` when the vectors differ in length or either has zero
/// magnitude.
fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(1.0 - dot / (norm_a * norm_b))
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        _match_threshold: Option<f32>,
    ) -> Result<Vec<Candidate>> {
        let entries = self.entries.read().await;

        let mut scored: Vec<Candidate> = entries
            .values()
            .filter_map(|entry| {
                let distance = cosine_distance(&entry.embedding_norm, embedding)?;
                Some(Candidate {
                    id: entry.chunk_id.clone(),
                    content: entry.content.clone(),
                    distance,
                    category: entry.category.clone(),
                })
            })
            .collect();

        scored.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn find(&self, chunk_id: &str) -> Result<Option<StoredEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(chunk_id).map(|entry| StoredEntry {
            chunk_id: entry.chunk_id.clone(),
            content: entry.content.clone(),
        }))
    }

    async fn upsert(&self, entry: &KnowledgeEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.chunk_id.clone(), entry.clone());
        Ok(())
    }

    async fn raw_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>> {
        let entries = self.entries.read().await;
        Ok(entries
            .values()
            .filter(|entry| !entry.embedding.is_empty())
            .map(|entry| (entry.chunk_id.clone(), entry.embedding.clone()))
            .collect())
    }

    async fn update_normalized(&self, chunk_id: &str, embedding_norm: &[f32]) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(chunk_id).ok_or_else(|| RagError::VectorStoreError {
            backend: "InMemory".to_string(),
            message: format!("entry '{chunk_id}' does not exist"),
        })?;
        entry.embedding_norm = embedding_norm.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, content: &str, norm: Vec<f32>) -> KnowledgeEntry {
        KnowledgeEntry {
            chunk_id: id.to_string(),
            category: None,
            content: content.to_string(),
            embedding: norm.clone(),
            embedding_norm: norm,
        }
    }

    #[test]
    fn cosine_distance_bounds() {
        assert_eq!(cosine_distance(&[1.0, 0.0], &[1.0, 0.0]), Some(0.0));
        assert_eq!(cosine_distance(&[1.0, 0.0], &[0.0, 1.0]), Some(1.0));
        assert_eq!(cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]), Some(2.0));
        assert_eq!(cosine_distance(&[1.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), None);
    }

    #[tokio::test]
    async fn search_orders_by_ascending_distance() {
        let store = InMemoryVectorStore::new();
        store.upsert(&entry("far", "spa hours", vec![0.0, 1.0])).await.unwrap();
        store.upsert(&entry("near", "parking", vec![1.0, 0.0])).await.unwrap();
        store.upsert(&entry("mid", "valet", vec![0.6, 0.8])).await.unwrap();

        let hits = store.search(&[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "near");
        assert_eq!(hits[1].id, "mid");
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[tokio::test]
    async fn upsert_replaces_by_chunk_id() {
        let store = InMemoryVectorStore::new();
        store.upsert(&entry("pool", "open 8-6", vec![1.0, 0.0])).await.unwrap();
        store.upsert(&entry("pool", "open 7-9", vec![1.0, 0.0])).await.unwrap();
        assert_eq!(store.len().await, 1);
        let found = store.find("pool").await.unwrap().unwrap();
        assert_eq!(found.content, "open 7-9");
        assert!(store.find("gym").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_normalized_requires_existing_entry() {
        let store = InMemoryVectorStore::new();
        let err = store.update_normalized("ghost", &[1.0]).await.unwrap_err();
        assert!(matches!(err, RagError::VectorStoreError { .. }));
    }
}
