//! Data types for knowledge entries, retrieval candidates, and agent results.

use serde::{Deserialize, Serialize};

use crate::intent::Intent;

/// One curated knowledge base row, as stored by a [`VectorStore`](crate::VectorStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KnowledgeEntry {
    /// Stable identifier of the row (the sheet's `chunk_id` column).
    pub chunk_id: String,
    /// Optional grouping label such as "amenities" or "policies".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// The text shown to the completion model as context.
    pub content: String,
    /// Raw embedding as returned by the embedding provider.
    pub embedding: Vec<f32>,
    /// Unit-length copy of `embedding`; this is what similarity search uses.
    pub embedding_norm: Vec<f32>,
}

/// A single retrieval hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    /// Identifier of the matching entry.
    pub id: String,
    /// Content of the matching entry.
    pub content: String,
    /// Dissimilarity to the query in the store's metric (smaller is closer).
    pub distance: f32,
    /// Category of the matching entry, when the store returns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Candidate {
    /// Create an uncategorized candidate.
    pub fn new(id: impl Into<String>, content: impl Into<String>, distance: f32) -> Self {
        Self { id: id.into(), content: content.into(), distance, category: None }
    }
}

/// The outcome of handling one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub answer: String,
    /// Distance of the best retrieval hit, when retrieval produced one.
    pub confidence: Option<f32>,
    pub used_fallback: bool,
    pub intent: Intent,
}
