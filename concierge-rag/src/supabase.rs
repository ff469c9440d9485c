//! Supabase (PostgREST + pgvector) knowledge store.
//!
//! Provides [`SupabaseVectorStore`] which implements [`VectorStore`] over the
//! Supabase REST API with `reqwest`.
//!
//! # Prerequisites
//!
//! - A `knowledge_base` table with columns `chunk_id` (unique), `category`,
//!   `content`, `embedding vector`, and `embedding_norm vector`.
//! - A `match_knowledge_base(query_embedding, match_threshold, match_count)`
//!   SQL function returning `chunk_id, category, content, distance` ordered by
//!   ascending distance.
//!
//! This module is only available when the `supabase` feature is enabled.

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::document::{Candidate, KnowledgeEntry};
use crate::error::{RagError, Result};
use crate::vectorstore::{StoredEntry, VectorStore};

const BACKEND: &str = "supabase";

/// Default name of the knowledge base table.
pub const DEFAULT_TABLE: &str = "knowledge_base";

/// Default name of the similarity search RPC.
pub const DEFAULT_MATCH_FUNCTION: &str = "match_knowledge_base";

/// A [`VectorStore`] backed by a Supabase project.
#[derive(Clone)]
pub struct SupabaseVectorStore {
    client: reqwest::Client,
    base_url: String,
    service_key: String,
    table: String,
    match_function: String,
}

impl SupabaseVectorStore {
    /// Create a store for the project at `url` authenticated with a service role key.
    pub fn new(url: impl Into<String>, service_key: impl Into<String>) -> Result<Self> {
        let base_url = url.into().trim_end_matches('/').to_string();
        let service_key = service_key.into();
        if base_url.is_empty() || service_key.trim().is_empty() {
            return Err(RagError::ConfigError(
                "Supabase URL and service role key are required".to_string(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            service_key,
            table: DEFAULT_TABLE.to_string(),
            match_function: DEFAULT_MATCH_FUNCTION.to_string(),
        })
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_match_function(mut self, function: impl Into<String>) -> Self {
        self.match_function = function.into();
        self
    }

    fn map_err(e: reqwest::Error) -> RagError {
        RagError::VectorStoreError { backend: BACKEND.to_string(), message: e.to_string() }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("apikey", &self.service_key).bearer_auth(&self.service_key)
    }

    /// Send `request` and decode a JSON body, turning non-2xx into errors.
    async fn send_json<T: for<'de> Deserialize<'de>>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.authed(request).send().await.map_err(Self::map_err)?;
        let response = Self::check(response).await?;
        response.json::<T>().await.map_err(Self::map_err)
    }

    /// Send `request`, discarding any body.
    async fn send(&self, request: RequestBuilder) -> Result<()> {
        let response = self.authed(request).send().await.map_err(Self::map_err)?;
        Self::check(response).await.map(|_| ())
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(RagError::VectorStoreError {
            backend: BACKEND.to_string(),
            message: format!("API returned {status}: {body}"),
        })
    }
}

// ── PostgREST row types ────────────────────────────────────────────

#[derive(Deserialize)]
struct MatchRow {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    chunk_id: Option<String>,
    #[serde(default)]
    category: Option<String>,
    content: String,
    distance: f64,
}

impl MatchRow {
    fn into_candidate(self) -> Candidate {
        let id = self.chunk_id.unwrap_or_else(|| match self.id {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        });
        Candidate { id, content: self.content, distance: self.distance as f32, category: self.category }
    }
}

#[derive(Deserialize)]
struct ContentRow {
    chunk_id: String,
    content: String,
}

/// pgvector columns arrive either as JSON arrays or as their text form `"[1,2,3]"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum VectorColumn {
    Array(Vec<f32>),
    Text(String),
}

impl VectorColumn {
    fn into_vec(self) -> Result<Vec<f32>> {
        match self {
            VectorColumn::Array(values) => Ok(values),
            VectorColumn::Text(text) => serde_json::from_str(&text).map_err(|e| {
                RagError::VectorStoreError {
                    backend: BACKEND.to_string(),
                    message: format!("unrecognised embedding format: {e}"),
                }
            }),
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingRow {
    chunk_id: String,
    embedding: Option<VectorColumn>,
}

#[derive(Serialize)]
struct UpsertRow<'a> {
    chunk_id: &'a str,
    category: Option<&'a str>,
    content: &'a str,
    embedding: &'a [f32],
    embedding_norm: &'a [f32],
}

#[async_trait]
impl VectorStore for SupabaseVectorStore {
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        match_threshold: Option<f32>,
    ) -> Result<Vec<Candidate>> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, self.match_function);
        let body = json!({
            "query_embedding": embedding,
            "match_threshold": match_threshold,
            "match_count": top_k,
        });

        let rows: Vec<MatchRow> = self.send_json(self.client.post(url).json(&body)).await?;
        debug!(backend = BACKEND, row_count = rows.len(), "match rpc returned");
        Ok(rows.into_iter().map(MatchRow::into_candidate).collect())
    }

    async fn find(&self, chunk_id: &str) -> Result<Option<StoredEntry>> {
        let request = self.client.get(self.table_url()).query(&[
            ("select", "chunk_id,content".to_string()),
            ("chunk_id", format!("eq.{chunk_id}")),
            ("limit", "1".to_string()),
        ]);
        let rows: Vec<ContentRow> = self.send_json(request).await?;
        Ok(rows
            .into_iter()
            .next()
            .map(|row| StoredEntry { chunk_id: row.chunk_id, content: row.content }))
    }

    async fn upsert(&self, entry: &KnowledgeEntry) -> Result<()> {
        let row = UpsertRow {
            chunk_id: &entry.chunk_id,
            category: entry.category.as_deref(),
            content: &entry.content,
            embedding: &entry.embedding,
            embedding_norm: &entry.embedding_norm,
        };
        let request = self
            .client
            .post(self.table_url())
            .query(&[("on_conflict", "chunk_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&row);
        self.send(request).await?;
        debug!(backend = BACKEND, chunk_id = %entry.chunk_id, "upserted entry");
        Ok(())
    }

    async fn raw_embeddings(&self) -> Result<Vec<(String, Vec<f32>)>> {
        let request = self.client.get(self.table_url()).query(&[("select", "chunk_id,embedding")]);
        let rows: Vec<EmbeddingRow> = self.send_json(request).await?;

        let mut embeddings = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(column) = row.embedding {
                embeddings.push((row.chunk_id, column.into_vec()?));
            }
        }
        Ok(embeddings)
    }

    async fn update_normalized(&self, chunk_id: &str, embedding_norm: &[f32]) -> Result<()> {
        let request = self
            .client
            .patch(self.table_url())
            .query(&[("chunk_id", format!("eq.{chunk_id}"))])
            .header("Prefer", "return=minimal")
            .json(&json!({ "embedding_norm": embedding_norm }));
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_credentials() {
        assert!(SupabaseVectorStore::new("", "key").is_err());
        assert!(SupabaseVectorStore::new("https://x.supabase.co", " ").is_err());
        let store = SupabaseVectorStore::new("https://x.supabase.co/", "key").unwrap();
        assert_eq!(store.table_url(), "https://x.supabase.co/rest/v1/knowledge_base");
    }

    #[test]
    fn match_rows_prefer_chunk_id() {
        let rows: Vec<MatchRow> = serde_json::from_str(
            r#"[{"id": 7, "chunk_id": "parking_01", "category": "facilities", "content": "Free parking.", "distance": 0.3},
                {"id": 8, "content": "Pool open 8-8.", "distance": 0.42}]"#,
        )
        .unwrap();
        let candidates: Vec<Candidate> = rows.into_iter().map(MatchRow::into_candidate).collect();
        assert_eq!(candidates[0].id, "parking_01");
        assert_eq!(candidates[0].category.as_deref(), Some("facilities"));
        assert_eq!(candidates[1].id, "8");
        assert!((candidates[1].distance - 0.42).abs() < 1e-6);
    }

    #[test]
    fn vector_columns_parse_in_both_forms() {
        let rows: Vec<EmbeddingRow> = serde_json::from_str(
            r#"[{"chunk_id": "a", "embedding": [0.5, 0.5]},
                {"chunk_id": "b", "embedding": "[1,0]"},
                {"chunk_id": "c", "embedding": null}]"#,
        )
        .unwrap();
        let mut parsed = Vec::new();
        for row in rows {
            parsed.push((row.chunk_id, row.embedding.map(|c| c.into_vec().unwrap())));
        }
        assert_eq!(parsed[0].1, Some(vec![0.5, 0.5]));
        assert_eq!(parsed[1].1, Some(vec![1.0, 0.0]));
        assert_eq!(parsed[2].1, None);
    }
}
