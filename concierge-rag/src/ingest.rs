//! Loading the curated knowledge sheet into the vector store.
//!
//! Each CSV row (`chunk_id`, `category`, `content`) is already one chunk; no
//! splitting happens here. Rows whose content is unchanged are not re-embedded.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::document::KnowledgeEntry;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result, with_deadline};
use crate::normalize::normalize;
use crate::vectorstore::VectorStore;

/// One row of the knowledge sheet after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeRow {
    #[serde(default)]
    pub chunk_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// What happened to a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Created,
    Updated,
    Unchanged,
    /// `chunk_id` or `content` was missing or blank.
    Skipped,
    /// The store rejected the write; ingestion carried on.
    Failed(String),
}

/// Per-outcome counts for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl IngestReport {
    fn record(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Created => self.created += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Unchanged => self.unchanged += 1,
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Counts for one normalization backfill run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub normalized: usize,
    /// Entries whose raw embedding was all zeros.
    pub degenerate: usize,
}

/// Parse the knowledge sheet. Extra columns are ignored.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<KnowledgeRow>> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).flexible(true).from_reader(reader);
    csv.deserialize::<KnowledgeRow>()
        .map(|row| row.map_err(|e| RagError::IngestError(format!("malformed CSV: {e}"))))
        .collect()
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Embeds knowledge rows and writes them to a [`VectorStore`].
pub struct KnowledgeIngestor {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    call_timeout: Duration,
}

impl KnowledgeIngestor {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        call_timeout: Duration,
    ) -> Self {
        Self { embedder, store, call_timeout }
    }

    /// Parse and ingest a CSV document.
    pub async fn ingest_csv<R: Read>(&self, reader: R) -> Result<IngestReport> {
        let rows = parse_csv(reader)?;
        self.ingest_rows(&rows).await
    }

    /// Ingest rows in order.
    ///
    /// # Errors
    ///
    /// Aborts with the embedding or store error when a row cannot be embedded
    /// or looked up; rows already written stay written.
    pub async fn ingest_rows(&self, rows: &[KnowledgeRow]) -> Result<IngestReport> {
        let mut report = IngestReport::default();
        for row in rows {
            let outcome = self.ingest_row(row).await?;
            report.record(&outcome);
        }
        info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            failed = report.failed,
            "ingestion complete"
        );
        Ok(report)
    }

    /// Ingest a single row.
    pub async fn ingest_row(&self, row: &KnowledgeRow) -> Result<RowOutcome> {
        let (Some(chunk_id), Some(content)) = (non_blank(&row.chunk_id), non_blank(&row.content))
        else {
            return Ok(RowOutcome::Skipped);
        };

        let existing = self.store.find(chunk_id).await?;
        let outcome = match existing {
            Some(stored) if stored.content == content => {
                info!(chunk_id, "skipping; content unchanged");
                return Ok(RowOutcome::Unchanged);
            }
            Some(_) => {
                info!(chunk_id, "updating; content changed");
                RowOutcome::Updated
            }
            None => {
                info!(chunk_id, "creating");
                RowOutcome::Created
            }
        };

        let embedding = with_deadline(self.call_timeout, self.embedder.embed(content), |message| {
            RagError::EmbeddingError { provider: "embedder".to_string(), message }
        })
        .await?;
        let embedding_norm = normalize(&embedding)?;

        let entry = KnowledgeEntry {
            chunk_id: chunk_id.to_string(),
            category: non_blank(&row.category).map(str::to_string),
            content: content.to_string(),
            embedding,
            embedding_norm,
        };

        match self.store.upsert(&entry).await {
            Ok(()) => Ok(outcome),
            Err(e) => {
                error!(chunk_id, error = %e, "failed to save entry");
                Ok(RowOutcome::Failed(e.to_string()))
            }
        }
    }

    /// Recompute `embedding_norm` for every stored entry that has a raw embedding.
    pub async fn backfill_normalized(&self) -> Result<BackfillReport> {
        let mut report = BackfillReport::default();
        for (chunk_id, raw) in self.store.raw_embeddings().await? {
            match normalize(&raw) {
                Ok(unit) => {
                    self.store.update_normalized(&chunk_id, &unit).await?;
                    info!(chunk_id = %chunk_id, "normalized");
                    report.normalized += 1;
                }
                Err(e) => {
                    warn!(chunk_id = %chunk_id, error = %e, "skipping degenerate embedding");
                    report.degenerate += 1;
                }
            }
        }
        info!(normalized = report.normalized, degenerate = report.degenerate, "backfill complete");
        Ok(report)
    }
}
