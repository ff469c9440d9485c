//! # concierge-rag
//!
//! Retrieval-gated question answering for a single resort's guest concierge.
//!
//! A question is classified by intent. Greetings, clarifications, and
//! out-of-scope messages get canned replies; factual questions are embedded,
//! matched against the knowledge base, and answered from the retrieved
//! context only when the best match is close enough. Otherwise the concierge
//! falls back to a cautious, non-committal reply.
//!
//! ## Features
//!
//! - `openai` (default): OpenAI embedding and chat collaborators.
//! - `supabase` (default): Supabase/pgvector knowledge store.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use concierge_rag::{ConciergeAgent, InMemoryVectorStore};
//!
//! let agent = ConciergeAgent::builder()
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .completion_model(Arc::new(my_chat_model))
//!     .build()?;
//!
//! let result = agent.ask("What time does the pool open?").await?;
//! ```

pub mod agent;
pub mod completion;
pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gate;
pub mod inmemory;
pub mod ingest;
pub mod intent;
pub mod normalize;
pub mod retriever;
pub mod settings;
pub mod synthesizer;
pub mod vectorstore;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "supabase")]
pub mod supabase;

pub use agent::{ConciergeAgent, ConciergeAgentBuilder};
pub use completion::{ChatMessage, CompletionModel, Role};
pub use config::{
    CannedResponses, ConciergeConfig, ConciergeConfigBuilder, DEFAULT_RESORT_NAME,
    FallbackStrategy, PromptConfig,
};
pub use context::{BULLET, assemble, grounded_user_message};
pub use document::{AgentResult, Candidate, KnowledgeEntry};
pub use embedding::EmbeddingProvider;
pub use error::{FailureKind, RagError, Result, with_deadline};
pub use gate::{ConfidenceGate, GateDecision, gate};
pub use inmemory::InMemoryVectorStore;
pub use ingest::{BackfillReport, IngestReport, KnowledgeIngestor, KnowledgeRow, RowOutcome, parse_csv};
pub use intent::{
    Intent, IntentClassifier, IntentResult, LlmIntentClassifier, parse_intent_response,
};
pub use normalize::{l2_norm, normalize};
pub use retriever::KnowledgeRetriever;
pub use settings::Settings;
pub use synthesizer::AnswerSynthesizer;
pub use vectorstore::{StoredEntry, VectorStore};

#[cfg(feature = "openai")]
pub use openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
#[cfg(feature = "supabase")]
pub use supabase::SupabaseVectorStore;
