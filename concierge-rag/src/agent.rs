//! Intent routing and the retrieval-gated answer pipeline.
//!
//! The [`ConciergeAgent`] classifies each question, answers greetings,
//! clarifications, and out-of-scope messages with canned text, and sends
//! factual questions through retrieve → gate → assemble → synthesize.
//!
//! # Example
//!
//! ```rust,ignore
//! use concierge_rag::{ConciergeAgent, ConciergeConfig};
//!
//! let agent = ConciergeAgent::builder()
//!     .config(ConciergeConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(store))
//!     .completion_model(Arc::new(chat))
//!     .build()?;
//!
//! let result = agent.ask("Is parking available at the property?").await?;
//! ```

use std::sync::Arc;

use tracing::{info, warn};

use crate::completion::CompletionModel;
use crate::config::{CannedResponses, ConciergeConfig};
use crate::context::assemble;
use crate::document::AgentResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::gate::ConfidenceGate;
use crate::intent::{Intent, IntentClassifier, IntentResult, LlmIntentClassifier};
use crate::retriever::KnowledgeRetriever;
use crate::synthesizer::AnswerSynthesizer;
use crate::vectorstore::VectorStore;

/// Routes questions by intent and answers factual ones from the knowledge base.
///
/// The agent holds no per-request state; one instance serves concurrent
/// requests. Construct one via [`ConciergeAgent::builder()`].
pub struct ConciergeAgent {
    config: ConciergeConfig,
    classifier: Arc<dyn IntentClassifier>,
    retriever: KnowledgeRetriever,
    gate: ConfidenceGate,
    synthesizer: AnswerSynthesizer,
}

impl ConciergeAgent {
    /// Create a new [`ConciergeAgentBuilder`].
    pub fn builder() -> ConciergeAgentBuilder {
        ConciergeAgentBuilder::default()
    }

    /// Return a reference to the agent configuration.
    pub fn config(&self) -> &ConciergeConfig {
        &self.config
    }

    fn responses(&self) -> &CannedResponses {
        &self.config.responses
    }

    /// Classify `message`, falling back to `FACTUAL_QUESTION` on unparseable
    /// classifier output.
    ///
    /// # Errors
    ///
    /// Classifier transport failures propagate as [`RagError::CompletionError`].
    pub async fn classify(&self, message: &str) -> Result<IntentResult> {
        match self.classifier.classify(message).await {
            Ok(result) => Ok(result),
            Err(RagError::ClassifierParseError(reason)) => {
                warn!(reason = %reason, "unparseable classifier output; defaulting to FACTUAL_QUESTION");
                Ok(IntentResult::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Handle one question end to end.
    ///
    /// # Errors
    ///
    /// Returns an error only for failures with no safe default: embedding,
    /// completion, or a degenerate query embedding. Search failures and
    /// unparseable classifier output are absorbed.
    pub async fn ask(&self, question: &str) -> Result<AgentResult> {
        let classified = self.classify(question).await?;
        let intent = classified.intent;

        let result = match intent {
            Intent::Greeting => AgentResult {
                answer: self.responses().greeting.clone(),
                confidence: None,
                used_fallback: false,
                intent,
            },
            Intent::Clarify => AgentResult {
                answer: classified
                    .clarifying_question
                    .unwrap_or_else(|| self.responses().clarify.clone()),
                confidence: None,
                used_fallback: false,
                intent,
            },
            Intent::OutOfScope => AgentResult {
                answer: self.responses().out_of_scope.clone(),
                confidence: None,
                used_fallback: true,
                intent,
            },
            Intent::FactualQuestion => self.answer_factual(question).await?,
        };

        info!(
            intent = %result.intent,
            confidence = ?result.confidence,
            used_fallback = result.used_fallback,
            "question handled"
        );
        Ok(result)
    }

    /// Run the retrieval pipeline: retrieve → gate → assemble → synthesize.
    ///
    /// The gate decision is always made before any synthesis call.
    pub async fn answer_factual(&self, question: &str) -> Result<AgentResult> {
        let candidates = self.retriever.retrieve(question, self.config.max_candidates).await?;
        let decision = self.gate.evaluate(&candidates);

        info!(
            candidate_count = candidates.len(),
            top_distance = ?decision.top_distance,
            accept = decision.accept,
            threshold = self.gate.threshold(),
            "confidence gate evaluated"
        );

        let (answer, used_fallback) = if decision.accept {
            let context = assemble(&candidates);
            (self.synthesizer.synthesize_grounded(question, &context).await?, false)
        } else {
            (self.synthesizer.synthesize_fallback(question).await?, true)
        };

        Ok(AgentResult {
            answer,
            confidence: decision.top_distance,
            used_fallback,
            intent: Intent::FactualQuestion,
        })
    }
}

/// Builder for constructing a [`ConciergeAgent`].
///
/// The embedding provider, vector store, and completion model are required.
/// The classifier defaults to an [`LlmIntentClassifier`] over the completion
/// model using the configured classifier prompt.
#[derive(Default)]
pub struct ConciergeAgentBuilder {
    config: Option<ConciergeConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    completion_model: Option<Arc<dyn CompletionModel>>,
    classifier: Option<Arc<dyn IntentClassifier>>,
}

impl ConciergeAgentBuilder {
    /// Set the agent configuration. Defaults to [`ConciergeConfig::default()`].
    pub fn config(mut self, config: ConciergeConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    pub fn completion_model(mut self, model: Arc<dyn CompletionModel>) -> Self {
        self.completion_model = Some(model);
        self
    }

    /// Replace the default LLM-backed classifier.
    pub fn classifier(mut self, classifier: Arc<dyn IntentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Build the [`ConciergeAgent`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required collaborator is missing.
    pub fn build(self) -> Result<ConciergeAgent> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let completion_model = self
            .completion_model
            .ok_or_else(|| RagError::ConfigError("completion_model is required".to_string()))?;

        let classifier = self.classifier.unwrap_or_else(|| {
            Arc::new(
                LlmIntentClassifier::new(
                    completion_model.clone(),
                    config.prompts.classifier_system.clone(),
                    config.call_timeout(),
                )
                .with_temperature(config.classifier_temperature),
            )
        });

        let retriever =
            KnowledgeRetriever::new(embedding_provider, vector_store, config.call_timeout())
                .with_match_threshold(config.match_threshold);
        let gate = ConfidenceGate::new(config.distance_threshold).with_min_margin(config.min_margin);
        let synthesizer = AnswerSynthesizer::new(completion_model, &config);

        Ok(ConciergeAgent { config, classifier, retriever, gate, synthesizer })
    }
}
