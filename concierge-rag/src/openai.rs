//! OpenAI embedding and chat completion collaborators.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::completion::{ChatMessage, CompletionModel};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The default model for OpenAI embeddings.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// The default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// The default dimensionality for `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

fn require_key(api_key: String, provider: &str) -> Result<String> {
    if api_key.trim().is_empty() {
        return Err(RagError::ConfigError(format!("{provider}: API key must not be empty")));
    }
    Ok(api_key)
}

/// Pull a readable message out of an OpenAI error body.
async fn error_detail(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Embeddings ─────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the OpenAI embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use concierge_rag::openai::OpenAIEmbeddingProvider;
///
/// let provider = OpenAIEmbeddingProvider::new("sk-...")?;
/// let embedding = provider.embed("Is there a swimming pool?").await?;
/// ```
#[derive(Clone)]
pub struct OpenAIEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl OpenAIEmbeddingProvider {
    /// Create a new provider with the given API key and default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: require_key(api_key.into(), "OpenAI embeddings")?,
            base_url: OPENAI_API_BASE.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Use another embedding model. `text-embedding-3-large` reports 3072 dimensions.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.dimensions = if self.model == "text-embedding-3-large" { 3072 } else { DEFAULT_DIMENSIONS };
        self
    }

    /// Point the provider at an OpenAI-compatible API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn failure(message: String) -> RagError {
        RagError::EmbeddingError { provider: "OpenAI".into(), message }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "OpenAI", text_len = text.len(), "embedding single text");

        let results = self.embed_batch(&[text]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| Self::failure("API returned empty response".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "OpenAI", batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body = EmbeddingRequest { model: &self.model, input: texts.to_vec() };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "embedding request failed");
                Self::failure(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            error!(provider = "OpenAI", %status, "embeddings API error");
            return Err(Self::failure(format!("API returned {status}: {detail}")));
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to parse embeddings response");
            Self::failure(format!("failed to parse response: {e}"))
        })?;

        Ok(embedding_response.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat completions ───────────────────────────────────────────────

/// A [`CompletionModel`] backed by the OpenAI chat completions API.
#[derive(Clone)]
pub struct OpenAIChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIChatModel {
    /// Create a new chat model client with the default model (`gpt-4o-mini`).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: require_key(api_key.into(), "OpenAI chat")?,
            base_url: OPENAI_API_BASE.into(),
            model: DEFAULT_CHAT_MODEL.into(),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the client at an OpenAI-compatible API.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn failure(message: String) -> RagError {
        RagError::CompletionError { provider: "OpenAI".into(), message }
    }
}

#[async_trait]
impl CompletionModel for OpenAIChatModel {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        debug!(provider = "OpenAI", model = %self.model, message_count = messages.len(), temperature, "chat completion");

        let request_body = ChatCompletionRequest { model: &self.model, messages, temperature };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "chat request failed");
                Self::failure(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            error!(provider = "OpenAI", %status, "chat API error");
            return Err(Self::failure(format!("API returned {status}: {detail}")));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to parse chat response");
            Self::failure(format!("failed to parse response: {e}"))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| Self::failure("API returned no message content".into()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}
