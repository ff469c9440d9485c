//! Process configuration read from the environment.

use std::time::Duration;

use crate::config::{ConciergeConfig, DEFAULT_RESORT_NAME, FallbackStrategy};
use crate::error::{RagError, Result};

/// Variables that must be present and non-empty at startup.
pub const REQUIRED_ENV: [&str; 3] = ["OPENAI_API_KEY", "SUPABASE_URL", "SUPABASE_SERVICE_ROLE_KEY"];

/// Everything a binary needs to wire up the concierge.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub host: String,
    pub port: u16,
    /// Name reported by the health check, when overridden.
    pub service_name: Option<String>,
    pub concierge: ConciergeConfig,
}

impl Settings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] naming the first required variable that
    /// is missing or empty, or any optional variable that fails to parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        for key in REQUIRED_ENV {
            if get(key).is_none() {
                return Err(RagError::ConfigError(format!("Missing required env var: {key}")));
            }
        }
        let required = |key: &str| get(key).unwrap_or_default();

        let resort_name = get("CONCIERGE_RESORT_NAME").unwrap_or_else(|| DEFAULT_RESORT_NAME.to_string());

        let mut builder = ConciergeConfig::builder().resort_name(&resort_name);
        if let Some(threshold) = parse_opt::<f32>(&get, "CONCIERGE_DISTANCE_THRESHOLD")? {
            builder = builder.distance_threshold(threshold);
        }
        if let Some(k) = parse_opt::<usize>(&get, "CONCIERGE_MAX_CHUNKS")? {
            builder = builder.max_candidates(k);
        }
        if let Some(threshold) = parse_opt::<f32>(&get, "CONCIERGE_MATCH_THRESHOLD")? {
            builder = builder.match_threshold(Some(threshold));
        }
        if let Some(margin) = parse_opt::<f32>(&get, "CONCIERGE_MIN_MARGIN")? {
            builder = builder.min_margin(Some(margin));
        }
        if let Some(secs) = parse_opt::<u64>(&get, "CONCIERGE_CALL_TIMEOUT_SECS")? {
            builder = builder.call_timeout(Duration::from_secs(secs));
        }
        if let Some(strategy) = get("CONCIERGE_FALLBACK") {
            builder = builder.fallback_strategy(parse_fallback(&strategy)?);
        }

        Ok(Self {
            openai_api_key: required("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            chat_model: get("OPENAI_CHAT_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            embedding_model: get("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            supabase_url: required("SUPABASE_URL"),
            supabase_service_key: required("SUPABASE_SERVICE_ROLE_KEY"),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_opt::<u16>(&get, "PORT")?.unwrap_or(3000),
            service_name: get("CONCIERGE_SERVICE_NAME"),
            concierge: builder.build()?,
        })
    }
}

fn parse_opt<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| RagError::ConfigError(format!("{key} has an invalid value: '{raw}'"))),
    }
}

fn parse_fallback(raw: &str) -> Result<FallbackStrategy> {
    match raw.to_ascii_lowercase().as_str() {
        "generated" => Ok(FallbackStrategy::Generated),
        "fixed" => Ok(FallbackStrategy::Fixed),
        other => Err(RagError::ConfigError(format!(
            "CONCIERGE_FALLBACK must be 'generated' or 'fixed', got '{other}'"
        ))),
    }
}

/// Long-lived collaborator handles, built once at startup.
#[cfg(all(feature = "openai", feature = "supabase"))]
pub struct Collaborators {
    pub embedder: std::sync::Arc<crate::openai::OpenAIEmbeddingProvider>,
    pub chat: std::sync::Arc<crate::openai::OpenAIChatModel>,
    pub store: std::sync::Arc<crate::supabase::SupabaseVectorStore>,
}

#[cfg(all(feature = "openai", feature = "supabase"))]
impl Settings {
    /// Construct the OpenAI and Supabase clients.
    pub fn connect(&self) -> Result<Collaborators> {
        use std::sync::Arc;

        use crate::openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
        use crate::supabase::SupabaseVectorStore;

        let mut embedder =
            OpenAIEmbeddingProvider::new(&self.openai_api_key)?.with_model(&self.embedding_model);
        let mut chat = OpenAIChatModel::new(&self.openai_api_key)?.with_model(&self.chat_model);
        if let Some(base_url) = &self.openai_base_url {
            embedder = embedder.with_base_url(base_url);
            chat = chat.with_base_url(base_url);
        }
        let store = SupabaseVectorStore::new(&self.supabase_url, &self.supabase_service_key)?;

        Ok(Collaborators { embedder: Arc::new(embedder), chat: Arc::new(chat), store: Arc::new(store) })
    }

    /// Build a fully wired [`ConciergeAgent`](crate::ConciergeAgent).
    pub fn build_agent(&self) -> Result<crate::ConciergeAgent> {
        let collaborators = self.connect()?;
        crate::ConciergeAgent::builder()
            .config(self.concierge.clone())
            .embedding_provider(collaborators.embedder)
            .vector_store(collaborators.store)
            .completion_model(collaborators.chat)
            .build()
    }
}
