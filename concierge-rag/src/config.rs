//! Configuration for the concierge pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// The resort the default prompts and canned responses speak for.
pub const DEFAULT_RESORT_NAME: &str = "Bhils Kabeela Resort";

/// How the pipeline answers when the knowledge base cannot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FallbackStrategy {
    /// Ask the completion model for a graceful, fact-free deflection.
    #[default]
    Generated,
    /// Return [`CannedResponses::fallback`] without calling any model.
    Fixed,
}

/// System prompts handed to the completion model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptConfig {
    /// Persona for answers built from retrieved context.
    pub grounded_system: String,
    /// Persona for deflecting questions the knowledge base cannot answer.
    pub fallback_system: String,
    /// Instructions for the intent classifier.
    pub classifier_system: String,
}

impl PromptConfig {
    pub fn for_resort(resort: &str) -> Self {
        Self {
            grounded_system: format!(
                "You are a warm, knowledgeable, and welcoming concierge for {resort}. \
                 Your goal is to assist potential and current guests with a friendly, inviting tone. \
                 Answer their questions naturally and conversationally using ONLY the provided context. \
                 If the context contains the answer, rephrase it faithfully but comfortably; avoid stiff or robotic copying. \
                 If the answer is NOT in the context, politely say you don't have that info on hand \
                 and suggest contacting the resort directly."
            ),
            fallback_system: format!(
                "You are a warm, knowledgeable concierge for {resort}. \
                 The user asked a question that is NOT in your knowledge base. \
                 Politely and naturally apologize that you don't have specific details on that particular topic right now. \
                 Suggest they contact the front desk for more information. \
                 Do not make up any facts."
            ),
            classifier_system: format!(
                "You are a hotel front desk intent classifier for {resort}.\n\n\
                 Classify the user's message into exactly ONE:\n\
                 - GREETING\n\
                 - CLARIFY\n\
                 - FACTUAL_QUESTION\n\
                 - OUT_OF_SCOPE\n\n\
                 Rules:\n\
                 - Do NOT answer the user\n\
                 - Do NOT add facts\n\
                 - Return ONLY valid JSON without markdown code blocks\n\n\
                 Output format:\n\
                 {{\n  \"intent\": \"GREETING|CLARIFY|FACTUAL_QUESTION|OUT_OF_SCOPE\",\n  \"clarifying_question\": null\n}}"
            ),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self::for_resort(DEFAULT_RESORT_NAME)
    }
}

/// Fixed replies that never touch a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CannedResponses {
    pub greeting: String,
    /// Used for `CLARIFY` when the classifier supplied no question of its own.
    pub clarify: String,
    pub out_of_scope: String,
    /// Used by [`FallbackStrategy::Fixed`].
    pub fallback: String,
}

impl CannedResponses {
    pub fn for_resort(resort: &str) -> Self {
        Self {
            greeting: format!(
                "Hello and welcome to {resort}! I'm happy to help with rooms, dining, amenities, \
                 or anything else about your stay. What would you like to know?"
            ),
            clarify: "Could you share a little more detail about what you're looking for? \
                      That will help me find the right information for you."
                .to_string(),
            out_of_scope: "That's outside what I can help with here. Please contact our front \
                           desk and the team will be glad to assist you."
                .to_string(),
            fallback: "I'm not seeing clear information about this right now. Let me check with \
                       the team and get back to you."
                .to_string(),
        }
    }
}

impl Default for CannedResponses {
    fn default() -> Self {
        Self::for_resort(DEFAULT_RESORT_NAME)
    }
}

/// Configuration parameters for retrieval, gating, and synthesis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConciergeConfig {
    /// Largest top-1 distance still trusted for a grounded answer.
    pub distance_threshold: f32,
    /// Maximum number of candidates requested from the store.
    pub max_candidates: usize,
    /// Advisory pre-filter forwarded to the store's search call.
    pub match_threshold: Option<f32>,
    /// When set, also require the top-2 distance to exceed top-1 by this much.
    pub min_margin: Option<f32>,
    pub grounded_temperature: f32,
    pub fallback_temperature: f32,
    pub classifier_temperature: f32,
    /// Bound on every remote call, in milliseconds.
    pub call_timeout_ms: u64,
    pub fallback_strategy: FallbackStrategy,
    pub prompts: PromptConfig,
    pub responses: CannedResponses,
}

impl Default for ConciergeConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 0.55,
            max_candidates: 5,
            match_threshold: Some(10.0),
            min_margin: None,
            grounded_temperature: 0.2,
            fallback_temperature: 0.3,
            classifier_temperature: 0.0,
            call_timeout_ms: 30_000,
            fallback_strategy: FallbackStrategy::Generated,
            prompts: PromptConfig::default(),
            responses: CannedResponses::default(),
        }
    }
}

impl ConciergeConfig {
    /// Create a new builder for constructing a [`ConciergeConfig`].
    pub fn builder() -> ConciergeConfigBuilder {
        ConciergeConfigBuilder::default()
    }

    /// Bound applied to each remote call.
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

/// Builder for constructing a validated [`ConciergeConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConciergeConfigBuilder {
    config: ConciergeConfig,
}

impl ConciergeConfigBuilder {
    pub fn distance_threshold(mut self, threshold: f32) -> Self {
        self.config.distance_threshold = threshold;
        self
    }

    pub fn max_candidates(mut self, k: usize) -> Self {
        self.config.max_candidates = k;
        self
    }

    pub fn match_threshold(mut self, threshold: Option<f32>) -> Self {
        self.config.match_threshold = threshold;
        self
    }

    pub fn min_margin(mut self, margin: Option<f32>) -> Self {
        self.config.min_margin = margin;
        self
    }

    pub fn grounded_temperature(mut self, temperature: f32) -> Self {
        self.config.grounded_temperature = temperature;
        self
    }

    pub fn fallback_temperature(mut self, temperature: f32) -> Self {
        self.config.fallback_temperature = temperature;
        self
    }

    pub fn classifier_temperature(mut self, temperature: f32) -> Self {
        self.config.classifier_temperature = temperature;
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn fallback_strategy(mut self, strategy: FallbackStrategy) -> Self {
        self.config.fallback_strategy = strategy;
        self
    }

    /// Rebuild prompts and canned responses for a different resort name.
    pub fn resort_name(mut self, resort: &str) -> Self {
        self.config.prompts = PromptConfig::for_resort(resort);
        self.config.responses = CannedResponses::for_resort(resort);
        self
    }

    pub fn prompts(mut self, prompts: PromptConfig) -> Self {
        self.config.prompts = prompts;
        self
    }

    pub fn responses(mut self, responses: CannedResponses) -> Self {
        self.config.responses = responses;
        self
    }

    /// Build the [`ConciergeConfig`], validating that parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `distance_threshold` is negative or not finite
    /// - `max_candidates == 0`
    /// - `min_margin` is negative or not finite
    /// - `call_timeout` is zero
    pub fn build(self) -> Result<ConciergeConfig> {
        let config = self.config;
        if !config.distance_threshold.is_finite() || config.distance_threshold < 0.0 {
            return Err(RagError::ConfigError(format!(
                "distance_threshold ({}) must be a finite, non-negative number",
                config.distance_threshold
            )));
        }
        if config.max_candidates == 0 {
            return Err(RagError::ConfigError(
                "max_candidates must be greater than zero".to_string(),
            ));
        }
        if let Some(margin) = config.min_margin {
            if !margin.is_finite() || margin < 0.0 {
                return Err(RagError::ConfigError(format!(
                    "min_margin ({margin}) must be a finite, non-negative number"
                )));
            }
        }
        if config.call_timeout_ms == 0 {
            return Err(RagError::ConfigError("call_timeout must be greater than zero".to_string()));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_tuning() {
        let config = ConciergeConfig::default();
        assert_eq!(config.distance_threshold, 0.55);
        assert_eq!(config.max_candidates, 5);
        assert_eq!(config.fallback_strategy, FallbackStrategy::Generated);
        assert_eq!(config.call_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn builder_rejects_zero_candidates() {
        let err = ConciergeConfig::builder().max_candidates(0).build().unwrap_err();
        assert!(err.to_string().contains("max_candidates"));
    }

    #[test]
    fn builder_rejects_bad_threshold() {
        assert!(ConciergeConfig::builder().distance_threshold(f32::NAN).build().is_err());
        assert!(ConciergeConfig::builder().distance_threshold(-0.1).build().is_err());
        assert!(ConciergeConfig::builder().min_margin(Some(-1.0)).build().is_err());
        assert!(ConciergeConfig::builder().call_timeout(Duration::ZERO).build().is_err());
    }

    #[test]
    fn resort_name_flows_into_prompts() {
        let config = ConciergeConfig::builder().resort_name("Lake Lodge").build().unwrap();
        assert!(config.prompts.grounded_system.contains("Lake Lodge"));
        assert!(config.prompts.classifier_system.contains("FACTUAL_QUESTION"));
        assert!(config.responses.greeting.contains("Lake Lodge"));
    }
}
