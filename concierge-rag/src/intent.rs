//! Intent labels and the LLM-backed classifier adapter.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::completion::{ChatMessage, CompletionModel};
use crate::error::{RagError, Result, with_deadline};

/// What an incoming message is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Greeting,
    Clarify,
    FactualQuestion,
    OutOfScope,
}

impl Intent {
    pub const ALL: [Intent; 4] =
        [Intent::Greeting, Intent::Clarify, Intent::FactualQuestion, Intent::OutOfScope];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "GREETING",
            Intent::Clarify => "CLARIFY",
            Intent::FactualQuestion => "FACTUAL_QUESTION",
            Intent::OutOfScope => "OUT_OF_SCOPE",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = RagError;

    fn from_str(label: &str) -> Result<Self> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == label.trim())
            .ok_or_else(|| RagError::ClassifierParseError(format!("unknown intent label '{label}'")))
    }
}

/// A classified message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    /// Follow-up question suggested by the classifier for `CLARIFY`.
    pub clarifying_question: Option<String>,
}

impl IntentResult {
    pub fn new(intent: Intent) -> Self {
        Self { intent, clarifying_question: None }
    }
}

impl Default for IntentResult {
    /// Fail open toward the full retrieval path.
    fn default() -> Self {
        Self::new(Intent::FactualQuestion)
    }
}

/// Classifies a message into one of the four [`Intent`]s.
///
/// Implementations report malformed model output as
/// [`RagError::ClassifierParseError`]; the router decides what to do with it.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, message: &str) -> Result<IntentResult>;
}

#[derive(Deserialize)]
struct RawIntent {
    intent: String,
    #[serde(default, alias = "clarifyingQuestion")]
    clarifying_question: Option<String>,
}

/// Remove a surrounding markdown code fence (```json ... ```), if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").or_else(|| rest.strip_prefix("JSON")).unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the classifier model's raw reply.
///
/// # Errors
///
/// Returns [`RagError::ClassifierParseError`] when the reply is not a JSON
/// object with an `intent` field naming one of the four labels.
pub fn parse_intent_response(raw: &str) -> Result<IntentResult> {
    let body = strip_code_fence(raw);
    let parsed: RawIntent = serde_json::from_str(body)
        .map_err(|e| RagError::ClassifierParseError(format!("invalid JSON: {e}")))?;
    let intent = parsed.intent.parse::<Intent>()?;
    let clarifying_question = parsed
        .clarifying_question
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty());
    Ok(IntentResult { intent, clarifying_question })
}

/// An [`IntentClassifier`] that asks a completion model for structured JSON.
pub struct LlmIntentClassifier {
    model: Arc<dyn CompletionModel>,
    system_prompt: String,
    temperature: f32,
    call_timeout: Duration,
}

impl LlmIntentClassifier {
    pub fn new(
        model: Arc<dyn CompletionModel>,
        system_prompt: impl Into<String>,
        call_timeout: Duration,
    ) -> Self {
        Self { model, system_prompt: system_prompt.into(), temperature: 0.0, call_timeout }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify(&self, message: &str) -> Result<IntentResult> {
        let messages = [ChatMessage::system(&self.system_prompt), ChatMessage::user(message)];
        let provider = self.model.name().to_string();
        let raw = with_deadline(
            self.call_timeout,
            self.model.complete(&messages, self.temperature),
            |message| RagError::CompletionError { provider, message },
        )
        .await?;

        debug!(raw_len = raw.len(), "classifier replied");
        parse_intent_response(&raw).map_err(|e| match e {
            RagError::ClassifierParseError(reason) => {
                RagError::ClassifierParseError(format!("{reason}; raw reply: {raw}"))
            }
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let result =
            parse_intent_response(r#"{"intent": "GREETING", "clarifying_question": null}"#).unwrap();
        assert_eq!(result, IntentResult::new(Intent::Greeting));
    }

    #[test]
    fn strips_markdown_fences() {
        let raw = "```json\n{\"intent\": \"CLARIFY\", \"clarifying_question\": \"Which amenities?\"}\n```";
        let result = parse_intent_response(raw).unwrap();
        assert_eq!(result.intent, Intent::Clarify);
        assert_eq!(result.clarifying_question.as_deref(), Some("Which amenities?"));

        let bare = "```\n{\"intent\": \"OUT_OF_SCOPE\"}\n```";
        assert_eq!(parse_intent_response(bare).unwrap().intent, Intent::OutOfScope);
    }

    #[test]
    fn accepts_camel_case_question_and_drops_blank() {
        let raw = r#"{"intent": "CLARIFY", "clarifyingQuestion": "   "}"#;
        assert_eq!(parse_intent_response(raw).unwrap().clarifying_question, None);
    }

    #[test]
    fn rejects_garbage_and_unknown_labels() {
        assert!(matches!(
            parse_intent_response("I think this is a greeting!"),
            Err(RagError::ClassifierParseError(_))
        ));
        assert!(matches!(
            parse_intent_response(r#"{"intent": "BOOKING"}"#),
            Err(RagError::ClassifierParseError(_))
        ));
        assert!(parse_intent_response(r#"{"label": "GREETING"}"#).is_err());
    }

    #[test]
    fn intent_serializes_as_label() {
        assert_eq!(serde_json::to_string(&Intent::FactualQuestion).unwrap(), "\"FACTUAL_QUESTION\"");
        assert_eq!("OUT_OF_SCOPE".parse::<Intent>().unwrap(), Intent::OutOfScope);
        assert_eq!(IntentResult::default().intent, Intent::FactualQuestion);
    }
}
