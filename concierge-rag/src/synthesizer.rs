//! Grounded and fallback answer generation.

use std::sync::Arc;
use std::time::Duration;

use crate::completion::{ChatMessage, CompletionModel};
use crate::config::{ConciergeConfig, FallbackStrategy};
use crate::context::grounded_user_message;
use crate::error::{RagError, Result, with_deadline};

/// Produces the final answer text through the completion model.
///
/// Both variants make a single call with a fixed persona and temperature.
/// Failures propagate unchanged; nothing is retried, logged, or cached here.
pub struct AnswerSynthesizer {
    model: Arc<dyn CompletionModel>,
    grounded_system: String,
    fallback_system: String,
    grounded_temperature: f32,
    fallback_temperature: f32,
    strategy: FallbackStrategy,
    fixed_fallback: String,
    call_timeout: Duration,
}

impl AnswerSynthesizer {
    pub fn new(model: Arc<dyn CompletionModel>, config: &ConciergeConfig) -> Self {
        Self {
            model,
            grounded_system: config.prompts.grounded_system.clone(),
            fallback_system: config.prompts.fallback_system.clone(),
            grounded_temperature: config.grounded_temperature,
            fallback_temperature: config.fallback_temperature,
            strategy: config.fallback_strategy,
            fixed_fallback: config.responses.fallback.clone(),
            call_timeout: config.call_timeout(),
        }
    }

    /// Answer `question` using only the assembled `context`.
    pub async fn synthesize_grounded(&self, question: &str, context: &str) -> Result<String> {
        let messages = [
            ChatMessage::system(&self.grounded_system),
            ChatMessage::user(grounded_user_message(context, question)),
        ];
        self.complete(&messages, self.grounded_temperature).await
    }

    /// Decline `question` gracefully without any retrieved context.
    pub async fn synthesize_fallback(&self, question: &str) -> Result<String> {
        match self.strategy {
            FallbackStrategy::Fixed => Ok(self.fixed_fallback.clone()),
            FallbackStrategy::Generated => {
                let messages =
                    [ChatMessage::system(&self.fallback_system), ChatMessage::user(question)];
                self.complete(&messages, self.fallback_temperature).await
            }
        }
    }

    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        let provider = self.model.name().to_string();
        with_deadline(self.call_timeout, self.model.complete(messages, temperature), |message| {
            RagError::CompletionError { provider, message }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Role;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingModel {
        calls: Mutex<Vec<(Vec<ChatMessage>, f32)>>,
    }

    #[async_trait]
    impl CompletionModel for RecordingModel {
        async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
            self.calls.lock().unwrap().push((messages.to_vec(), temperature));
            Ok("reply".to_string())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[tokio::test]
    async fn grounded_interpolates_context_into_user_turn() {
        let model = Arc::new(RecordingModel::default());
        let synth = AnswerSynthesizer::new(model.clone(), &ConciergeConfig::default());

        synth.synthesize_grounded("Is parking free?", "• Parking is free.").await.unwrap();

        let calls = model.calls.lock().unwrap();
        let (messages, temperature) = &calls[0];
        assert_eq!(*temperature, 0.2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("ONLY the provided context"));
        assert_eq!(messages[1].content, "Context:\n• Parking is free.\n\nQuestion:\nIs parking free?");
    }

    #[tokio::test]
    async fn generated_fallback_sends_bare_question() {
        let model = Arc::new(RecordingModel::default());
        let synth = AnswerSynthesizer::new(model.clone(), &ConciergeConfig::default());

        synth.synthesize_fallback("What is the weather in Paris?").await.unwrap();

        let calls = model.calls.lock().unwrap();
        let (messages, temperature) = &calls[0];
        assert_eq!(*temperature, 0.3);
        assert!(messages[0].content.contains("front desk"));
        assert_eq!(messages[1].content, "What is the weather in Paris?");
    }

    #[tokio::test]
    async fn fixed_fallback_skips_the_model() {
        let model = Arc::new(RecordingModel::default());
        let config =
            ConciergeConfig::builder().fallback_strategy(FallbackStrategy::Fixed).build().unwrap();
        let synth = AnswerSynthesizer::new(model.clone(), &config);

        let answer = synth.synthesize_fallback("Any news?").await.unwrap();

        assert_eq!(answer, config.responses.fallback);
        assert!(model.calls.lock().unwrap().is_empty());
    }
}
