//! LLM-as-judge evaluator.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use diary_core::EvaluationSettings;

use super::{EvaluationOutcome, EvaluationRequest, Evaluator, EVALUATION_DISABLED};
use crate::client::{ChatMessage, ChatModel};
use crate::config::ModelConfig;
use crate::error::Result;

const HALLUCINATION_RAILS: [&str; 2] = ["factual", "hallucinated"];
const RELEVANCE_RAILS: [&str; 2] = ["relevant", "unrelated"];

const JUDGE_SYSTEM_PROMPT: &str =
    "You are a strict evaluator. Answer with exactly one lowercase word from the allowed labels.";

/// Evaluator that asks a chat model to classify an answer.
pub struct LlmJudgeEvaluator {
    model: Arc<dyn ChatModel>,
    config: ModelConfig,
    settings: EvaluationSettings,
}

impl LlmJudgeEvaluator {
    /// Create an evaluator using `settings.evaluator_model` as the judge.
    pub fn new(model: Arc<dyn ChatModel>, settings: EvaluationSettings) -> Self {
        let config = ModelConfig::new(&settings.evaluator_model)
            .with_temperature(0.0)
            .with_max_tokens(16);
        Self {
            model,
            config,
            settings,
        }
    }

    async fn classify(&self, prompt: String, rails: &[&'static str]) -> Result<Option<&'static str>> {
        let response = self
            .model
            .chat(
                &self.config,
                vec![ChatMessage::system(JUDGE_SYSTEM_PROMPT), ChatMessage::user(prompt)],
                None,
            )
            .await?;
        Ok(parse_label(&response.content(), rails))
    }
}

#[async_trait]
impl Evaluator for LlmJudgeEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationOutcome> {
        if !self.settings.enabled {
            return Ok(EvaluationOutcome::skipped(EVALUATION_DISABLED));
        }

        let mut outcome = EvaluationOutcome::empty();

        let reference = request
            .reference
            .as_deref()
            .filter(|r| !r.trim().is_empty());
        if let (true, Some(reference)) = (self.settings.hallucination_check, reference) {
            let prompt = format!(
                "Decide whether the answer is supported by the reference text.\n\
                 [Question]: {}\n[Reference]: {}\n[Answer]: {}\n\
                 Labels: factual, hallucinated",
                request.input, reference, request.output
            );
            let label = self.classify(prompt, &HALLUCINATION_RAILS).await?;
            outcome.hallucination_score = label.map(|l| score(l, "factual"));
            outcome.hallucination_label = label.map(String::from);
        }

        if self.settings.relevance_check {
            let prompt = format!(
                "Decide whether the answer addresses the question.\n\
                 [Question]: {}\n[Answer]: {}\n\
                 Labels: relevant, unrelated",
                request.input, request.output
            );
            let label = self.classify(prompt, &RELEVANCE_RAILS).await?;
            outcome.relevance_score = label.map(|l| score(l, "relevant"));
            outcome.relevance_label = label.map(String::from);
        }

        if outcome.relevance_label.is_none() && self.settings.relevance_check {
            warn!("Judge returned no recognizable relevance label");
            outcome.error = Some("unrecognized judge label".to_string());
        }

        info!(
            hallucination = ?outcome.hallucination_score,
            relevance = ?outcome.relevance_score,
            "Evaluation complete"
        );

        Ok(outcome)
    }
}

fn score(label: &str, good: &str) -> f64 {
    if label == good {
        1.0
    } else {
        0.0
    }
}

/// Find the first word of `text` that is one of `rails`, ignoring case and
/// punctuation.
pub fn parse_label(text: &str, rails: &[&'static str]) -> Option<&'static str> {
    text.split(|c: char| !c.is_ascii_alphabetic())
        .filter(|word| !word.is_empty())
        .find_map(|word| {
            let word = word.to_ascii_lowercase();
            rails.iter().copied().find(|rail| *rail == word)
        })
}
