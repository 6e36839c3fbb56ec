//! Advisory answer evaluation.
//!
//! Evaluators score an answer for relevance to the question and, when
//! supporting text is available, for hallucination against it. Outcomes are
//! logged only; they never change what is returned to a caller.

mod judge;

pub use judge::{parse_label, LlmJudgeEvaluator};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Reason recorded when evaluation is switched off.
pub const EVALUATION_DISABLED: &str = "evaluation disabled";

/// What to evaluate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    /// The user's question.
    pub input: String,
    /// The answer produced.
    pub output: String,
    /// Supporting text the answer should be grounded in.
    pub reference: Option<String>,
}

/// Scores for one answer. Scores are 1.0 for the good label, 0.0 otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    /// 1.0 when the answer is grounded in the reference.
    pub hallucination_score: Option<f64>,
    /// Raw hallucination label.
    pub hallucination_label: Option<String>,
    /// 1.0 when the answer addresses the question.
    pub relevance_score: Option<f64>,
    /// Raw relevance label.
    pub relevance_label: Option<String>,
    /// When the evaluation ran.
    pub evaluated_at: DateTime<Utc>,
    /// Why evaluation was skipped or incomplete.
    pub error: Option<String>,
}

impl EvaluationOutcome {
    /// An outcome with no scores yet.
    pub fn empty() -> Self {
        Self {
            hallucination_score: None,
            hallucination_label: None,
            relevance_score: None,
            relevance_label: None,
            evaluated_at: Utc::now(),
            error: None,
        }
    }

    /// An outcome recording that evaluation was skipped.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::empty()
        }
    }
}

/// Scores answers.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Evaluate one answer.
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<EvaluationOutcome>;
}

/// Evaluator used when evaluation is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEvaluator;

#[async_trait]
impl Evaluator for DisabledEvaluator {
    async fn evaluate(&self, _request: &EvaluationRequest) -> Result<EvaluationOutcome> {
        Ok(EvaluationOutcome::skipped(EVALUATION_DISABLED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_evaluator() {
        let outcome = DisabledEvaluator
            .evaluate(&EvaluationRequest {
                input: "q".into(),
                output: "a".into(),
                reference: None,
            })
            .await
            .unwrap();

        assert_eq!(outcome.error.as_deref(), Some(EVALUATION_DISABLED));
        assert!(outcome.relevance_score.is_none());
        assert!(outcome.hallucination_score.is_none());
    }
}
