//! Request router deciding between storing diary data and answering.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use diary_agent::{
    extract_json_field, extract_reference, extract_response, extract_tool_results, AgentSession,
    ChatModel, DisabledEvaluator, EvaluationRequest, Evaluator, ModelConfig, QuestionAnswerer,
    Tool, ToolDefinition, ToolOutput, ToolSet,
};
use diary_core::RoutingStrategy;

use crate::classifier::{classify, matched_marker, RoutingVerdict};
use crate::error::Result;
use crate::parser::parse_structured_response;
use crate::result::{OrchestrationResult, ResultType};

/// Name of the question tool offered to the orchestrator agent.
pub const QUESTION_TOOL: &str = "answer_question";

const ORCHESTRATOR_PROMPT: &str = "\
당신은 AI 어시스턴트입니다.
사용자 입력을 처리해주세요.
일기에 대한 질문이면 answer_question 도구로 답을 구하고, 그 답을 그대로 전달합니다.";

const STRUCTURED_INSTRUCTION: &str = "사용자 요청에 대한 처리 결과를 구조화된 형태로 추출하시오";

fn result_schema() -> Value {
    json!({
        "type": "data | answer",
        "content": "생성된 결과 내용 (data인 경우 빈 문자열)",
        "message": "응답 메시지"
    })
}

/// Routes each request to storage or question answering and normalizes the
/// outcome.
pub struct Router {
    answerer: Arc<dyn QuestionAnswerer>,
    evaluator: Arc<dyn Evaluator>,
    model: Arc<dyn ChatModel>,
    config: ModelConfig,
    strategy: RoutingStrategy,
}

impl Router {
    /// Create a router using the direct strategy and no evaluation.
    ///
    /// `model` and `config` drive the orchestrator agent when the
    /// agent-mediated strategy is selected.
    pub fn new(
        answerer: Arc<dyn QuestionAnswerer>,
        model: Arc<dyn ChatModel>,
        config: ModelConfig,
    ) -> Self {
        Self {
            answerer,
            evaluator: Arc::new(DisabledEvaluator),
            model,
            config,
            strategy: RoutingStrategy::Direct,
        }
    }

    /// Select the question strategy.
    pub fn with_strategy(mut self, strategy: RoutingStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the evaluator run after each answer.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Active question strategy.
    pub fn strategy(&self) -> RoutingStrategy {
        self.strategy
    }

    /// Route one request. Never fails: collaborator errors become an answer
    /// result whose message carries the cause.
    pub async fn route(
        &self,
        user_input: &str,
        user_id: Option<&str>,
        current_date: Option<&str>,
    ) -> OrchestrationResult {
        let verdict = classify(user_input);
        info!(
            verdict = ?verdict,
            marker = matched_marker(user_input).unwrap_or(""),
            input = %diary_core::preview(user_input, 100),
            "Classified request"
        );

        if verdict == RoutingVerdict::Data {
            return OrchestrationResult::saved();
        }

        let outcome = match self.strategy {
            RoutingStrategy::Direct => self.answer_direct(user_input, user_id, current_date).await,
            RoutingStrategy::AgentMediated => {
                self.answer_via_agent(user_input, user_id, current_date)
                    .await
            }
        };

        let (result, reference) = match outcome {
            Ok(answer) => answer,
            Err(e) => {
                error!(strategy = %self.strategy, error = %e, "Answer generation failed");
                return OrchestrationResult::answer_failed(e);
            }
        };

        info!(
            strategy = %self.strategy,
            result_type = ?result.kind,
            content_len = result.content.chars().count(),
            "Request routed"
        );

        if result.has_answer() {
            self.spawn_evaluation(user_input, &result.content, reference);
        }

        result
    }

    async fn answer_direct(
        &self,
        question: &str,
        user_id: Option<&str>,
        current_date: Option<&str>,
    ) -> Result<(OrchestrationResult, Option<String>)> {
        let answer = self.answerer.answer(question, user_id, current_date).await?;
        Ok((OrchestrationResult::answered(answer.response), answer.reference))
    }

    async fn answer_via_agent(
        &self,
        user_input: &str,
        user_id: Option<&str>,
        current_date: Option<&str>,
    ) -> Result<(OrchestrationResult, Option<String>)> {
        let tools = ToolSet::new().with(QuestionTool {
            answerer: self.answerer.clone(),
            user_id: user_id.map(String::from),
            current_date: current_date.map(String::from),
        });
        let mut session =
            AgentSession::new(self.model.clone(), self.config.clone(), ORCHESTRATOR_PROMPT)
                .with_tools(tools);

        let prompt = format!(
            "사용자 입력: {}\n사용자 ID: {}\n현재 날짜: {}\n\n답변해주세요.",
            user_input,
            user_id.unwrap_or("미제공"),
            current_date.unwrap_or("미제공")
        );
        session.invoke(&prompt).await?;

        let entries = extract_tool_results(session.history());
        debug!(tool_results = entries.len(), "Collected tool results");

        let raw = session
            .structured_output(STRUCTURED_INSTRUCTION, &result_schema())
            .await?;
        let mut result = parse_structured_response(&raw);

        if result.kind == ResultType::Answer && result.content.is_empty() {
            if let Some(response) = extract_response(&entries) {
                debug!("Backfilling content from tool result");
                result.content = response;
            }
        }

        let reference =
            extract_json_field(&entries, "reference").or_else(|| extract_reference(&entries));
        Ok((result, reference))
    }

    fn spawn_evaluation(&self, input: &str, output: &str, reference: Option<String>) {
        let evaluator = self.evaluator.clone();
        let request = EvaluationRequest {
            input: input.to_string(),
            output: output.to_string(),
            reference,
        };

        tokio::spawn(async move {
            match evaluator.evaluate(&request).await {
                Ok(outcome) => match outcome.error {
                    Some(reason) => debug!(reason = %reason, "Evaluation skipped"),
                    None => info!(
                        hallucination = ?outcome.hallucination_score,
                        relevance = ?outcome.relevance_score,
                        "Evaluation recorded"
                    ),
                },
                Err(e) => warn!(error = %e, "Evaluation failed"),
            }
        });
    }
}

/// Exposes the question answerer to the orchestrator agent, bound to the
/// current request's user and date.
struct QuestionTool {
    answerer: Arc<dyn QuestionAnswerer>,
    user_id: Option<String>,
    current_date: Option<String>,
}

#[async_trait]
impl Tool for QuestionTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            QUESTION_TOOL,
            "Answer a question about the user's diary using the knowledge base",
            json!({
                "type": "object",
                "properties": {
                    "question": { "type": "string", "description": "The user's question" }
                },
                "required": ["question"]
            }),
        )
    }

    async fn call(&self, arguments: &Value) -> diary_agent::Result<ToolOutput> {
        let question = arguments
            .get("question")
            .and_then(Value::as_str)
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| diary_agent::AgentError::InvalidArguments {
                tool_name: QUESTION_TOOL.to_string(),
                message: "missing `question`".to_string(),
            })?;

        let answer = self
            .answerer
            .answer(
                question,
                self.user_id.as_deref(),
                self.current_date.as_deref(),
            )
            .await?;

        Ok(ToolOutput::json(json!({
            "response": answer.response,
            "reference": answer.reference,
        })))
    }
}
