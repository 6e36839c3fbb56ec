//! Weekly report agent.
//!
//! Answers report requests (create, list, inspect, poll) by letting the model
//! drive the report service through one tool per backend operation.

mod backend;
mod prompts;
mod tools;

pub use backend::{HttpReportBackend, ReportBackend};
pub use prompts::REPORT_SYSTEM_PROMPT;
pub use tools::{ReportTool, ReportToolKind, DEFAULT_REPORT_LIMIT};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::client::ChatModel;
use crate::config::ModelConfig;
use crate::error::Result;
use crate::session::AgentSession;
use crate::tool::ToolSet;

/// Body of a report request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Natural language request.
    pub request: String,
    /// User the report is for.
    pub user_id: Option<String>,
    /// Period start, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Period end, `YYYY-MM-DD`.
    pub end_date: Option<String>,
    /// Existing report to inspect.
    pub report_id: Option<i64>,
}

impl ReportRequest {
    /// Prompt given to the agent.
    pub fn to_prompt(&self) -> String {
        let mut prompt = format!("요청: {}", self.request);
        if let Some(user_id) = &self.user_id {
            prompt.push_str(&format!("\n사용자 ID: {}", user_id));
        }
        if let Some(start) = &self.start_date {
            prompt.push_str(&format!("\n시작일: {}", start));
        }
        if let Some(end) = &self.end_date {
            prompt.push_str(&format!("\n종료일: {}", end));
        }
        if let Some(report_id) = self.report_id {
            prompt.push_str(&format!("\n리포트 ID: {}", report_id));
        }
        prompt
    }
}

/// Agent that manages weekly reports.
pub struct ReportAgent {
    model: Arc<dyn ChatModel>,
    config: ModelConfig,
    backend: Arc<dyn ReportBackend>,
}

impl ReportAgent {
    /// Create a report agent.
    pub fn new(model: Arc<dyn ChatModel>, config: ModelConfig, backend: Arc<dyn ReportBackend>) -> Self {
        Self {
            model,
            config,
            backend,
        }
    }

    /// Handle a request and return the agent's final answer.
    pub async fn run(&self, request: &ReportRequest) -> Result<String> {
        let tools = ReportToolKind::ALL
            .iter()
            .fold(ToolSet::new(), |set, kind| {
                set.with(ReportTool::new(*kind, self.backend.clone()))
            });

        let mut session =
            AgentSession::new(self.model.clone(), self.config.clone(), REPORT_SYSTEM_PROMPT)
                .with_tools(tools);
        let response = session.invoke(&request.to_prompt()).await?;

        info!(
            tools_run = session.tool_results().len(),
            response_len = response.chars().count(),
            "Report request handled"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatResponse;
    use crate::testing::ScriptedChatModel;
    use crate::tool::ToolCall;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct FixedBackend;

    #[async_trait]
    impl ReportBackend for FixedBackend {
        async fn get_user_info(&self, user_id: &str) -> Result<Value> {
            Ok(json!({"user_id": user_id, "nickname": "민지"}))
        }
        async fn get_diary_entries(&self, _u: &str, _s: &str, _e: &str) -> Result<Value> {
            Ok(json!({"entries": []}))
        }
        async fn get_report_list(&self, _u: &str, _l: u32) -> Result<Value> {
            Ok(json!({"reports": []}))
        }
        async fn get_report_detail(&self, id: i64, _u: &str) -> Result<Value> {
            Ok(json!({"report_id": id}))
        }
        async fn create_report(&self, _u: &str, _s: &str, _e: &str) -> Result<Value> {
            Ok(json!({"report_id": 3, "status": "processing"}))
        }
        async fn check_report_status(&self, id: i64, _u: &str) -> Result<Value> {
            Ok(json!({"report_id": id, "status": "completed"}))
        }
    }

    #[test]
    fn test_prompt_lines() {
        let request = ReportRequest {
            request: "이번 주 리포트 만들어줘".into(),
            user_id: Some("u1".into()),
            start_date: Some("2024-05-01".into()),
            end_date: Some("2024-05-07".into()),
            report_id: Some(3),
        };
        assert_eq!(
            request.to_prompt(),
            "요청: 이번 주 리포트 만들어줘\n사용자 ID: u1\n시작일: 2024-05-01\n종료일: 2024-05-07\n리포트 ID: 3"
        );
        assert_eq!(ReportRequest::default().to_prompt(), "요청: ");
    }

    #[tokio::test]
    async fn test_run_with_tool() {
        let call = ToolCall::with_id(
            "c1",
            "create_report",
            json!({"user_id": "u1", "start_date": "2024-05-01", "end_date": "2024-05-07"}),
        );
        let model = Arc::new(
            ScriptedChatModel::new()
                .then(ChatResponse::tool_calls_of(&[call]))
                .then_text("리포트 생성을 시작했어요."),
        );
        let agent = ReportAgent::new(model.clone(), ModelConfig::default(), Arc::new(FixedBackend));

        let response = agent
            .run(&ReportRequest {
                request: "리포트 만들어줘".into(),
                user_id: Some("u1".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(response, "리포트 생성을 시작했어요.");
        assert_eq!(model.requests()[0].tool_names.len(), 6);
        let tool_message = model.requests()[1].messages.last().cloned().unwrap();
        assert!(tool_message.content.unwrap().contains("processing"));
    }
}
