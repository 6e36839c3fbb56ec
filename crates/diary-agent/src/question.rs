//! Question answering over the diary knowledge base.
//!
//! [`KnowledgeBaseAnswerer`] builds a fresh [`AgentSession`] per question with
//! a `retrieve` tool scoped to the asking user. The supporting passages the
//! tool returned are handed back as the answer's reference text.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::client::ChatModel;
use crate::config::ModelConfig;
use crate::error::Result;
use crate::extract::{extract_reference, extract_tool_results};
use crate::retrieve::{RetrieveTool, Retriever};
use crate::session::AgentSession;
use crate::tool::ToolSet;

/// Answer returned when no knowledge base is configured.
pub const KNOWLEDGE_BASE_MISSING_ANSWER: &str =
    "Knowledge Base 설정 오류. 시스템 관리자에게 문의하세요.";

const QUESTION_SYSTEM_PROMPT: &str = "\
당신은 사용자의 일기를 바탕으로 질문에 답하는 AI 어시스턴트입니다.

<작업순서>
1. 답변하기 전에 반드시 retrieve 도구로 지식베이스를 검색합니다.
2. 검색 결과에 있는 내용만으로 답변합니다.
</작업순서>

<답변지침>
- 검색 결과가 없으면 \"해당 날짜의 일기 기록을 찾을 수 없습니다.\"라고 답합니다.
- 지식베이스에 없는 내용은 추측하지 않습니다.
- user_id는 답변에 포함하지 않습니다.
- 백틱이나 코드 블록 없이 간결한 한국어로 답합니다.
</답변지침>";

/// An answer with the supporting text it was based on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaAnswer {
    /// Answer text.
    pub response: String,
    /// Retrieved supporting text, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Answers a user's question about their diary.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// Answer `question` for `user_id` as of `current_date`.
    async fn answer(
        &self,
        question: &str,
        user_id: Option<&str>,
        current_date: Option<&str>,
    ) -> Result<QaAnswer>;
}

/// Retrieval-augmented question answering agent.
pub struct KnowledgeBaseAnswerer {
    model: Arc<dyn ChatModel>,
    config: ModelConfig,
    retriever: Arc<dyn Retriever>,
    knowledge_base_configured: bool,
    max_results: usize,
}

impl KnowledgeBaseAnswerer {
    /// Create an answerer.
    pub fn new(
        model: Arc<dyn ChatModel>,
        config: ModelConfig,
        retriever: Arc<dyn Retriever>,
        knowledge_base_configured: bool,
    ) -> Self {
        Self {
            model,
            config,
            retriever,
            knowledge_base_configured,
            max_results: 5,
        }
    }

    /// Set how many passages each retrieval asks for.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }
}

fn system_prompt(user_id: Option<&str>, current_date: Option<&str>) -> String {
    let mut prompt = QUESTION_SYSTEM_PROMPT.to_string();
    if user_id.is_some() || current_date.is_some() {
        prompt.push_str("\n\n<context>\n");
        if let Some(user_id) = user_id {
            prompt.push_str(&format!("사용자 ID: {}\n", user_id));
        }
        if let Some(date) = current_date {
            prompt.push_str(&format!("현재 날짜: {}\n", date));
        }
        prompt.push_str("</context>");
    }
    prompt
}

fn search_prompt(question: &str, user_id: Option<&str>, current_date: Option<&str>) -> String {
    format!(
        "retrieve 도구로 지식베이스를 검색한 뒤 답변하시오.\n\n\
         검색 조건:\n- 사용자 ID: {}\n- 현재 날짜: {}\n- 질문: {}",
        user_id.unwrap_or("미제공"),
        current_date.unwrap_or("미제공"),
        question
    )
}

#[async_trait]
impl QuestionAnswerer for KnowledgeBaseAnswerer {
    async fn answer(
        &self,
        question: &str,
        user_id: Option<&str>,
        current_date: Option<&str>,
    ) -> Result<QaAnswer> {
        if !self.knowledge_base_configured {
            error!("Question received but no knowledge base is configured");
            return Ok(QaAnswer {
                response: KNOWLEDGE_BASE_MISSING_ANSWER.to_string(),
                reference: None,
            });
        }

        let tools = ToolSet::new().with(RetrieveTool::new(
            self.retriever.clone(),
            user_id.map(String::from),
            self.max_results,
        ));
        let mut session = AgentSession::new(
            self.model.clone(),
            self.config.clone(),
            system_prompt(user_id, current_date),
        )
        .with_tools(tools);

        let response = session
            .invoke(&search_prompt(question, user_id, current_date))
            .await?;

        let entries = extract_tool_results(session.history());
        let reference = extract_reference(&entries);

        info!(
            tool_results = entries.len(),
            has_reference = reference.is_some(),
            response_len = response.chars().count(),
            "Question answered"
        );

        Ok(QaAnswer {
            response,
            reference,
        })
    }
}
