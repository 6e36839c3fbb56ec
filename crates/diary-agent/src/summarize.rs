//! Diary writing from free-form notes.

use std::sync::Arc;

use tracing::info;

use crate::client::ChatModel;
use crate::config::ModelConfig;
use crate::error::Result;
use crate::session::AgentSession;

const SUMMARIZE_SYSTEM_PROMPT: &str = "\
당신은 일기를 작성하는 AI 어시스턴트입니다.
입력 받은 정보를 바탕으로 1인칭 줄글 형식의 일기를 작성합니다.

<답변지침>
- 맞춤법과 문단 나누기를 지킵니다.
- 입력 내용을 빠뜨리지 않습니다.
- 내용에 언급되지 않은 날짜는 쓰지 않습니다.
- user_id나 개인정보를 포함하지 않습니다.
- 백틱이나 코드 블록 없이 자연스러운 한국어 plain text로 작성합니다.
</답변지침>";

/// Default top-k cutoff for diary generation.
pub const SUMMARIZE_TOP_K: u32 = 50;

/// Turns notes into a diary entry with a single model call.
pub struct Summarizer {
    model: Arc<dyn ChatModel>,
    config: ModelConfig,
}

impl Summarizer {
    /// Create a summarizer.
    pub fn new(model: Arc<dyn ChatModel>, config: ModelConfig) -> Self {
        Self {
            model,
            config: config.with_top_k(SUMMARIZE_TOP_K),
        }
    }

    /// Write a diary entry from `content`.
    ///
    /// `temperature`, when given, overrides the configured one and is clamped
    /// to `0.0..=1.0`.
    pub async fn summarize(&self, content: &str, temperature: Option<f32>) -> Result<String> {
        let config = match temperature {
            Some(t) => self.config.clone().with_temperature(t),
            None => self.config.clone(),
        };

        info!(
            content_len = content.chars().count(),
            temperature = config.temperature,
            "Summarizing diary content"
        );

        let mut session = AgentSession::new(self.model.clone(), config, SUMMARIZE_SYSTEM_PROMPT);
        session.invoke(content).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChatModel;

    #[tokio::test]
    async fn test_summarize_single_call() {
        let model = Arc::new(ScriptedChatModel::new().then_text("오늘은 파스타를 먹었다."));
        let summarizer = Summarizer::new(model.clone(), ModelConfig::new("writer"));

        let text = summarizer.summarize("점심 파스타", None).await.unwrap();
        assert_eq!(text, "오늘은 파스타를 먹었다.");

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].tool_names.is_empty());
        assert_eq!(requests[0].temperature, 0.7);
    }

    #[tokio::test]
    async fn test_temperature_override_is_clamped() {
        let model = Arc::new(ScriptedChatModel::new().then_text("일기"));
        let summarizer = Summarizer::new(model.clone(), ModelConfig::default());

        summarizer.summarize("메모", Some(3.0)).await.unwrap();
        assert_eq!(model.requests()[0].temperature, 1.0);
    }
}
