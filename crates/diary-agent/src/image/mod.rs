//! Diary image agent.
//!
//! Turns diary text into a generated image preview, or stores an image in the
//! user's history, depending on what the request asks for. The agent picks
//! the tool; the payload of the last tool it ran is returned unchanged.

mod backend;
mod tools;

pub use backend::{
    object_key, object_url, record_day, text_to_image_body, HttpImageBackend, ImageBackend,
    ImageParams,
};
pub use tools::{
    BuildPromptTool, GenerateImageTool, HealthCheckTool, ImagePrompt, PromptBuilder,
    UploadImageTool, NEGATIVE_PROMPT,
};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::client::ChatModel;
use crate::config::ModelConfig;
use crate::error::Result;
use crate::session::AgentSession;
use crate::tool::ToolSet;

const IMAGE_SYSTEM_PROMPT: &str = "\
당신은 일기 텍스트를 이미지로 변환하는 AI Agent입니다.

도구:
1. generate_image_from_text: 일기 텍스트로 미리보기 이미지 생성 (업로드 없음)
2. upload_image: 이미지를 사용자 히스토리에 업로드
3. build_prompt_from_text: 이미지 생성 프롬프트만 생성
4. health_check: 서비스 상태 확인

작업 흐름:
- \"미리보기\", \"이미지 생성\" 요청과 일기 텍스트가 있으면 generate_image_from_text
- \"업로드\", \"저장\", \"히스토리에 추가\" 요청과 이미지가 있으면 upload_image
- \"프롬프트 생성\" 요청이면 build_prompt_from_text
미리보기는 업로드하지 않습니다.";

/// Characters of image data shown to the model.
const IMAGE_PREVIEW_CHARS: usize = 100;

/// Body of an image request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Natural language request.
    pub request: String,
    /// User the image belongs to.
    pub user_id: Option<String>,
    /// Diary text to illustrate.
    pub text: Option<String>,
    /// Image to upload, base64 encoded.
    pub image_base64: Option<String>,
    /// Record date of the diary entry.
    pub record_date: Option<String>,
}

impl ImageRequest {
    /// Prompt given to the agent. Image data is reduced to a short preview.
    pub fn to_prompt(&self) -> String {
        let mut prompt = format!("요청: {}", self.request);
        if let Some(user_id) = &self.user_id {
            prompt.push_str(&format!("\nuser_id: {}", user_id));
        }
        if let Some(text) = &self.text {
            prompt.push_str(&format!("\n일기 텍스트: {}", text));
        }
        if let Some(image) = &self.image_base64 {
            prompt.push_str(&format!(
                "\nimage_base64: {}... (총 {} 문자)",
                diary_core::truncate_chars(image, IMAGE_PREVIEW_CHARS),
                image.chars().count()
            ));
        }
        if let Some(date) = &self.record_date {
            prompt.push_str(&format!("\nrecord_date: {}", date));
        }
        prompt
    }
}

/// Agent that generates and stores diary images.
pub struct ImageAgent {
    model: Arc<dyn ChatModel>,
    config: ModelConfig,
    prompts: Arc<PromptBuilder>,
    backend: Arc<dyn ImageBackend>,
    bucket: String,
    region: String,
}

impl ImageAgent {
    /// Create an image agent.
    pub fn new(
        model: Arc<dyn ChatModel>,
        config: ModelConfig,
        backend: Arc<dyn ImageBackend>,
        bucket: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        let prompts = Arc::new(PromptBuilder::new(model.clone(), config.clone()));
        Self {
            model,
            config,
            prompts,
            backend,
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    /// Handle a request.
    ///
    /// Returns the JSON payload of the last tool that ran, or
    /// `{"success": true, "response": <text>}` when no tool produced JSON.
    pub async fn run(&self, request: ImageRequest) -> Result<Value> {
        let request = Arc::new(request);
        let tools = ToolSet::new()
            .with(GenerateImageTool::new(
                self.prompts.clone(),
                self.backend.clone(),
                request.clone(),
            ))
            .with(UploadImageTool::new(
                self.backend.clone(),
                &self.bucket,
                &self.region,
                request.clone(),
            ))
            .with(BuildPromptTool::new(self.prompts.clone()))
            .with(HealthCheckTool::new(&self.bucket));

        let mut session =
            AgentSession::new(self.model.clone(), self.config.clone(), IMAGE_SYSTEM_PROMPT)
                .with_tools(tools);
        let response = session.invoke(&request.to_prompt()).await?;

        let last = session
            .last_tool_result()
            .and_then(|r| r.output.first_json())
            .cloned();
        info!(
            tools_run = session.tool_results().len(),
            relayed = last.is_some(),
            "Image request handled"
        );

        Ok(last.unwrap_or_else(|| json!({ "success": true, "response": response })))
    }
}
