//! Tools offered to the image agent.
//!
//! Tools report their own failures as `{"success": false, "error": ...}`
//! payloads so the agent can relay them to the caller unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::backend::{object_key, object_url, random_seed, ImageBackend};
use super::ImageRequest;
use crate::client::{ChatMessage, ChatModel};
use crate::config::ModelConfig;
use crate::error::Result;
use crate::tool::{optional_str, required_str, Tool, ToolDefinition, ToolOutput};

const PROMPT_SYSTEM: &str = "You convert Korean diary entries into English prompts for realistic \
photography. Output only the English prompt. Include weather, time of day, location, animals \
and mood when the diary mentions them. People are East Asian. If the writer does something \
with a pet, show both together. Keep it under 500 characters.";

/// Negative prompt sent with every generation.
pub const NEGATIVE_PROMPT: &str = "anime, cartoon, illustration, painting, sketch, drawing, \
3d render, cgi, fantasy, low quality, blurry, noise, jpeg artifacts, deformed body, distorted \
face, bad anatomy, extra fingers, extra limbs, text, caption, watermark, logo";

const MAX_PROMPT_CHARS: usize = 1024;

/// Positive and negative prompt for one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePrompt {
    /// What to draw.
    pub positive: String,
    /// What to avoid.
    pub negative: String,
}

/// Turns diary text into an image prompt with a chat model.
pub struct PromptBuilder {
    model: Arc<dyn ChatModel>,
    config: ModelConfig,
}

impl PromptBuilder {
    /// Create a prompt builder.
    pub fn new(model: Arc<dyn ChatModel>, config: ModelConfig) -> Self {
        Self {
            model,
            config: config.with_max_tokens(1024),
        }
    }

    /// Build a prompt. Falls back to a literal description if the model fails.
    pub async fn build(&self, diary_text: &str) -> ImagePrompt {
        let messages = vec![
            ChatMessage::system(PROMPT_SYSTEM),
            ChatMessage::user(format!(
                "Convert this Korean diary entry into an English image generation prompt:\n\n{}",
                diary_text
            )),
        ];

        let positive = match self.model.chat(&self.config, messages, None).await {
            Ok(response) if !response.content().trim().is_empty() => {
                let prompt = response.content().trim().to_string();
                if prompt.chars().count() > MAX_PROMPT_CHARS {
                    diary_core::preview(&prompt, MAX_PROMPT_CHARS - 3)
                } else {
                    prompt
                }
            }
            Ok(_) => fallback_prompt(diary_text),
            Err(e) => {
                warn!(error = %e, "Prompt generation failed, using fallback");
                fallback_prompt(diary_text)
            }
        };

        info!(prompt = %diary_core::preview(&positive, 100), "Image prompt ready");
        ImagePrompt {
            positive,
            negative: NEGATIVE_PROMPT.to_string(),
        }
    }
}

fn fallback_prompt(diary_text: &str) -> String {
    format!(
        "A realistic documentary-style photo representing: {}",
        diary_core::truncate_chars(diary_text, 200)
    )
}

fn failure(error: impl std::fmt::Display) -> ToolOutput {
    ToolOutput::json(json!({ "success": false, "error": error.to_string() }))
}

fn text_parameter(description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "text": { "type": "string", "description": description }
        },
        "required": ["text"]
    })
}

/// `generate_image_from_text`: preview image, not stored.
pub struct GenerateImageTool {
    prompts: Arc<PromptBuilder>,
    backend: Arc<dyn ImageBackend>,
    request: Arc<ImageRequest>,
}

impl GenerateImageTool {
    /// Create the tool.
    pub fn new(prompts: Arc<PromptBuilder>, backend: Arc<dyn ImageBackend>, request: Arc<ImageRequest>) -> Self {
        Self {
            prompts,
            backend,
            request,
        }
    }
}

#[async_trait]
impl Tool for GenerateImageTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "generate_image_from_text",
            "Generate a preview image from Korean diary text. The image is not uploaded.",
            text_parameter("Diary text in Korean"),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<ToolOutput> {
        let Some(text) = optional_str(arguments, "text").or(self.request.text.as_deref()) else {
            return Ok(failure("text is required"));
        };

        let prompt = self.prompts.build(text).await;
        match self
            .backend
            .generate(&prompt.positive, &prompt.negative, random_seed())
            .await
        {
            Ok(image_base64) => Ok(ToolOutput::json(json!({
                "success": true,
                "image_base64": image_base64,
                "prompt": {
                    "positive": prompt.positive,
                    "negative": prompt.negative,
                }
            }))),
            Err(e) => {
                warn!(error = %e, "Image generation failed");
                Ok(failure(e))
            }
        }
    }
}

/// `build_prompt_from_text`: prompt only, no image.
pub struct BuildPromptTool {
    prompts: Arc<PromptBuilder>,
}

impl BuildPromptTool {
    /// Create the tool.
    pub fn new(prompts: Arc<PromptBuilder>) -> Self {
        Self { prompts }
    }
}

#[async_trait]
impl Tool for BuildPromptTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "build_prompt_from_text",
            "Convert Korean diary text into an image generation prompt without generating an image",
            text_parameter("Diary text in Korean"),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<ToolOutput> {
        let text = required_str("build_prompt_from_text", arguments, "text")?;
        let prompt = self.prompts.build(text).await;
        Ok(ToolOutput::json(json!({
            "success": true,
            "positive_prompt": prompt.positive,
            "negative_prompt": prompt.negative,
        })))
    }
}

/// `upload_image`: store an image in the user's history.
///
/// The image and user of the current request take precedence over model
/// arguments, since the model only ever sees a preview of the image data.
pub struct UploadImageTool {
    backend: Arc<dyn ImageBackend>,
    bucket: String,
    region: String,
    request: Arc<ImageRequest>,
}

impl UploadImageTool {
    /// Create the tool.
    pub fn new(
        backend: Arc<dyn ImageBackend>,
        bucket: impl Into<String>,
        region: impl Into<String>,
        request: Arc<ImageRequest>,
    ) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
            region: region.into(),
            request,
        }
    }
}

#[async_trait]
impl Tool for UploadImageTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "upload_image",
            "Upload the request's image to the user's diary history",
            json!({
                "type": "object",
                "properties": {
                    "user_id": { "type": "string", "description": "User id" },
                    "image_base64": { "type": "string", "description": "Base64 PNG image" },
                    "record_date": { "type": "string", "description": "Record date, ISO format" }
                },
                "required": ["user_id"]
            }),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<ToolOutput> {
        let Some(user_id) = self
            .request
            .user_id
            .as_deref()
            .or_else(|| optional_str(arguments, "user_id"))
        else {
            return Ok(failure("user_id is required"));
        };
        let Some(image_base64) = self
            .request
            .image_base64
            .as_deref()
            .or_else(|| optional_str(arguments, "image_base64"))
        else {
            return Ok(failure("image_base64 is required"));
        };
        let record_date = self
            .request
            .record_date
            .as_deref()
            .or_else(|| optional_str(arguments, "record_date"));

        let png = match base64::engine::general_purpose::STANDARD.decode(image_base64.trim()) {
            Ok(bytes) => bytes,
            Err(e) => return Ok(failure(format!("invalid image_base64: {}", e))),
        };

        let key = object_key(user_id, record_date, Utc::now());
        if let Err(e) = self.backend.upload(&key, png).await {
            warn!(error = %e, key = %key, "Image upload failed");
            return Ok(failure(e));
        }

        info!(key = %key, "Image uploaded");
        Ok(ToolOutput::json(json!({
            "success": true,
            "user_id": user_id,
            "s3_key": key,
            "image_url": object_url(&self.bucket, &self.region, &key),
        })))
    }
}

/// `health_check`: report that the image service is up.
pub struct HealthCheckTool {
    bucket: String,
}

impl HealthCheckTool {
    /// Create the tool.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl Tool for HealthCheckTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "health_check",
            "Check the image generation service status",
            json!({ "type": "object", "properties": {} }),
        )
    }

    async fn call(&self, _arguments: &Value) -> Result<ToolOutput> {
        Ok(ToolOutput::json(json!({
            "success": true,
            "status": "ok",
            "service": "image-generator-agent",
            "s3_bucket": self.bucket,
            "timestamp": Utc::now().to_rfc3339(),
        })))
    }
}
