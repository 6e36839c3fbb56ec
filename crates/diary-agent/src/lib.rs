//! Chat-model agents for the diary gateway.
//!
//! Everything here talks to a model through the [`ChatModel`] trait and to
//! outside services through small backend traits, so each piece can be
//! exercised with scripted fakes.
//!
//! # Architecture
//!
//! - [`AgentSession`]: one request-scoped conversation running the tool loop
//! - [`ToolSet`] / [`Tool`]: tools a session may call
//! - [`history`] and [`extract`]: Converse-shaped history and field extraction
//! - [`question`]: retrieval-augmented question answering
//! - [`summarize`], [`weekly_report`], [`image`]: the secondary agents
//! - [`eval`]: advisory answer evaluation
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use diary_agent::{ChatClient, KnowledgeBaseAnswerer, ModelConfig, QuestionAnswerer};
//!
//! let client = Arc::new(ChatClient::from_config(&config.llm)?);
//! let answerer = KnowledgeBaseAnswerer::new(client, ModelConfig::new(&config.llm.claude_model), retriever, true);
//! let answer = answerer.answer("오늘 뭐 먹었어?", Some("user-1"), Some("2024-05-01")).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod eval;
pub mod extract;
pub mod history;
pub mod image;
pub mod question;
pub mod retrieve;
pub mod session;
pub mod summarize;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tool;
pub mod weekly_report;

pub use client::{ChatClient, ChatMessage, ChatModel, ChatResponse, ChatTool};
pub use config::ModelConfig;
pub use error::{AgentError, Result};
pub use eval::{DisabledEvaluator, EvaluationOutcome, EvaluationRequest, Evaluator, LlmJudgeEvaluator};
pub use extract::{extract_json_field, extract_reference, extract_response, extract_tool_results};
pub use history::{ContentBlock, ToolResultEntry};
pub use image::{HttpImageBackend, ImageAgent, ImageBackend, ImageRequest};
pub use question::{KnowledgeBaseAnswerer, QaAnswer, QuestionAnswerer};
pub use retrieve::{HttpRetriever, RetrieveTool, RetrievedPassage, Retriever, UnconfiguredRetriever};
pub use session::{AgentSession, MAX_TOOL_ITERATIONS};
pub use summarize::Summarizer;
pub use tool::{Tool, ToolCall, ToolDefinition, ToolOutput, ToolResult, ToolSet, ToolStatus};
pub use weekly_report::{HttpReportBackend, ReportAgent, ReportBackend, ReportRequest};
