//! Shared building blocks for the diary agent gateway.
//!
//! This crate holds the process configuration read at startup and small text
//! helpers used by the agent, orchestrator and API crates.

pub mod config;
pub mod text;

pub use config::{
    load_env_files, AppConfig, ConfigError, EvaluationSettings, ImageConfig, KnowledgeBaseConfig,
    LlmConfig, ReportConfig, RoutingStrategy, ServerConfig, MISSING_PLACEHOLDER,
};
pub use text::{preview, truncate_chars};
