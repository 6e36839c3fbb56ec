//! Process-wide configuration for the diary agent gateway.
//!
//! Configuration is read once at startup into an immutable [`AppConfig`] and
//! handed to the router and collaborators by reference. Values come from the
//! process environment, optionally primed from `.env.local` / `.env` files via
//! [`load_env_files`].
//!
//! # Environment Variables
//!
//! - `HOST`, `PORT`: bind address of the HTTP server
//! - `AWS_REGION`: region of the managed model / retrieval services
//! - `KNOWLEDGE_BASE_ID`, `KNOWLEDGE_BASE_BUCKET`: retrieval knowledge base
//! - `RETRIEVAL_API_URL`: knowledge base retrieval endpoint
//! - `LLM_API_BASE_URL`, `LLM_API_KEY` (or `OPENROUTER_API_KEY`): chat completions
//! - `ORCHESTRATOR_MODEL`, `CLAUDE_MODEL`: model identifiers
//! - `IMAGE_MODEL`, `IMAGE_API_URL`, `OBJECT_STORE_URL`: image generation
//! - `REPORT_API_URL`: weekly report backend
//! - `ROUTING_STRATEGY`: `direct` (default) or `agent`
//! - `EVALUATION_ENABLED`, `EVALUATOR_MODEL`: advisory answer evaluation
//! - `REQUEST_TIMEOUT_SECS`: timeout for outbound collaborator calls
//!
//! A missing knowledge base id is not fatal: it is logged and replaced by a
//! placeholder so the endpoints that do not need retrieval keep working.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Placeholder used when a required identifier is absent.
pub const MISSING_PLACEHOLDER: &str = "MISSING";

/// Default region when `AWS_REGION` is not set.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default chat completions base URL.
pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model for the orchestrator and question agents.
pub const DEFAULT_CLAUDE_MODEL: &str = "anthropic/claude-sonnet-4.5";

/// Default image generation model.
pub const DEFAULT_IMAGE_MODEL: &str = "amazon.nova-canvas-v1:0";

/// Default model used to judge answers.
pub const DEFAULT_EVALUATOR_MODEL: &str = "anthropic/claude-sonnet-4.5";

/// Errors raised while reading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was present but could not be interpreted.
    #[error("invalid value for {key}: `{value}`")]
    InvalidValue {
        /// Environment variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
    },
}

/// Result type for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// How the router answers a question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingStrategy {
    /// Call the question-answering collaborator directly.
    #[default]
    Direct,
    /// Let a reasoning agent pick and invoke the question tool.
    AgentMediated,
}

impl std::str::FromStr for RoutingStrategy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "agent" | "agent_mediated" | "agent-mediated" => Ok(Self::AgentMediated),
            _ => Err(ConfigError::InvalidValue {
                key: "ROUTING_STRATEGY",
                value: value.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::AgentMediated => write!(f, "agent_mediated"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

/// Chat model settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,
    /// API key, if the endpoint needs one.
    pub api_key: Option<String>,
    /// Model used by the orchestrator agent.
    pub orchestrator_model: String,
    /// Model used by the question, summarize, report and image agents.
    pub claude_model: String,
    /// Timeout for outbound calls, in seconds.
    pub timeout_secs: u64,
}

/// Retrieval knowledge base settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBaseConfig {
    /// Knowledge base identifier (placeholder when missing).
    pub id: String,
    /// Bucket backing the knowledge base, also used for uploaded images.
    pub bucket: String,
    /// Retrieval endpoint.
    pub retrieval_url: Option<String>,
    /// Number of passages requested per retrieval.
    pub max_results: usize,
}

impl KnowledgeBaseConfig {
    /// Whether a real knowledge base id was configured.
    pub fn is_configured(&self) -> bool {
        !self.id.is_empty() && self.id != MISSING_PLACEHOLDER
    }
}

/// Image generation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    /// Image model identifier.
    pub model: String,
    /// Image generation endpoint.
    pub api_url: Option<String>,
    /// Object store base URL images are uploaded to.
    pub object_store_url: Option<String>,
}

/// Weekly report backend settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    /// Base URL of the report backend.
    pub api_url: Option<String>,
}

/// Advisory evaluation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationSettings {
    /// Whether answers are evaluated at all.
    pub enabled: bool,
    /// Run the hallucination check when reference text exists.
    pub hallucination_check: bool,
    /// Run the relevance check.
    pub relevance_check: bool,
    /// Model used as the judge.
    pub evaluator_model: String,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            hallucination_check: true,
            relevance_check: true,
            evaluator_model: DEFAULT_EVALUATOR_MODEL.to_string(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Application name reported by the health endpoint.
    pub app_name: String,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Cloud region.
    pub region: String,
    /// Chat model settings.
    pub llm: LlmConfig,
    /// Knowledge base settings.
    pub knowledge_base: KnowledgeBaseConfig,
    /// Image generation settings.
    pub image: ImageConfig,
    /// Report backend settings.
    pub report: ReportConfig,
    /// Question routing strategy.
    pub routing: RoutingStrategy,
    /// Evaluation settings.
    pub evaluation: EvaluationSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Diary Orchestrator Agent".to_string(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            region: DEFAULT_REGION.to_string(),
            llm: LlmConfig {
                base_url: DEFAULT_LLM_BASE_URL.to_string(),
                api_key: None,
                orchestrator_model: DEFAULT_CLAUDE_MODEL.to_string(),
                claude_model: DEFAULT_CLAUDE_MODEL.to_string(),
                timeout_secs: 60,
            },
            knowledge_base: KnowledgeBaseConfig {
                id: MISSING_PLACEHOLDER.to_string(),
                bucket: String::new(),
                retrieval_url: None,
                max_results: 5,
            },
            image: ImageConfig {
                model: DEFAULT_IMAGE_MODEL.to_string(),
                api_url: None,
                object_store_url: None,
            },
            report: ReportConfig { api_url: None },
            routing: RoutingStrategy::default(),
            evaluation: EvaluationSettings::default(),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// Empty values are treated as absent.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(host) = get("HOST") {
            config.server.host = host;
        }
        if let Some(port) = get("PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value: port })?;
        }
        if let Some(region) = get("AWS_REGION") {
            config.region = region;
        }

        if let Some(base_url) = get("LLM_API_BASE_URL") {
            config.llm.base_url = base_url.trim_end_matches('/').to_string();
        }
        config.llm.api_key = get("LLM_API_KEY").or_else(|| get("OPENROUTER_API_KEY"));
        if let Some(model) = get("CLAUDE_MODEL") {
            config.llm.claude_model = model;
        }
        config.llm.orchestrator_model =
            get("ORCHESTRATOR_MODEL").unwrap_or_else(|| config.llm.claude_model.clone());
        if let Some(timeout) = get("REQUEST_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => config.llm.timeout_secs = secs,
                Err(e) => error!(
                    key = "REQUEST_TIMEOUT_SECS",
                    value = %timeout,
                    error = %e,
                    default = config.llm.timeout_secs,
                    "Invalid request timeout, keeping default"
                ),
            }
        }

        match get("KNOWLEDGE_BASE_ID") {
            Some(id) => config.knowledge_base.id = id,
            None => {
                error!(
                    key = "KNOWLEDGE_BASE_ID",
                    placeholder = MISSING_PLACEHOLDER,
                    "Knowledge base id is not configured, question answering runs degraded"
                );
            }
        }
        if let Some(bucket) = get("KNOWLEDGE_BASE_BUCKET") {
            config.knowledge_base.bucket = bucket;
        }
        config.knowledge_base.retrieval_url = get("RETRIEVAL_API_URL");

        if let Some(model) = get("IMAGE_MODEL") {
            config.image.model = model;
        }
        config.image.api_url = get("IMAGE_API_URL");
        config.image.object_store_url = get("OBJECT_STORE_URL");
        config.report.api_url = get("REPORT_API_URL");

        if let Some(strategy) = get("ROUTING_STRATEGY") {
            match strategy.parse() {
                Ok(routing) => config.routing = routing,
                Err(e) => error!(
                    key = "ROUTING_STRATEGY",
                    value = %strategy,
                    error = %e,
                    default = %config.routing,
                    "Invalid routing strategy, keeping default"
                ),
            }
        }

        config.evaluation.enabled = get("EVALUATION_ENABLED")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        if let Some(model) = get("EVALUATOR_MODEL") {
            config.evaluation.evaluator_model = model;
        }

        if config.llm.api_key.is_none() {
            warn!("No LLM API key configured, model calls will be unauthenticated");
        }

        Ok(config)
    }

    /// Bind address for the HTTP server.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Load `.env.local` and then `.env` from the working directory.
///
/// Variables already present in the environment are never overridden.
/// Returns the files that were found.
pub fn load_env_files() -> Vec<PathBuf> {
    [".env.local", ".env"]
        .iter()
        .filter_map(|name| dotenvy::from_filename(name).ok())
        .collect()
}
