//! Builds the application state from configuration.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info};

use diary_agent::{
    AgentError, ChatClient, ChatModel, DisabledEvaluator, Evaluator, HttpImageBackend,
    HttpReportBackend, HttpRetriever, ImageAgent, KnowledgeBaseAnswerer, LlmJudgeEvaluator,
    ModelConfig, ReportAgent, Retriever, Summarizer, UnconfiguredRetriever,
};
use diary_api::{ApiConfig, AppState};
use diary_core::{AppConfig, ConfigError};
use diary_orchestrator::Router;

/// Startup errors.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Invalid configuration value.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A collaborator could not be constructed.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// The listener failed.
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Wire every collaborator from `config`.
pub fn build_state(config: &AppConfig) -> Result<AppState, StartupError> {
    let timeout = Duration::from_secs(config.llm.timeout_secs);
    let model: Arc<dyn ChatModel> = Arc::new(ChatClient::from_config(&config.llm)?);

    let (retriever, knowledge_base_configured): (Arc<dyn Retriever>, bool) =
        match HttpRetriever::from_config(&config.knowledge_base, timeout) {
            Ok(retriever) => (Arc::new(retriever), config.knowledge_base.is_configured()),
            Err(e) => {
                error!(error = %e, "Knowledge base retrieval is unavailable");
                (Arc::new(UnconfiguredRetriever), false)
            }
        };

    let answer_config = ModelConfig::new(&config.llm.claude_model);
    let answerer = KnowledgeBaseAnswerer::new(
        model.clone(),
        answer_config.clone(),
        retriever,
        knowledge_base_configured,
    )
    .with_max_results(config.knowledge_base.max_results);

    let evaluator: Arc<dyn Evaluator> = if config.evaluation.enabled {
        Arc::new(LlmJudgeEvaluator::new(model.clone(), config.evaluation.clone()))
    } else {
        Arc::new(DisabledEvaluator)
    };

    let router = Router::new(
        Arc::new(answerer),
        model.clone(),
        ModelConfig::new(&config.llm.orchestrator_model),
    )
    .with_strategy(config.routing)
    .with_evaluator(evaluator);

    let images = ImageAgent::new(
        model.clone(),
        answer_config.clone(),
        Arc::new(HttpImageBackend::from_config(&config.image, timeout)?),
        &config.knowledge_base.bucket,
        &config.region,
    );
    let reports = ReportAgent::new(
        model.clone(),
        answer_config.clone(),
        Arc::new(HttpReportBackend::from_config(&config.report, timeout)?),
    );
    let summarizer = Summarizer::new(model, answer_config);

    info!(
        app = %config.app_name,
        strategy = %config.routing,
        knowledge_base_configured,
        evaluation = config.evaluation.enabled,
        "Collaborators ready"
    );

    Ok(AppState::new(
        ApiConfig::from(&config.server),
        router,
        images,
        reports,
        summarizer,
    ))
}
