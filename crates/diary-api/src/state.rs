//! Application state shared across handlers.

use std::sync::Arc;

use diary_agent::{ImageAgent, ReportAgent, Summarizer};
use diary_orchestrator::Router;

use crate::config::ApiConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Data/question router behind `/agent`.
    pub router: Arc<Router>,
    /// Image agent behind `/agent/image`.
    pub images: Arc<ImageAgent>,
    /// Report agent behind `/agent/report`.
    pub reports: Arc<ReportAgent>,
    /// Diary writer behind `/agent/summarize`.
    pub summarizer: Arc<Summarizer>,
}

impl AppState {
    /// Creates a new AppState with all components.
    pub fn new(
        config: ApiConfig,
        router: Router,
        images: ImageAgent,
        reports: ReportAgent,
        summarizer: Summarizer,
    ) -> Self {
        Self {
            config: Arc::new(config),
            router: Arc::new(router),
            images: Arc::new(images),
            reports: Arc::new(reports),
            summarizer: Arc::new(summarizer),
        }
    }
}
