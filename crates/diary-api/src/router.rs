//! Router configuration and server setup.

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(handlers::health))
        .route("/agent/health", get(handlers::health))
        // Orchestration
        .route("/agent", post(handlers::agent))
        // Secondary agents
        .route("/agent/image", post(handlers::image))
        .route("/agent/report", post(handlers::report))
        .route("/agent/summarize", post(handlers::summarize))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Starts the API server.
pub async fn serve(state: AppState) -> Result<(), std::io::Error> {
    let addr = state.config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);
    axum::serve(listener, create_router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use diary_agent::testing::ScriptedChatModel;
    use diary_agent::{
        AgentError, EvaluationOutcome, EvaluationRequest, Evaluator, ImageAgent, ImageBackend,
        ModelConfig, QaAnswer, QuestionAnswerer, ReportAgent, Summarizer,
    };
    use diary_agent::HttpReportBackend;
    use diary_orchestrator::Router as DiaryRouter;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeAnswerer {
        calls: AtomicUsize,
        panic: bool,
    }

    #[async_trait]
    impl QuestionAnswerer for FakeAnswerer {
        async fn answer(
            &self,
            _question: &str,
            _user_id: Option<&str>,
            _current_date: Option<&str>,
        ) -> diary_agent::Result<QaAnswer> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic {
                panic!("answerer exploded");
            }
            Ok(QaAnswer {
                response: "파스타를 드셨어요.".into(),
                reference: None,
            })
        }
    }

    #[derive(Default)]
    struct BrokenEvaluator {
        calls: AtomicUsize,
        panic: bool,
    }

    #[async_trait]
    impl Evaluator for BrokenEvaluator {
        async fn evaluate(
            &self,
            _request: &EvaluationRequest,
        ) -> diary_agent::Result<EvaluationOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic {
                panic!("judge exploded");
            }
            Err(AgentError::ModelInvocation("judge unavailable".into()))
        }
    }

    struct UnusedImageBackend;

    #[async_trait]
    impl ImageBackend for UnusedImageBackend {
        async fn generate(&self, _p: &str, _n: &str, _seed: u32) -> diary_agent::Result<String> {
            Err(AgentError::backend("image", "not available in tests"))
        }

        async fn upload(&self, _key: &str, _png: Vec<u8>) -> diary_agent::Result<()> {
            Err(AgentError::backend("object store", "not available in tests"))
        }
    }

    struct Fixture {
        answerer: Arc<FakeAnswerer>,
        evaluator: Option<Arc<BrokenEvaluator>>,
        secondary: ScriptedChatModel,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                answerer: Arc::new(FakeAnswerer::default()),
                evaluator: None,
                secondary: ScriptedChatModel::new(),
            }
        }

        fn server(self) -> TestServer {
            let secondary = Arc::new(self.secondary);
            let config = ModelConfig::new("test-model");
            let mut router = DiaryRouter::new(
                self.answerer,
                Arc::new(ScriptedChatModel::new()),
                config.clone(),
            );
            if let Some(evaluator) = self.evaluator {
                router = router.with_evaluator(evaluator);
            }
            let images = ImageAgent::new(
                secondary.clone(),
                config.clone(),
                Arc::new(UnusedImageBackend),
                "bucket",
                "us-east-1",
            );
            let backend = HttpReportBackend::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
            let reports = ReportAgent::new(secondary.clone(), config.clone(), Arc::new(backend));
            let summarizer = Summarizer::new(secondary, config);

            let state = AppState::new(ApiConfig::default(), router, images, reports, summarizer);
            TestServer::new(create_router(state)).unwrap()
        }
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let server = Fixture::new().server();

        for path in ["/health", "/agent/health"] {
            let response = server.get(path).await;
            response.assert_status_ok();
            let body: Value = response.json();
            assert_eq!(body["status"], "ok");
            assert!(!body["version"].as_str().unwrap().is_empty());
            assert!(body["uptime_seconds"].is_u64());
        }
    }

    #[tokio::test]
    async fn test_agent_stores_statement() {
        let fixture = Fixture::new();
        let answerer = fixture.answerer.clone();
        let server = fixture.server();

        let response = server
            .post("/agent")
            .json(&json!({"content": "오늘 점심에 파스타를 먹었다", "user_id": "u1"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"type": "data", "content": "", "message": "saved"}));
        assert_eq!(answerer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_agent_answers_question_via_alias() {
        let fixture = Fixture::new();
        let answerer = fixture.answerer.clone();
        let server = fixture.server();

        let response = server
            .post("/agent")
            .json(&json!({"inputText": "오늘 점심 뭐 먹었어?", "current_date": "2024-05-01"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "type": "answer",
            "content": "파스타를 드셨어요.",
            "message": "answered"
        }));
        assert_eq!(answerer.calls.load(Ordering::SeqCst), 1);
    }

    async fn assert_answer_survives_evaluator(evaluator: BrokenEvaluator) {
        let evaluator = Arc::new(evaluator);
        let mut fixture = Fixture::new();
        fixture.evaluator = Some(evaluator.clone());
        let server = fixture.server();

        let response = server
            .post("/agent")
            .json(&json!({"content": "오늘 점심 뭐 먹었어?", "user_id": "u1"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "type": "answer",
            "content": "파스타를 드셨어요.",
            "message": "answered"
        }));

        for _ in 0..100 {
            if evaluator.calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(evaluator.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_evaluator_keeps_answer_status() {
        assert_answer_survives_evaluator(BrokenEvaluator::default()).await;
    }

    #[tokio::test]
    async fn test_panicking_evaluator_keeps_answer_status() {
        assert_answer_survives_evaluator(BrokenEvaluator {
            panic: true,
            ..Default::default()
        })
        .await;
    }

    #[tokio::test]
    async fn test_agent_whitespace_input_is_saved() {
        let server = Fixture::new().server();

        let response = server.post("/agent").json(&json!({"content": "   "})).await;
        response.assert_status_ok();
        response.assert_json(&json!({"type": "data", "content": "", "message": "saved"}));
    }

    #[tokio::test]
    async fn test_agent_missing_input() {
        let server = Fixture::new().server();

        let response = server.post("/agent").json(&json!({"user_id": "u1"})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({"type": "error", "content": "", "message": "input required"}));

        let response = server.post("/agent").text("not json").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_agent_panic_maps_to_500() {
        let mut fixture = Fixture::new();
        fixture.answerer = Arc::new(FakeAnswerer {
            panic: true,
            ..Default::default()
        });
        let server = fixture.server();

        let response = server.post("/agent").json(&json!({"content": "왜 그랬을까?"})).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = response.json();
        assert_eq!(body["type"], "error");
        assert_eq!(body["content"], "");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("processing failed: "));
    }

    #[tokio::test]
    async fn test_summarize_endpoint() {
        let mut fixture = Fixture::new();
        fixture.secondary = ScriptedChatModel::new().then_text("오늘은 공원을 산책했다.");
        let server = fixture.server();

        let response = server
            .post("/agent/summarize")
            .json(&json!({"content": "공원 산책", "temperature": 0.2}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"response": "오늘은 공원을 산책했다."}));
    }

    #[tokio::test]
    async fn test_summarize_failure_envelope() {
        let mut fixture = Fixture::new();
        fixture.secondary = ScriptedChatModel::new().then_error("throttled");
        let server = fixture.server();

        let response = server.post("/agent/summarize").json(&json!({"content": "메모"})).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({
            "success": false,
            "error": "summarize failed: model invocation failed: throttled"
        }));
    }

    #[tokio::test]
    async fn test_report_endpoint() {
        let mut fixture = Fixture::new();
        fixture.secondary = ScriptedChatModel::new().then_text("최근 리포트가 없습니다.");
        let server = fixture.server();

        let response = server
            .post("/agent/report")
            .json(&json!({"request": "리포트 목록 보여줘", "user_id": "u1", "report_id": "3"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"success": true, "response": "최근 리포트가 없습니다."}));
    }

    #[tokio::test]
    async fn test_image_endpoint_relays_payload() {
        let mut fixture = Fixture::new();
        fixture.secondary = ScriptedChatModel::new().then_text("어떤 이미지를 원하세요?");
        let server = fixture.server();

        let response = server.post("/agent/image").json(&json!({"content": "이미지"})).await;

        response.assert_status_ok();
        response.assert_json(&json!({"success": true, "response": "어떤 이미지를 원하세요?"}));
    }

    #[tokio::test]
    async fn test_secondary_endpoints_require_content() {
        let server = Fixture::new().server();

        for path in ["/agent/image", "/agent/report", "/agent/summarize"] {
            let response = server.post(path).json(&json!({"user_id": "u1"})).await;
            response.assert_status(StatusCode::BAD_REQUEST);
            response.assert_json(&json!({"success": false, "error": "request content required"}));
        }
    }
}
