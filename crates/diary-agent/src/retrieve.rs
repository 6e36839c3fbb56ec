//! Knowledge base retrieval and the `retrieve` tool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use diary_core::KnowledgeBaseConfig;

use crate::error::{AgentError, Result};
use crate::history::ContentBlock;
use crate::tool::{optional_i64, optional_str, required_str, Tool, ToolDefinition, ToolOutput};

/// Name of the retrieval tool offered to the model.
pub const RETRIEVE_TOOL: &str = "retrieve";

/// A passage returned by the knowledge base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Passage text.
    pub text: String,
    /// Similarity score, when reported.
    #[serde(default)]
    pub score: Option<f64>,
    /// Source location, when reported.
    #[serde(default)]
    pub source: Option<String>,
}

/// Searches a knowledge base of diary entries.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `limit` passages relevant to `query`, restricted to
    /// `user_id` when given.
    async fn retrieve(
        &self,
        query: &str,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>>;
}

/// Stand-in used when no retrieval endpoint is configured. Every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredRetriever;

#[async_trait]
impl Retriever for UnconfiguredRetriever {
    async fn retrieve(
        &self,
        _query: &str,
        _user_id: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        Err(AgentError::Configuration(
            "no retrieval endpoint configured".into(),
        ))
    }
}

/// Retriever backed by an HTTP retrieval endpoint.
///
/// The request body follows the knowledge-base `Retrieve` contract:
/// `knowledgeBaseId`, `retrievalQuery.text` and a vector search configuration
/// with an optional `user_id` equality filter.
pub struct HttpRetriever {
    client: reqwest::Client,
    url: String,
    knowledge_base_id: String,
}

impl HttpRetriever {
    /// Create a retriever for the given endpoint and knowledge base.
    pub fn new(url: impl Into<String>, knowledge_base_id: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            knowledge_base_id: knowledge_base_id.into(),
        })
    }

    /// Create a retriever from configuration. Fails when no endpoint is set.
    pub fn from_config(config: &KnowledgeBaseConfig, timeout: Duration) -> Result<Self> {
        let url = config
            .retrieval_url
            .clone()
            .ok_or_else(|| AgentError::Configuration("RETRIEVAL_API_URL is not set".into()))?;
        Self::new(url, &config.id, timeout)
    }
}

#[derive(Deserialize)]
struct RetrieveResponse {
    #[serde(default, rename = "retrievalResults")]
    retrieval_results: Vec<RetrievalResult>,
}

#[derive(Deserialize)]
struct RetrievalResult {
    #[serde(default)]
    content: Option<RetrievalContent>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    location: Option<Value>,
}

#[derive(Deserialize)]
struct RetrievalContent {
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(
        &self,
        query: &str,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<RetrievedPassage>> {
        let mut search = json!({ "numberOfResults": limit });
        if let Some(user_id) = user_id {
            search["filter"] = json!({ "equals": { "key": "user_id", "value": user_id } });
        }
        let body = json!({
            "knowledgeBaseId": self.knowledge_base_id,
            "retrievalQuery": { "text": query },
            "retrievalConfiguration": { "vectorSearchConfiguration": search },
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::backend("retrieval", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::backend("retrieval", format!("{}: {}", status, text)));
        }

        let parsed: RetrieveResponse = response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParse(format!("retrieval response: {}", e)))?;

        let passages: Vec<RetrievedPassage> = parsed
            .retrieval_results
            .into_iter()
            .filter_map(|r| {
                let text = r.content.and_then(|c| c.text)?;
                Some(RetrievedPassage {
                    text,
                    score: r.score,
                    source: r.location.map(|l| l.to_string()),
                })
            })
            .collect();

        debug!(count = passages.len(), "Retrieved passages");
        Ok(passages)
    }
}

/// Tool exposing a [`Retriever`] to the model.
///
/// The user id of the current request is bound at construction, so a model
/// cannot widen the search to other users' entries.
pub struct RetrieveTool {
    retriever: Arc<dyn Retriever>,
    user_id: Option<String>,
    default_limit: usize,
}

impl RetrieveTool {
    /// Create a retrieve tool scoped to `user_id`.
    pub fn new(retriever: Arc<dyn Retriever>, user_id: Option<String>, default_limit: usize) -> Self {
        Self {
            retriever,
            user_id,
            default_limit,
        }
    }
}

#[async_trait]
impl Tool for RetrieveTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            RETRIEVE_TOOL,
            "Search the user's diary knowledge base for passages relevant to a query",
            json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "Search query, including dates when relevant"
                    },
                    "numberOfResults": {
                        "type": "integer",
                        "description": "Maximum number of passages to return"
                    }
                },
                "required": ["text"]
            }),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<ToolOutput> {
        let query = required_str(RETRIEVE_TOOL, arguments, "text")
            .or_else(|_| required_str(RETRIEVE_TOOL, arguments, "query"))?;
        let limit = optional_i64(arguments, "numberOfResults")
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(self.default_limit);

        let user_id = self
            .user_id
            .as_deref()
            .or_else(|| optional_str(arguments, "user_id"));

        info!(query = %diary_core::preview(query, 50), limit, "Retrieving diary passages");
        let passages = self.retriever.retrieve(query, user_id, limit).await?;

        if passages.is_empty() {
            return Ok(ToolOutput::text("No results found."));
        }

        Ok(ToolOutput::blocks(
            passages
                .into_iter()
                .map(|p| ContentBlock::Text(p.text))
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingRetriever {
        passages: Vec<RetrievedPassage>,
        calls: Mutex<Vec<(String, Option<String>, usize)>>,
    }

    #[async_trait]
    impl Retriever for RecordingRetriever {
        async fn retrieve(
            &self,
            query: &str,
            user_id: Option<&str>,
            limit: usize,
        ) -> Result<Vec<RetrievedPassage>> {
            self.calls
                .lock()
                .unwrap()
                .push((query.to_string(), user_id.map(String::from), limit));
            Ok(self.passages.clone())
        }
    }

    #[tokio::test]
    async fn test_unconfigured_retriever_fails() {
        let err = UnconfiguredRetriever.retrieve("q", None, 3).await.unwrap_err();
        assert!(matches!(err, AgentError::Configuration(_)));
    }

    fn passage(text: &str) -> RetrievedPassage {
        RetrievedPassage {
            text: text.into(),
            score: Some(0.8),
            source: None,
        }
    }

    #[tokio::test]
    async fn test_tool_binds_request_user() {
        let retriever = Arc::new(RecordingRetriever {
            passages: vec![passage("5월 1일: 맑음"), passage("5월 2일: 비")],
            ..Default::default()
        });
        let tool = RetrieveTool::new(retriever.clone(), Some("user-1".into()), 5);

        let output = tool
            .call(&json!({"text": "날씨", "user_id": "someone-else", "numberOfResults": 3}))
            .await
            .unwrap();

        assert_eq!(output.blocks.len(), 2);
        let calls = retriever.calls.lock().unwrap();
        assert_eq!(calls[0], ("날씨".to_string(), Some("user-1".to_string()), 3));
    }

    #[tokio::test]
    async fn test_tool_empty_results() {
        let retriever = Arc::new(RecordingRetriever::default());
        let tool = RetrieveTool::new(retriever, None, 5);

        let output = tool.call(&json!({"query": "점심"})).await.unwrap();
        assert_eq!(output.to_model_text(), "No results found.");
    }

    #[tokio::test]
    async fn test_tool_requires_query() {
        let tool = RetrieveTool::new(Arc::new(RecordingRetriever::default()), None, 5);
        assert!(tool.call(&json!({})).await.is_err());
    }

    #[test]
    fn test_from_config_requires_url() {
        let config = diary_core::AppConfig::default().knowledge_base;
        assert!(HttpRetriever::from_config(&config, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn test_retrieve_response_parsing() {
        let parsed: RetrieveResponse = serde_json::from_value(json!({
            "retrievalResults": [
                {"content": {"text": "a"}, "score": 0.5},
                {"content": {}},
                {"score": 0.1}
            ]
        }))
        .unwrap();
        assert_eq!(parsed.retrieval_results.len(), 3);
        assert_eq!(
            parsed.retrieval_results[0].content.as_ref().and_then(|c| c.text.as_deref()),
            Some("a")
        );
    }
}
