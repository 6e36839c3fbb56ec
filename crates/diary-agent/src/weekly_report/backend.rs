//! Report service backend.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use diary_core::ReportConfig;

use crate::error::{AgentError, Result};

/// Access to users, diary entries and weekly reports.
#[async_trait]
pub trait ReportBackend: Send + Sync {
    /// Profile of a user.
    async fn get_user_info(&self, user_id: &str) -> Result<Value>;

    /// Diary entries between two `YYYY-MM-DD` dates, inclusive.
    async fn get_diary_entries(&self, user_id: &str, start_date: &str, end_date: &str) -> Result<Value>;

    /// Most recent reports of a user.
    async fn get_report_list(&self, user_id: &str, limit: u32) -> Result<Value>;

    /// One report with its analysis.
    async fn get_report_detail(&self, report_id: i64, user_id: &str) -> Result<Value>;

    /// Start generating a report for a period.
    async fn create_report(&self, user_id: &str, start_date: &str, end_date: &str) -> Result<Value>;

    /// Generation status of a report.
    async fn check_report_status(&self, report_id: i64, user_id: &str) -> Result<Value>;
}

/// REST client for the report service.
///
/// Routes are rooted at `/users/{user_id}`: the profile itself,
/// `/diaries?start_date&end_date`, `/reports?limit`, `/reports/{id}` and
/// `/reports/{id}/status`. Reports are created with `POST /reports`.
pub struct HttpReportBackend {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpReportBackend {
    /// Create a client for `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Self::build(Some(base_url), timeout)
    }

    /// Create a client from configuration. Without an API URL every call
    /// fails with a configuration error.
    pub fn from_config(config: &ReportConfig, timeout: Duration) -> Result<Self> {
        Self::build(config.api_url.as_deref(), timeout)
    }

    fn build(base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    fn user_url(&self, user_id: &str, path: &str) -> Result<String> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| AgentError::Configuration("REPORT_API_URL is not set".into()))?;
        Ok(format!("{}/users/{}{}", base, user_id, path))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .send()
            .await
            .map_err(|e| AgentError::backend("report", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AgentError::backend("report", format!("{}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| AgentError::ResponseParse(format!("report response: {}", e)))
    }

    async fn get(&self, url: String, query: &[(&str, String)]) -> Result<Value> {
        debug!(url = %url, "Report backend GET");
        self.send(self.client.get(url).query(query)).await
    }
}

#[async_trait]
impl ReportBackend for HttpReportBackend {
    async fn get_user_info(&self, user_id: &str) -> Result<Value> {
        self.get(self.user_url(user_id, "")?, &[]).await
    }

    async fn get_diary_entries(&self, user_id: &str, start_date: &str, end_date: &str) -> Result<Value> {
        self.get(
            self.user_url(user_id, "/diaries")?,
            &[
                ("start_date", start_date.to_string()),
                ("end_date", end_date.to_string()),
            ],
        )
        .await
    }

    async fn get_report_list(&self, user_id: &str, limit: u32) -> Result<Value> {
        self.get(
            self.user_url(user_id, "/reports")?,
            &[("limit", limit.to_string())],
        )
        .await
    }

    async fn get_report_detail(&self, report_id: i64, user_id: &str) -> Result<Value> {
        self.get(self.user_url(user_id, &format!("/reports/{}", report_id))?, &[])
            .await
    }

    async fn create_report(&self, user_id: &str, start_date: &str, end_date: &str) -> Result<Value> {
        let url = self.user_url(user_id, "/reports")?;
        debug!(url = %url, "Report backend POST");
        self.send(
            self.client
                .post(url)
                .json(&json!({ "start_date": start_date, "end_date": end_date })),
        )
        .await
    }

    async fn check_report_status(&self, report_id: i64, user_id: &str) -> Result<Value> {
        self.get(
            self.user_url(user_id, &format!("/reports/{}/status", report_id))?,
            &[],
        )
        .await
    }
}
