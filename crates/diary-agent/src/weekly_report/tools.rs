//! Report tools, one per backend operation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};

use super::backend::ReportBackend;
use crate::error::{AgentError, Result};
use crate::tool::{optional_i64, required_str, Tool, ToolDefinition, ToolOutput};

/// Reports listed when no limit is given.
pub const DEFAULT_REPORT_LIMIT: u32 = 10;

/// The report operations exposed as tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportToolKind {
    /// `get_user_info`
    UserInfo,
    /// `get_diary_entries`
    DiaryEntries,
    /// `get_report_list`
    ReportList,
    /// `get_report_detail`
    ReportDetail,
    /// `create_report`
    CreateReport,
    /// `check_report_status`
    ReportStatus,
}

impl ReportToolKind {
    /// Every kind, in the order offered to the model.
    pub const ALL: [ReportToolKind; 6] = [
        Self::UserInfo,
        Self::DiaryEntries,
        Self::ReportList,
        Self::ReportDetail,
        Self::CreateReport,
        Self::ReportStatus,
    ];

    /// Tool name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserInfo => "get_user_info",
            Self::DiaryEntries => "get_diary_entries",
            Self::ReportList => "get_report_list",
            Self::ReportDetail => "get_report_detail",
            Self::CreateReport => "create_report",
            Self::ReportStatus => "check_report_status",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Self::UserInfo => "Get user information by user_id",
            Self::DiaryEntries => "Get diary entries for a date range",
            Self::ReportList => "Get the list of the user's reports",
            Self::ReportDetail => "Get a detailed report by report_id",
            Self::CreateReport => "Create a new weekly report for a date range",
            Self::ReportStatus => "Check report generation status",
        }
    }

    fn parameters(&self) -> Value {
        let user = json!({ "type": "string", "description": "User id" });
        let date = |what: &str| json!({ "type": "string", "description": format!("{} (YYYY-MM-DD)", what) });
        let report = json!({ "type": "integer", "description": "Report id" });

        match self {
            Self::UserInfo => json!({
                "type": "object",
                "properties": { "user_id": user },
                "required": ["user_id"]
            }),
            Self::DiaryEntries | Self::CreateReport => json!({
                "type": "object",
                "properties": {
                    "user_id": user,
                    "start_date": date("Start date"),
                    "end_date": date("End date")
                },
                "required": ["user_id", "start_date", "end_date"]
            }),
            Self::ReportList => json!({
                "type": "object",
                "properties": {
                    "user_id": user,
                    "limit": { "type": "integer", "description": "Number of reports (default 10)" }
                },
                "required": ["user_id"]
            }),
            Self::ReportDetail | Self::ReportStatus => json!({
                "type": "object",
                "properties": { "report_id": report, "user_id": user },
                "required": ["report_id", "user_id"]
            }),
        }
    }
}

/// A report operation bound to a backend.
pub struct ReportTool {
    kind: ReportToolKind,
    backend: Arc<dyn ReportBackend>,
}

impl ReportTool {
    /// Create a tool for `kind`.
    pub fn new(kind: ReportToolKind, backend: Arc<dyn ReportBackend>) -> Self {
        Self { kind, backend }
    }
}

fn date_arg<'a>(tool: &str, arguments: &'a Value, key: &str) -> Result<&'a str> {
    let raw = required_str(tool, arguments, key)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AgentError::invalid_arguments(tool, format!("`{}` must be YYYY-MM-DD", key)))?;
    Ok(raw)
}

fn report_id_arg(tool: &str, arguments: &Value) -> Result<i64> {
    optional_i64(arguments, "report_id")
        .ok_or_else(|| AgentError::invalid_arguments(tool, "missing `report_id`"))
}

#[async_trait]
impl Tool for ReportTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.kind.name(),
            self.kind.description(),
            self.kind.parameters(),
        )
    }

    async fn call(&self, arguments: &Value) -> Result<ToolOutput> {
        let name = self.kind.name();
        let user_id = required_str(name, arguments, "user_id")?;

        let value = match self.kind {
            ReportToolKind::UserInfo => self.backend.get_user_info(user_id).await?,
            ReportToolKind::DiaryEntries => {
                let start = date_arg(name, arguments, "start_date")?;
                let end = date_arg(name, arguments, "end_date")?;
                self.backend.get_diary_entries(user_id, start, end).await?
            }
            ReportToolKind::ReportList => {
                let limit = optional_i64(arguments, "limit")
                    .and_then(|n| u32::try_from(n).ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(DEFAULT_REPORT_LIMIT);
                self.backend.get_report_list(user_id, limit).await?
            }
            ReportToolKind::ReportDetail => {
                let report_id = report_id_arg(name, arguments)?;
                self.backend.get_report_detail(report_id, user_id).await?
            }
            ReportToolKind::CreateReport => {
                let start = date_arg(name, arguments, "start_date")?;
                let end = date_arg(name, arguments, "end_date")?;
                self.backend.create_report(user_id, start, end).await?
            }
            ReportToolKind::ReportStatus => {
                let report_id = report_id_arg(name, arguments)?;
                self.backend.check_report_status(report_id, user_id).await?
            }
        };

        Ok(ToolOutput::json(value))
    }
}
