//! Routing layer for the diary gateway.
//!
//! This crate decides whether a piece of user input is diary data to store or
//! a question to answer, and normalizes whatever the answering side produced
//! into one [`OrchestrationResult`] shape.
//!
//! # Overview
//!
//! - [`classify`]: keyword classifier over a fixed Korean marker lexicon
//! - [`Router`]: data short-circuit, direct or agent-mediated answering, and
//!   background evaluation
//! - [`parse_structured_response`]: tolerant recovery of a result object from
//!   free-form model text
//!
//! # Example
//!
//! ```ignore
//! use diary_orchestrator::Router;
//!
//! let router = Router::new(answerer, model, ModelConfig::new("gpt-4o-mini"))
//!     .with_evaluator(evaluator);
//! let result = router.route("오늘 날씨 어땠어?", Some("user-1"), None).await;
//! assert_eq!(result.message, "answered");
//! ```

mod classifier;
mod error;
mod orchestrator;
mod parser;
mod result;

pub use classifier::{classify, matched_marker, RoutingVerdict, QUESTION_MARKERS};
pub use error::{OrchestratorError, Result};
pub use orchestrator::{Router, QUESTION_TOOL};
pub use parser::parse_structured_response;
pub use result::{OrchestrationResult, ResultType, MESSAGE_ANSWERED, MESSAGE_SAVED};

// Re-export the tool-result extractor used by the agent-mediated strategy.
pub use diary_agent::{
    extract_json_field, extract_reference, extract_response, extract_tool_results, ToolResultEntry,
};
