//! REST API for the diary gateway.
//!
//! This crate exposes the orchestration router and the secondary agents over
//! HTTP:
//! - `POST /agent`: store diary data or answer a question
//! - `POST /agent/image`, `/agent/report`, `/agent/summarize`
//! - `GET /health`, `GET /agent/health`
//!
//! # Example
//!
//! ```ignore
//! use diary_api::{serve, ApiConfig, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let state = AppState::new(ApiConfig::default(), router, images, reports, summarizer);
//!     serve(state).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
pub mod types;

pub use config::ApiConfig;
pub use error::{ApiError, Result};
pub use router::{create_router, serve};
pub use state::AppState;
