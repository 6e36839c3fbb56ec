//! API request handlers.

pub mod agent;
pub mod health;
pub mod image;
pub mod report;
pub mod summarize;

pub use agent::*;
pub use health::*;
pub use image::*;
pub use report::*;
pub use summarize::*;
