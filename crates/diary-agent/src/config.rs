//! Model configuration for agent chat calls.

use serde::{Deserialize, Serialize};

/// Model configuration for an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier (e.g., "anthropic/claude-sonnet-4.5").
    pub model: String,

    /// Maximum tokens to generate in responses.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for response generation (0.0 to 1.0).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Optional top-k sampling cutoff, for providers that accept it.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub top_k: Option<u32>,
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: diary_core::config::DEFAULT_CLAUDE_MODEL.into(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_k: None,
        }
    }
}

impl ModelConfig {
    /// Create a new model configuration with the given model ID.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set the maximum tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature, clamped to `0.0..=1.0`.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }

    /// Set the top-k cutoff.
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = ModelConfig::new("test-model")
            .with_max_tokens(1024)
            .with_temperature(0.2)
            .with_top_k(50);

        assert_eq!(config.model, "test-model");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.top_k, Some(50));
    }

    #[test]
    fn test_temperature_clamped() {
        assert_eq!(ModelConfig::default().with_temperature(1.7).temperature, 1.0);
        assert_eq!(ModelConfig::default().with_temperature(-0.5).temperature, 0.0);
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ModelConfig = serde_json::from_str(r#"{"model": "m"}"#).unwrap();
        assert_eq!(config.max_tokens, 4096);
        assert_eq!(config.temperature, 0.7);
        assert!(config.top_k.is_none());
    }
}
