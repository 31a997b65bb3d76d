//! Run configuration
//!
//! Configuration is an explicit value built once at startup and passed
//! into the pipeline constructor; nothing reads process-global state
//! after that point, so every run can be configured independently.

use serde::{Deserialize, Serialize};

/// Vision model backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// API key for bearer auth (may be empty for local backends)
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API, without a trailing route
    pub base_url: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Seed forwarded to backends that support reproducible replies
    pub seed: u64,

    /// Per-call request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.0,
            seed: 12345,
            timeout_secs: 120,
        }
    }
}

impl LlmConfig {
    /// Build a config from `OPENAI_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            ..Self::default()
        }
    }
}

/// Configuration for one analysis run
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Seconds between sampled video frames
    pub interval_secs: f64,

    /// Vision model backend settings
    pub llm: LlmConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 1.0,
            llm: LlmConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_openai() {
        let config = LlmConfig::default();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.seed, 12345);
    }

    #[test]
    fn analyzer_default_interval_is_one_second() {
        assert_eq!(AnalyzerConfig::default().interval_secs, 1.0);
    }
}
