//! Hosted classifier configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default OpenAI-compatible chat completions endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Default completion model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Hosted LLM settings
///
/// The hosted classifier is only used when `api_key` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; `None` selects the rule classifier
    pub api_key: Option<String>,
    /// Chat completions endpoint
    pub endpoint: String,
    /// Model name
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
    /// Completion length cap
    pub max_tokens: u32,
}

impl LlmConfig {
    /// Create default configuration (no key, rules only)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With API key; blank keys count as absent
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.api_key = (!key.trim().is_empty()).then_some(key);
        self
    }

    /// With endpoint
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// With model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a usable key is configured
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(20),
            max_tokens: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_disables_hosted_classifier() {
        assert!(!LlmConfig::new().is_enabled());
        assert!(!LlmConfig::new().with_api_key("  ").is_enabled());
        assert!(LlmConfig::new().with_api_key("sk-test").is_enabled());
    }
}
