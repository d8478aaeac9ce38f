//! Backend configuration for the flavor client.
//!
//! The engine builds an [`LlmBackendConfig`] from the `llm` section of
//! `metacity-config.yaml`; the API key comes from `METACITY_LLM_API_KEY`
//! so it never lands in a config file.

use std::time::Duration;

use crate::error::FlavorError;

/// Environment variable holding the LLM API key.
pub const API_KEY_ENV: &str = "METACITY_LLM_API_KEY";

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Per-request deadline.
    pub request_timeout: Duration,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Chat completions wire format, also spoken by `DeepSeek` and Ollama.
    OpenAi,
    /// Anthropic Messages API.
    Anthropic,
}

impl BackendType {
    /// Parse a backend name as written in config.
    ///
    /// # Errors
    ///
    /// Returns [`FlavorError::Config`] for an unknown name.
    pub fn from_name(name: &str) -> Result<Self, FlavorError> {
        match name.to_lowercase().as_str() {
            "openai" | "deepseek" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(FlavorError::Config(format!("unknown backend type: {other}"))),
        }
    }
}

impl LlmBackendConfig {
    /// Assemble a backend config, reading the API key from
    /// [`API_KEY_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`FlavorError::Config`] if the backend name is unknown or the
    /// API key variable is unset.
    pub fn from_parts(
        backend: &str,
        api_url: &str,
        model: &str,
        request_timeout_ms: u64,
    ) -> Result<Self, FlavorError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|e| FlavorError::Config(format!("missing env var {API_KEY_ENV}: {e}")))?;
        Ok(Self {
            backend_type: BackendType::from_name(backend)?,
            api_url: api_url.trim_end_matches('/').to_owned(),
            api_key,
            model: model.to_owned(),
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_are_case_insensitive() {
        assert_eq!(BackendType::from_name("OpenAI").ok(), Some(BackendType::OpenAi));
        assert_eq!(BackendType::from_name("ollama").ok(), Some(BackendType::OpenAi));
        assert_eq!(
            BackendType::from_name("Claude").ok(),
            Some(BackendType::Anthropic)
        );
        assert!(BackendType::from_name("gemini").is_err());
    }
}
