//! Chat model backends for flavor text.
//!
//! [`LlmBackend`] is a closed enum so the client can await it without boxing.
//! [`HttpBackend`] talks to either wire dialect named by [`BackendType`];
//! the `Fixed` variant never leaves the process.

use reqwest::RequestBuilder;
use serde_json::Value;

use crate::config::{BackendType, LlmBackendConfig};
use crate::error::FlavorError;
use crate::prompt::RenderedPrompt;

/// Upper bound on generated tokens; flavor text is always short.
const MAX_TOKENS: u32 = 256;

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Where a prompt goes to become text.
#[derive(Debug)]
pub enum LlmBackend {
    /// A remote chat model.
    Http(HttpBackend),
    /// Answers every prompt with this text. Used offline and in tests.
    Fixed(String),
}

impl LlmBackend {
    /// Ask the backend for one completion.
    ///
    /// # Errors
    ///
    /// Returns [`FlavorError::Backend`] when the request fails, the server
    /// answers with a non-success status, or the body carries no text.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, FlavorError> {
        match self {
            Self::Http(backend) => backend.complete(prompt).await,
            Self::Fixed(text) => Ok(text.clone()),
        }
    }

    /// Short label for log fields.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Http(backend) => backend.dialect.label(),
            Self::Fixed(_) => "fixed",
        }
    }
}

impl BackendType {
    const fn label(self) -> &'static str {
        match self {
            Self::OpenAi => "openai-compatible",
            Self::Anthropic => "anthropic",
        }
    }

    /// JSON pointer to the generated text in a response body.
    const fn text_pointer(self) -> &'static str {
        match self {
            Self::OpenAi => "/choices/0/message/content",
            Self::Anthropic => "/content/0/text",
        }
    }
}

/// A chat model reached over HTTPS.
#[derive(Debug)]
pub struct HttpBackend {
    dialect: BackendType,
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl HttpBackend {
    /// Build a backend for `config`. The HTTP client enforces the
    /// configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FlavorError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &LlmBackendConfig) -> Result<Self, FlavorError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FlavorError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            dialect: config.backend_type,
            client,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn request(&self, prompt: &RenderedPrompt) -> RequestBuilder {
        match self.dialect {
            BackendType::OpenAi => self
                .client
                .post(format!("{}/chat/completions", self.api_url))
                .bearer_auth(&self.api_key)
                .json(&serde_json::json!({
                    "model": self.model,
                    "max_tokens": MAX_TOKENS,
                    "temperature": 0.9,
                    "response_format": {"type": "json_object"},
                    "messages": [
                        {"role": "system", "content": prompt.system},
                        {"role": "user", "content": prompt.user},
                    ],
                })),
            BackendType::Anthropic => self
                .client
                .post(format!("{}/messages", self.api_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&serde_json::json!({
                    "model": self.model,
                    "max_tokens": MAX_TOKENS,
                    "system": prompt.system,
                    "messages": [{"role": "user", "content": prompt.user}],
                })),
        }
    }

    async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, FlavorError> {
        let label = self.dialect.label();
        let response = self
            .request(prompt)
            .send()
            .await
            .map_err(|e| FlavorError::Backend(format!("{label}: request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_read_err| String::from("<unreadable body>"));
            return Err(FlavorError::Backend(format!("{label}: HTTP {status}: {detail}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| FlavorError::Backend(format!("{label}: body is not JSON: {e}")))?;
        completion_text(self.dialect, &body)
    }
}

/// Pull the generated text out of a response body.
fn completion_text(dialect: BackendType, body: &Value) -> Result<String, FlavorError> {
    let pointer = dialect.text_pointer();
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            FlavorError::Backend(format!("{}: no text at {pointer}", dialect.label()))
        })
}

/// Build the backend named in `config`.
///
/// # Errors
///
/// Returns [`FlavorError::Config`] if the HTTP client cannot be built.
pub fn create_backend(config: &LlmBackendConfig) -> Result<LlmBackend, FlavorError> {
    HttpBackend::new(config).map(LlmBackend::Http)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn config(backend_type: BackendType) -> LlmBackendConfig {
        LlmBackendConfig {
            backend_type,
            api_url: "https://llm.example.com/v1/".to_owned(),
            api_key: "test".to_owned(),
            model: "test-model".to_owned(),
            request_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn chat_completion_text_is_found() {
        let body = serde_json::json!({
            "choices": [{
                "message": {"content": "{\"headline\": \"Parks bloom downtown\"}"}
            }]
        });
        let text = completion_text(BackendType::OpenAi, &body);
        assert!(text.unwrap_or_default().contains("Parks bloom"));
    }

    #[test]
    fn error_body_has_no_text() {
        let body = serde_json::json!({"error": "rate_limit"});
        assert!(completion_text(BackendType::OpenAi, &body).is_err());
        assert!(completion_text(BackendType::Anthropic, &body).is_err());
    }

    #[test]
    fn messages_text_is_found() {
        let body = serde_json::json!({
            "content": [{"type": "text", "text": "{\"description\": \"A tidy shop\"}"}]
        });
        assert!(
            completion_text(BackendType::Anthropic, &body)
                .unwrap_or_default()
                .contains("tidy shop")
        );
        assert!(completion_text(BackendType::Anthropic, &serde_json::json!({"content": []})).is_err());
    }

    #[test]
    fn backend_follows_configured_dialect() {
        let openai = create_backend(&config(BackendType::OpenAi)).map(|b| b.name());
        assert_eq!(openai.ok(), Some("openai-compatible"));
        let anthropic = create_backend(&config(BackendType::Anthropic)).map(|b| b.name());
        assert_eq!(anthropic.ok(), Some("anthropic"));
    }

    #[test]
    fn trailing_slash_is_dropped_from_api_url() {
        let backend = HttpBackend::new(&config(BackendType::OpenAi));
        assert_eq!(
            backend.map(|b| b.api_url).ok().as_deref(),
            Some("https://llm.example.com/v1")
        );
    }

    #[tokio::test]
    async fn fixed_backend_echoes_its_text() {
        let backend = LlmBackend::Fixed("{\"headline\": \"hi\"}".to_owned());
        let prompt = RenderedPrompt {
            system: String::new(),
            user: String::new(),
        };
        assert_eq!(
            backend.complete(&prompt).await.unwrap_or_default(),
            "{\"headline\": \"hi\"}"
        );
    }
}
