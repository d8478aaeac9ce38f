//! Error types for the flavor-text client.

/// Errors that can occur while producing flavor text.
#[derive(Debug, thiserror::Error)]
pub enum FlavorError {
    /// No backend is configured; flavor text is switched off.
    #[error("flavor text is disabled")]
    Disabled,

    /// Failed to load or render a prompt template.
    #[error("template error: {0}")]
    Template(String),

    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    Backend(String),

    /// The backend did not answer before the deadline.
    #[error("LLM request timed out after {0} ms")]
    Timeout(u64),

    /// The LLM response could not be parsed into the expected shape.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization of a prompt context failed.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
