//! Generative AI provider abstraction and implementations.
//!
//! The model client only talks to providers through [`GenerativeProvider`],
//! so Gemini can be swapped for the scriptable mock in tests.

pub mod gemini;
pub mod mock;

use crate::services::response::RawResponse;
use async_trait::async_trait;
use thiserror::Error;

/// Normalized provider failure kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The model identifier is unknown or no longer accessible.
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Credential rejected: {0}")]
    CredentialRejected(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid model identifier: {0}")]
    InvalidModel(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }

    pub fn is_credential_rejected(&self) -> bool {
        matches!(self, ProviderError::CredentialRejected(_))
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::NotFound(_) => "not_found",
            ProviderError::CredentialRejected(_) => "credential_rejected",
            ProviderError::RateLimited(_) => "rate_limited",
            ProviderError::NetworkError(_) => "network",
            ProviderError::ApiError { .. } => "api",
            ProviderError::InvalidModel(_) => "invalid_model",
        }
    }
}

/// A model as reported by the provider's model listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Full resource name, e.g. `models/gemini-1.5-flash`.
    pub name: String,
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, methods: &[&str]) -> Self {
        Self {
            name: name.into(),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|m| m == "generateContent")
    }

    /// Identifier without the `models/` path, e.g. `gemini-1.5-flash`.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// An initialized client binding to a single provider model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    model_id: String,
}

impl ModelHandle {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Trait for text generation providers (e.g., Gemini).
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Provider name, used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// List every model the configured credential can see.
    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError>;

    /// Bind a handle to `model_id`.
    async fn init_model(&self, model_id: &str) -> Result<ModelHandle, ProviderError>;

    /// Generate content for `prompt` with the given model.
    async fn generate(
        &self,
        model: &ModelHandle,
        prompt: &str,
    ) -> Result<RawResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_name_strips_resource_prefix() {
        assert_eq!(
            ModelInfo::new("models/gemini-1.5-flash", &[]).short_name(),
            "gemini-1.5-flash"
        );
        assert_eq!(ModelInfo::new("gemini-pro", &[]).short_name(), "gemini-pro");
    }

    #[test]
    fn generate_content_support_is_detected() {
        let embedding = ModelInfo::new("models/embedding-001", &["embedContent"]);
        let chat = ModelInfo::new("models/gemini-pro", &["generateContent", "countTokens"]);
        assert!(!embedding.supports_generate_content());
        assert!(chat.supports_generate_content());
    }
}
