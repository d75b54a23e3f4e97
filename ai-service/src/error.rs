//! Failure taxonomy for description generation and its HTTP translation.

use crate::services::providers::ProviderError;
use service_core::error::AppError;
use thiserror::Error;

/// Returned to the caller when the provider rejects the API key.
pub const CREDENTIAL_GUIDANCE: &str = "Invalid or missing Gemini API key. Please set a valid GEMINI_API_KEY environment variable. Get your API key at: https://makersuite.google.com/app/apikey";

/// Returned to the caller when no model could serve the request.
pub const MODEL_UNAVAILABLE_MESSAGE: &str = "Could not generate description with any available model. Please check your API key has access to Gemini models.";

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("Provider rejected the API key: {message}")]
    CredentialRejected { model: String, message: String },

    #[error(
        "No generative model available (tried: [{}]){}",
        .attempted.join(", "),
        .last_error.as_ref().map(|e| format!("; last error: {}", e)).unwrap_or_default()
    )]
    ModelUnavailable {
        attempted: Vec<String>,
        last_error: Option<String>,
    },

    #[error("Unexpected response format from provider: {0}")]
    ResponseFormat(String),

    #[error("Empty response from provider: {0}")]
    EmptyResponse(String),

    #[error("{source}")]
    Provider {
        model: String,
        #[source]
        source: ProviderError,
    },
}

impl DescriptionError {
    /// Short label used for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            DescriptionError::CredentialRejected { .. } => "credential_rejected",
            DescriptionError::ModelUnavailable { .. } => "model_unavailable",
            DescriptionError::ResponseFormat(_) | DescriptionError::EmptyResponse(_) => {
                "bad_response"
            }
            DescriptionError::Provider { .. } => "provider_error",
        }
    }

    /// Model the failure is attributed to, if any. For an exhausted cascade
    /// this is the last model tried.
    pub fn model(&self) -> Option<&str> {
        match self {
            DescriptionError::CredentialRejected { model, .. }
            | DescriptionError::Provider { model, .. } => Some(model),
            DescriptionError::ModelUnavailable { attempted, .. } => {
                attempted.last().map(String::as_str)
            }
            DescriptionError::ResponseFormat(_) | DescriptionError::EmptyResponse(_) => None,
        }
    }

    /// Wrap a failed call to `model`, lifting credential rejection out of the
    /// provider error.
    pub fn from_provider(model: impl Into<String>, err: ProviderError) -> Self {
        let model = model.into();
        match err {
            ProviderError::CredentialRejected(message) => {
                DescriptionError::CredentialRejected { model, message }
            }
            source => DescriptionError::Provider { model, source },
        }
    }
}

impl From<DescriptionError> for AppError {
    fn from(err: DescriptionError) -> Self {
        match err {
            DescriptionError::CredentialRejected { .. } => {
                AppError::Unauthorized(anyhow::anyhow!(CREDENTIAL_GUIDANCE))
            }
            DescriptionError::ModelUnavailable { .. } => AppError::DependencyError {
                message: MODEL_UNAVAILABLE_MESSAGE.to_string(),
                details: Some(err.to_string()),
            },
            DescriptionError::ResponseFormat(_) | DescriptionError::EmptyResponse(_) => {
                AppError::DependencyError {
                    message: "Could not read a description from the AI provider response"
                        .to_string(),
                    details: Some(err.to_string()),
                }
            }
            DescriptionError::Provider { source, .. } => {
                AppError::InternalError(anyhow::anyhow!("Error generating description: {}", source))
            }
        }
    }
}
