//! Gemini AI provider implementation.
//!
//! Talks to the Gemini REST API: model listing and `generateContent`.
//! The API key travels in the `x-goog-api-key` header so it never shows up
//! in URLs or request logs.

use super::{GenerativeProvider, ModelHandle, ModelInfo, ProviderError};
use crate::config::GeminiSettings;
use crate::services::response::{GenerateContentResponse, RawResponse};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Page size requested from the model listing endpoint.
const MODEL_PAGE_SIZE: &str = "1000";

/// Stop following `nextPageToken` after this many pages.
const MAX_MODEL_PAGES: usize = 20;

/// Gemini text provider.
pub struct GeminiProvider {
    api_key: Secret<String>,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(settings: &GeminiSettings) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| ProviderError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }

    /// Build the API URL for the given model and method.
    fn method_url(&self, model_id: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model_id, method)
    }

    async fn list_models_page(
        &self,
        page_token: Option<&str>,
    ) -> Result<ListModelsResponse, ProviderError> {
        let mut query = vec![("pageSize", MODEL_PAGE_SIZE)];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response = self
            .client
            .traced_get(&self.models_url())
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .query(&query)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            return Err(classify_api_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| ProviderError::ApiError {
            status: status.as_u16(),
            message: format!("Failed to parse model listing: {}", e),
        })
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let mut models = Vec::new();
        let mut page_token: Option<String> = None;

        for _ in 0..MAX_MODEL_PAGES {
            let page = self.list_models_page(page_token.as_deref()).await?;

            models.extend(page.models.into_iter().map(|m| ModelInfo {
                name: m.name,
                supported_generation_methods: m.supported_generation_methods,
            }));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(count = models.len(), "Listed Gemini models");
        Ok(models)
    }

    async fn init_model(&self, model_id: &str) -> Result<ModelHandle, ProviderError> {
        let id = model_id.trim();
        let id = id.strip_prefix("models/").unwrap_or(id);

        if id.is_empty() || id.contains(char::is_whitespace) || id.contains('/') {
            return Err(ProviderError::InvalidModel(model_id.to_string()));
        }

        Ok(ModelHandle::new(id))
    }

    async fn generate(
        &self,
        model: &ModelHandle,
        prompt: &str,
    ) -> Result<RawResponse, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(
            model = %model.model_id(),
            prompt_len = prompt.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .traced_post(&self.method_url(model.model_id(), "generateContent"))
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.text().await.map_err(network_error)?;

        if !status.is_success() {
            return Err(classify_api_error(status, &body));
        }

        Ok(match serde_json::from_str::<GenerateContentResponse>(&body) {
            Ok(parsed) => RawResponse::Structured(parsed),
            Err(_) => RawResponse::Rendered(body),
        })
    }
}

fn network_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::NetworkError(format!("Request to Gemini API timed out: {}", e))
    } else {
        ProviderError::NetworkError(e.to_string())
    }
}

/// Map a failed Gemini HTTP response onto a provider error kind.
///
/// Gemini reports a bad key as a 400 with `API_KEY_INVALID` in the body, so
/// part of this is matching on error text. That text is not a stable
/// contract and is only inspected here.
pub fn classify_api_error(status: StatusCode, body: &str) -> ProviderError {
    let envelope = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error);
    let message = envelope
        .as_ref()
        .and_then(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let api_status = envelope.as_ref().and_then(|e| e.status.as_deref());

    let mentions_api_key =
        body.contains("API_KEY_INVALID") || message.to_lowercase().contains("api key");

    match status {
        StatusCode::NOT_FOUND => ProviderError::NotFound(message),
        _ if api_status == Some("NOT_FOUND") => ProviderError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::CredentialRejected(message)
        }
        StatusCode::BAD_REQUEST if mentions_api_key => ProviderError::CredentialRejected(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited(message),
        _ => ProviderError::ApiError {
            status: status.as_u16(),
            message,
        },
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ApiModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    status: Option<String>,
}
