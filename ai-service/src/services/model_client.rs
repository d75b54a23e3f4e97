//! Model discovery, selection and generation with fallback.
//!
//! Which models an API key may use is only known at runtime, so the client
//! lists them on first use, caches the first one that initializes, and when
//! that model later turns out to be gone it rediscovers and walks the fresh
//! list until one succeeds.
//!
//! Both caches sit behind locks that are never held across a provider call.
//! Concurrent first requests may therefore each run discovery and selection;
//! whichever finishes last wins the cache.

use crate::error::DescriptionError;
use crate::services::metrics;
use crate::services::providers::{GenerativeProvider, ModelHandle, ProviderError};
use crate::services::response::{RawResponse, ResponseShape};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    /// Nothing selected yet.
    Uninitialized,
    /// A handle is cached and used for every request.
    Ready(ModelHandle),
    /// The cached handle failed with not-found and was dropped.
    Degraded,
}

/// A successful generation and the model that produced it.
#[derive(Debug, Clone)]
pub struct Generation {
    pub model: ModelHandle,
    pub response: RawResponse,
}

pub struct ModelClient {
    provider: Arc<dyn GenerativeProvider>,
    fallback_models: Vec<String>,
    discovered: RwLock<Option<Vec<String>>>,
    state: RwLock<ModelState>,
}

impl ModelClient {
    /// `fallback_models` stands in for discovery when listing models fails.
    pub fn new(provider: Arc<dyn GenerativeProvider>, fallback_models: Vec<String>) -> Self {
        Self {
            provider,
            fallback_models,
            discovered: RwLock::new(None),
            state: RwLock::new(ModelState::Uninitialized),
        }
    }

    pub async fn state(&self) -> ModelState {
        self.state.read().await.clone()
    }

    /// Model identifiers that support content generation, in provider order.
    ///
    /// Cached after the first call, including when the listing failed and the
    /// fallback identifiers were used instead.
    pub async fn discover_models(&self) -> Vec<String> {
        if let Some(models) = self.discovered.read().await.as_ref() {
            return models.clone();
        }

        tracing::info!(provider = self.provider.name(), "Discovering available models");

        let models = match self.provider.list_models().await {
            Ok(listed) => {
                let models: Vec<String> = listed
                    .iter()
                    .filter(|m| m.supports_generate_content())
                    .map(|m| m.short_name().to_string())
                    .collect();

                if models.is_empty() {
                    tracing::warn!(
                        listed = listed.len(),
                        "No models with generateContent support found"
                    );
                } else {
                    tracing::info!(count = models.len(), models = ?models, "Found available models");
                }
                models
            }
            Err(e) => {
                metrics::record_provider_error(self.provider.name(), e.kind());
                tracing::warn!(
                    error = %e,
                    fallback = ?self.fallback_models,
                    "Could not list models, using fallback model names"
                );
                self.fallback_models.clone()
            }
        };

        *self.discovered.write().await = Some(models.clone());
        models
    }

    /// Return the cached handle, or initialize the first discovered model
    /// that accepts initialization and cache it.
    pub async fn select_model(&self) -> Result<ModelHandle, DescriptionError> {
        if let ModelState::Ready(handle) = &*self.state.read().await {
            return Ok(handle.clone());
        }

        let models = self.discover_models().await;
        if models.is_empty() {
            return Err(DescriptionError::ModelUnavailable {
                attempted: Vec::new(),
                last_error: Some(
                    "no models available; check your API key permissions".to_string(),
                ),
            });
        }

        let mut last_error = None;
        for model_id in &models {
            match self.provider.init_model(model_id).await {
                Ok(handle) => {
                    tracing::info!(model = %model_id, "Using model");
                    *self.state.write().await = ModelState::Ready(handle.clone());
                    return Ok(handle);
                }
                Err(e) => {
                    tracing::warn!(model = %model_id, error = %e, "Failed to load model");
                    last_error = Some(e.to_string());
                }
            }
        }

        Err(DescriptionError::ModelUnavailable {
            attempted: models,
            last_error,
        })
    }

    /// Generate content for `prompt`, cascading through freshly discovered
    /// models when the cached one is not found.
    pub async fn generate(&self, prompt: &str) -> Result<Generation, DescriptionError> {
        let handle = self.select_model().await?;

        match self.call(&handle, prompt).await {
            Ok(response) => Ok(Generation {
                model: handle,
                response,
            }),
            Err(e) if e.is_not_found() => {
                tracing::warn!(
                    model = %handle.model_id(),
                    error = %e,
                    "Model failed, trying other available models"
                );
                metrics::record_model_fallback(handle.model_id());
                self.cascade(prompt).await
            }
            Err(e) => Err(DescriptionError::from_provider(handle.model_id(), e)),
        }
    }

    /// Drop both caches so the next selection rediscovers.
    pub async fn invalidate(&self) {
        *self.state.write().await = ModelState::Degraded;
        *self.discovered.write().await = None;
    }

    async fn cascade(&self, prompt: &str) -> Result<Generation, DescriptionError> {
        self.invalidate().await;
        let models = self.discover_models().await;

        let mut attempted = Vec::with_capacity(models.len());
        let mut last_error = None;

        for model_id in models {
            tracing::info!(model = %model_id, "Trying model");
            attempted.push(model_id.clone());

            let handle = match self.provider.init_model(&model_id).await {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!(model = %model_id, error = %e, "Failed to load model");
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            match self.call(&handle, prompt).await {
                Ok(response) => {
                    tracing::info!(model = %model_id, "Successfully used fallback model");
                    *self.state.write().await = ModelState::Ready(handle.clone());
                    return Ok(Generation {
                        model: handle,
                        response,
                    });
                }
                // Another model will not fix a rejected key.
                Err(e) if e.is_credential_rejected() => {
                    return Err(DescriptionError::from_provider(model_id, e));
                }
                Err(e) => {
                    tracing::warn!(model = %model_id, error = %e, "Fallback model failed");
                    last_error = Some(e.to_string());
                }
            }
        }

        Err(DescriptionError::ModelUnavailable {
            attempted,
            last_error,
        })
    }

    async fn call(&self, handle: &ModelHandle, prompt: &str) -> Result<RawResponse, ProviderError> {
        let provider = self.provider.name();
        let start = Instant::now();
        let result = self.provider.generate(handle, prompt).await;

        metrics::record_provider_latency(provider, handle.model_id(), start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            metrics::record_provider_error(provider, e.kind());
        }

        result
    }
}

/// Pull the generated text out of a provider response.
///
/// The text is trimmed; an empty result is an error. A non-JSON body is only
/// accepted when it does not look like markup or a serialized structure.
pub fn extract_text(raw: &RawResponse) -> Result<String, DescriptionError> {
    let text = match raw.shape() {
        ResponseShape::DirectText(text) | ResponseShape::CandidateText(text) => {
            text.trim().to_string()
        }
        ResponseShape::CandidateParts(text) => text.trim().to_string(),
        ResponseShape::Rendered(text) => {
            let text = text.trim();
            if text.starts_with(['<', '{', '[']) {
                return Err(DescriptionError::EmptyResponse(
                    "could not extract text from provider response".to_string(),
                ));
            }
            text.to_string()
        }
        ResponseShape::Unrecognized => {
            let detail = match raw {
                RawResponse::Structured(body) => match body.block_reason() {
                    Some(reason) => format!("no candidates returned (prompt blocked: {})", reason),
                    None if body.candidates.is_empty() => "no candidates returned".to_string(),
                    None => "candidate carries no text".to_string(),
                },
                RawResponse::Rendered(_) => "unrecognized response body".to_string(),
            };
            return Err(DescriptionError::ResponseFormat(detail));
        }
    };

    if text.is_empty() {
        return Err(DescriptionError::EmptyResponse(
            "provider returned no text".to_string(),
        ));
    }

    Ok(text)
}
