//! Scriptable mock provider for testing.

use super::{GenerativeProvider, ModelHandle, ModelInfo, ProviderError};
use crate::services::response::RawResponse;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// One call received by [`MockProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    ListModels,
    InitModel(String),
    Generate(String),
}

#[derive(Default)]
struct MockState {
    /// Queued listing results; the last one repeats once the queue drains.
    discoveries: VecDeque<Result<Vec<ModelInfo>, ProviderError>>,
    last_discovery: Option<Result<Vec<ModelInfo>, ProviderError>>,
    init_failures: HashMap<String, ProviderError>,
    /// Queued generation results per model.
    outcomes: HashMap<String, VecDeque<Result<RawResponse, ProviderError>>>,
    /// Sticky generation result per model, used when its queue is empty.
    fixed_outcomes: HashMap<String, Result<RawResponse, ProviderError>>,
    default_response: Option<RawResponse>,
    calls: Vec<MockCall>,
    prompts: Vec<String>,
}

/// Mock provider whose discovery, initialization and generation results are
/// scripted up front.
///
/// Unscripted generation answers with `Mock description from <model>`.
#[derive(Default)]
pub struct MockProvider {
    state: Mutex<MockState>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a listing where every model supports `generateContent`.
    pub fn with_models(self, model_ids: &[&str]) -> Self {
        let models = model_ids
            .iter()
            .map(|id| ModelInfo::new(format!("models/{}", id), &["generateContent"]))
            .collect();
        self.with_discovery(Ok(models))
    }

    /// Queue an arbitrary listing result.
    pub fn with_discovery(mut self, result: Result<Vec<ModelInfo>, ProviderError>) -> Self {
        self.state.get_mut().discoveries.push_back(result);
        self
    }

    pub fn with_init_failure(mut self, model_id: &str, error: ProviderError) -> Self {
        self.state
            .get_mut()
            .init_failures
            .insert(model_id.to_string(), error);
        self
    }

    /// Queue one generation result for `model_id`.
    pub fn with_outcome(
        mut self,
        model_id: &str,
        outcome: Result<RawResponse, ProviderError>,
    ) -> Self {
        self.state
            .get_mut()
            .outcomes
            .entry(model_id.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    /// Answer every unqueued call to `model_id` with `outcome`.
    pub fn with_fixed_outcome(
        mut self,
        model_id: &str,
        outcome: Result<RawResponse, ProviderError>,
    ) -> Self {
        self.state
            .get_mut()
            .fixed_outcomes
            .insert(model_id.to_string(), outcome);
        self
    }

    /// Answer every unscripted generation with `response`.
    pub fn with_default_response(mut self, response: RawResponse) -> Self {
        self.state.get_mut().default_response = Some(response);
        self
    }

    pub async fn calls(&self) -> Vec<MockCall> {
        self.state.lock().await.calls.clone()
    }

    /// Models that received a generation call, in call order.
    pub async fn generate_calls(&self) -> Vec<String> {
        self.calls()
            .await
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Generate(model) => Some(model),
                _ => None,
            })
            .collect()
    }

    /// Prompts received by generation calls, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.state.lock().await.prompts.clone()
    }

    pub async fn list_calls(&self) -> usize {
        self.calls()
            .await
            .iter()
            .filter(|call| **call == MockCall::ListModels)
            .count()
    }
}

#[async_trait]
impl GenerativeProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
        let mut state = self.state.lock().await;
        state.calls.push(MockCall::ListModels);

        if let Some(next) = state.discoveries.pop_front() {
            state.last_discovery = Some(next);
        }

        state.last_discovery.clone().unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn init_model(&self, model_id: &str) -> Result<ModelHandle, ProviderError> {
        let mut state = self.state.lock().await;
        state.calls.push(MockCall::InitModel(model_id.to_string()));

        match state.init_failures.get(model_id) {
            Some(error) => Err(error.clone()),
            None => Ok(ModelHandle::new(model_id)),
        }
    }

    async fn generate(
        &self,
        model: &ModelHandle,
        prompt: &str,
    ) -> Result<RawResponse, ProviderError> {
        let mut state = self.state.lock().await;
        let model_id = model.model_id().to_string();
        state.calls.push(MockCall::Generate(model_id.clone()));
        state.prompts.push(prompt.to_string());

        if let Some(outcome) = state
            .outcomes
            .get_mut(&model_id)
            .and_then(VecDeque::pop_front)
        {
            return outcome;
        }

        if let Some(outcome) = state.fixed_outcomes.get(&model_id) {
            return outcome.clone();
        }

        Ok(state
            .default_response
            .clone()
            .unwrap_or_else(|| RawResponse::from_text(format!("Mock description from {}", model_id))))
    }
}
