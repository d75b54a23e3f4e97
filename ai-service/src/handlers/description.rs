use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::DescriptionError;
use crate::models::{FactSet, GenerateDescriptionRequest, GenerateDescriptionResponse};
use crate::services::{build_prompt, extract_text, metrics, ModelClient};
use crate::startup::AppState;
use service_core::error::AppError;

/// Write a listing description from the host's property facts.
#[tracing::instrument(skip(state, payload))]
pub async fn generate_description(
    State(state): State<AppState>,
    payload: Result<Json<GenerateDescriptionRequest>, JsonRejection>,
) -> Result<Json<GenerateDescriptionResponse>, AppError> {
    let Json(request) =
        payload.map_err(|rejection| AppError::BadRequest(anyhow::anyhow!(rejection.body_text())))?;
    let raw = &request.host_input_facts;

    let facts_json = serde_json::Value::Object(raw.clone());
    tracing::debug!(facts = %facts_json, "Received host input facts");

    let ignored = FactSet::ignored_keys(raw);
    if !ignored.is_empty() {
        tracing::debug!(keys = ?ignored, "Ignoring facts the prompt does not use");
    }

    let facts = FactSet::from_raw(raw);
    tracing::debug!(
        location = %facts.location,
        amenities = %facts.amenities,
        vibe = %facts.vibe,
        capacity = %facts.capacity,
        additional_details = %facts.additional_details,
        "Parsed host input facts"
    );
    if facts.is_empty() {
        tracing::info!("No usable host facts provided; prompt will use placeholders");
    }

    let prompt = build_prompt(&facts);
    tracing::debug!(prompt = %prompt, "Prompt being sent to the AI provider");

    match describe(&state.model_client, &prompt).await {
        Ok((model, description)) => {
            metrics::record_genai_request(&model, "success");
            tracing::info!(
                model = %model,
                description_len = description.len(),
                "Generated listing description"
            );
            Ok(Json(GenerateDescriptionResponse { description }))
        }
        Err((model, e)) => {
            let model = model.as_deref().unwrap_or("none");
            metrics::record_genai_request(model, e.outcome());
            match &e {
                DescriptionError::CredentialRejected { .. } => {
                    tracing::warn!(model = %model, error = %e, "AI provider rejected the API key")
                }
                DescriptionError::Provider { .. } => tracing::error!(
                    model = %model,
                    error = %e,
                    details = ?e,
                    "Error generating description"
                ),
                _ => tracing::error!(model = %model, error = %e, "Failed to generate description"),
            }
            Err(e.into())
        }
    }
}

/// Generate and extract the description, returning the model that served
/// the request alongside the outcome.
async fn describe(
    client: &ModelClient,
    prompt: &str,
) -> Result<(String, String), (Option<String>, DescriptionError)> {
    let generation = client
        .generate(prompt)
        .await
        .map_err(|e| (e.model().map(str::to_string), e))?;
    let model = generation.model.model_id().to_string();

    match extract_text(&generation.response) {
        Ok(description) => Ok((model, description)),
        Err(e) => Err((Some(model), e)),
    }
}
