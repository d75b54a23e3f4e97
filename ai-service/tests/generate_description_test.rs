//! Router tests for the description endpoint using the mock provider.

use ai_service::services::providers::mock::MockProvider;
use ai_service::services::providers::ProviderError;
use ai_service::services::response::RawResponse;
use ai_service::services::ModelClient;
use ai_service::startup::{build_router, AppState};
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

const FIXED_DESCRIPTION: &str = "Welcome to our Lake Tahoe cabin, a cozy rustic retreat.

Unwind in the hot tub or curl up by the fireplace after a day outdoors.

With room for six, it is the perfect base for friends and family.";

fn app(provider: MockProvider) -> Router {
    app_with(&Arc::new(provider))
}

/// Router over a shared provider so tests can inspect what it received.
fn app_with(provider: &Arc<MockProvider>) -> Router {
    let client = ModelClient::new(provider.clone(), vec!["gemini-pro".to_string()]);
    build_router(AppState::new(Arc::new(client)))
}

fn post_json(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/generate_description")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_check_returns_healthy() {
    let response = app(MockProvider::new())
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body, json!({"status": "healthy", "service": "ai-service"}));
}

#[tokio::test]
async fn generates_description_from_facts() {
    let provider = Arc::new(
        MockProvider::new()
            .with_models(&["gemini-1.5-flash"])
            .with_default_response(RawResponse::from_text(format!("\n  {}  \n", FIXED_DESCRIPTION))),
    );

    let response = app_with(&provider)
        .oneshot(post_json(json!({
            "host_input_facts": {
                "location": "Lake Tahoe cabin",
                "amenities": "hot tub, fireplace",
                "vibe": "cozy rustic",
                "capacity": "sleeps 6"
            }
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body, json!({ "description": FIXED_DESCRIPTION }));

    let prompts = provider.prompts().await;
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("- Location: Lake Tahoe cabin\n"));
    assert!(prompts[0].contains("- Amenities: hot tub, fireplace\n"));
    assert!(prompts[0].contains("- Vibe/Style: cozy rustic\n"));
    assert!(prompts[0].contains("- Capacity: sleeps 6\n"));
    assert!(prompts[0].contains("- Additional Details: None provided\n"));
}

#[tokio::test]
async fn empty_facts_still_produce_a_description() {
    let provider = Arc::new(MockProvider::new().with_models(&["gemini-1.5-flash"]));

    let response = app_with(&provider)
        .oneshot(post_json(json!({ "host_input_facts": {} })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let description = body["description"].as_str().unwrap();
    assert!(!description.is_empty());

    let prompts = provider.prompts().await;
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].matches("Not specified").count(), 4);
    assert_eq!(prompts[0].matches("None provided").count(), 1);
}

#[tokio::test]
async fn facts_are_normalized_before_reaching_the_provider() {
    let provider = Arc::new(MockProvider::new().with_models(&["gemini-1.5-flash"]));

    let response = app_with(&provider)
        .oneshot(post_json(json!({
            "host_input_facts": {
                "location": "  Lisbon loft  ",
                "amenities": ["rooftop terrace", " espresso machine "],
                "capacity": 4,
                "vibe": "   ",
                "check_in": "3pm"
            }
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let prompt = &provider.prompts().await[0];
    assert!(prompt.contains("- Location: Lisbon loft\n"));
    assert!(prompt.contains("- Amenities: rooftop terrace, espresso machine\n"));
    assert!(prompt.contains("- Capacity: 4\n"));
    assert!(prompt.contains("- Vibe/Style: Not specified\n"));
    assert!(!prompt.contains("3pm"));
}

#[tokio::test]
async fn rejected_credential_returns_401_with_guidance() {
    let provider = MockProvider::new()
        .with_models(&["gemini-pro"])
        .with_outcome(
            "gemini-pro",
            Err(ProviderError::CredentialRejected("API key not valid".to_string())),
        );

    let response = app(provider)
        .oneshot(post_json(json!({ "host_input_facts": {"location": "Lisbon"} })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("GEMINI_API_KEY"));
}

#[tokio::test]
async fn no_usable_model_returns_500_with_models_tried() {
    let provider = MockProvider::new()
        .with_models(&["gemini-pro"])
        .with_fixed_outcome("gemini-pro", Err(ProviderError::NotFound("gone".to_string())));

    let response = app(provider)
        .oneshot(post_json(json!({ "host_input_facts": {} })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Could not generate description with any available model"));
    assert!(body["details"].as_str().unwrap().contains("gemini-pro"));
}

#[tokio::test]
async fn unclassified_provider_error_returns_500_with_error_text() {
    let provider = MockProvider::new()
        .with_models(&["gemini-pro"])
        .with_outcome(
            "gemini-pro",
            Err(ProviderError::ApiError {
                status: 503,
                message: "backend overloaded".to_string(),
            }),
        );

    let response = app(provider)
        .oneshot(post_json(json!({ "host_input_facts": {} })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["error"], "Internal server error");
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("Error generating description: API error 503: backend overloaded"));
}

#[tokio::test]
async fn unreadable_response_returns_500() {
    let provider = MockProvider::new()
        .with_models(&["gemini-pro"])
        .with_default_response(RawResponse::Rendered("<html>proxy error</html>".to_string()));

    let response = app(provider)
        .oneshot(post_json(json!({ "host_input_facts": {} })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert!(body["details"]
        .as_str()
        .unwrap()
        .contains("Empty response from provider"));
}

#[tokio::test]
async fn malformed_body_is_a_bad_request() {
    let response = app(MockProvider::new())
        .oneshot(post_json(json!({ "facts": {} })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let response = app(MockProvider::new())
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
