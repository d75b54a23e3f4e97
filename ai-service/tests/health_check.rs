//! Integration tests that run the service on a random port.

use ai_service::config::AiServiceConfig;
use ai_service::services::providers::mock::MockProvider;
use ai_service::services::providers::ProviderError;
use ai_service::startup::Application;
use reqwest::Client;
use service_core::config::Config;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

fn test_config(vars: &[(&str, &str)]) -> Result<AiServiceConfig, AppError> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let common = Config {
        port: 0, // Random port
        log_level: "debug".to_string(),
    };
    AiServiceConfig::load_from(common, |key| vars.get(key).cloned())
}

/// Spawn the application with a mock provider and return its port.
async fn spawn_app(provider: MockProvider) -> u16 {
    let config = test_config(&[("GEMINI_API_KEY", "test-api-key")]).expect("Failed to load config");
    let app = Application::build_with_provider(config, Arc::new(provider))
        .await
        .expect("Failed to build application");

    let port = app.port();

    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    port
}

#[tokio::test]
async fn health_check_returns_ok() {
    let port = spawn_app(MockProvider::new()).await;
    let client = Client::new();

    let response = client
        .get(format!("http://localhost:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "ai-service");
}

#[tokio::test]
async fn health_check_does_not_touch_the_provider() {
    let provider = Arc::new(MockProvider::new().with_models(&["gemini-pro"]));
    let config = test_config(&[("GEMINI_API_KEY", "test-api-key")]).unwrap();
    let app = Application::build_with_provider(config, provider.clone())
        .await
        .unwrap();
    let port = app.port();
    tokio::spawn(async move {
        let _ = app.run_until_stopped().await;
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = Client::new()
        .get(format!("http://localhost:{}/health", port))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert!(provider.calls().await.is_empty());
}

#[tokio::test]
async fn generate_description_over_http() {
    let port = spawn_app(MockProvider::new().with_models(&["gemini-1.5-flash"])).await;
    let client = Client::new();

    let response = client
        .post(format!("http://localhost:{}/generate_description", port))
        .json(&serde_json::json!({
            "host_input_facts": {"location": "Lisbon", "capacity": 4}
        }))
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["description"], "Mock description from gemini-1.5-flash");
}

#[tokio::test]
async fn metrics_endpoint_exposes_request_counters() {
    let port = spawn_app(MockProvider::new()).await;
    let client = Client::new();

    client
        .get(format!("http://localhost:{}/health", port))
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!("http://localhost:{}/metrics", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(body.contains("http_requests_total"));
}

#[tokio::test]
async fn failed_requests_are_labelled_with_the_model_tried() {
    let provider = MockProvider::new()
        .with_models(&["retired-model"])
        .with_fixed_outcome(
            "retired-model",
            Err(ProviderError::NotFound("retired-model is gone".to_string())),
        );
    let port = spawn_app(provider).await;
    let client = Client::new();

    let response = client
        .post(format!("http://localhost:{}/generate_description", port))
        .json(&serde_json::json!({ "host_input_facts": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 500);

    let body = client
        .get(format!("http://localhost:{}/metrics", port))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains(
        r#"genai_requests_total{model="retired-model",outcome="model_unavailable"}"#
    ));
}

#[tokio::test]
async fn missing_api_key_fails_before_binding() {
    let result = test_config(&[]);

    match result {
        Err(AppError::ConfigError(e)) => assert!(e.to_string().contains("GEMINI_API_KEY")),
        other => panic!("expected a configuration error, got {:?}", other.map(|_| ())),
    }
}
