//! Wire-level tests for the Gemini client against a local mock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use autocommit::{
    CompletionService, DiffText, GeminiClient, GenerationError, GeneratorConfig, MessageGenerator,
    PromptTemplate,
};

const MODEL: &str = "gemini-test";
const ENDPOINT: &str = "/v1beta/models/gemini-test:generateContent";

fn config_for(server: &MockServer) -> GeneratorConfig {
    GeneratorConfig {
        api_key: Some("test-key".to_string()),
        model: MODEL.to_string(),
        api_base: server.uri(),
        timeout: Duration::from_secs(5),
        max_attempts: 1,
        ..Default::default()
    }
}

fn answer(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

#[tokio::test]
async fn test_request_carries_key_prompt_and_sampling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_partial_json(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "the prompt" }] }],
            "generationConfig": { "topK": 1, "maxOutputTokens": 5000 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("feat: add foo function\n")))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config_for(&server)).unwrap();
    let text = client.complete("the prompt").await.unwrap();

    assert_eq!(text, "feat: add foo function\n");
}

#[tokio::test]
async fn test_no_candidates_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config_for(&server)).unwrap();
    let result = client.complete("prompt").await;

    assert!(matches!(result, Err(GenerationError::EmptyResponse)));
}

#[tokio::test]
async fn test_error_status_is_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(400).set_body_string("API key not valid"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config_for(&server)).unwrap();
    match client.complete("prompt").await {
        Err(GenerationError::Api { status, body }) => {
            assert_eq!(status, 400);
            assert!(body.contains("API key not valid"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = GeminiClient::new(&config_for(&server)).unwrap();
    let result = client.complete("prompt").await;

    assert!(matches!(result, Err(GenerationError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(answer("feat: late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = GeneratorConfig {
        timeout: Duration::from_secs(1),
        ..config_for(&server)
    };
    let client = GeminiClient::new(&config).unwrap();
    let result = client.complete("prompt").await;

    assert!(matches!(result, Err(GenerationError::Timeout(1))));
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("feat: x")))
        .expect(0)
        .mount(&server)
        .await;

    let config = GeneratorConfig {
        api_key: None,
        ..config_for(&server)
    };
    let client = GeminiClient::new(&config).unwrap();
    let result = client.complete("prompt").await;

    assert!(matches!(result, Err(GenerationError::MissingApiKey)));
}

#[tokio::test]
async fn test_generator_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_json(answer("fix: handle empty input\n")))
        .expect(1)
        .mount(&server)
        .await;

    let config = GeneratorConfig {
        max_attempts: 2,
        ..config_for(&server)
    };
    let generator = MessageGenerator::from_config(&config, PromptTemplate::builtin()).unwrap();
    let message = generator
        .generate(&DiffText::new("+ if input.is_empty() { return; }"), None)
        .await
        .unwrap();

    assert_eq!(message.as_str(), "fix: handle empty input");
}

#[tokio::test]
async fn test_generator_does_not_retry_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let config = GeneratorConfig {
        max_attempts: 3,
        ..config_for(&server)
    };
    let generator = MessageGenerator::from_config(&config, PromptTemplate::builtin()).unwrap();
    let result = generator.generate(&DiffText::new("+x"), None).await;

    assert!(matches!(result, Err(GenerationError::Api { status: 403, .. })));
}
