use crate::helpers::{TEST_API_KEY, api_error, catalog, session_for, unreachable_session};

use groq_chat::{CredentialError, LLMConfig, LlmError, Session};

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn given_mixed_catalog_when_listing_then_audio_models_are_dropped_and_sorted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("authorization", format!("Bearer {TEST_API_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog(&[
            "llama3-70b",
            "whisper-large-v3",
            "mixtral-8x7b",
            "distil-whisper-large-v3-en",
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let mut messages: Vec<String> = Vec::new();
    let models = session_for(&server).list_models(&mut messages).await;

    assert_eq!(models, vec!["llama3-70b".to_string(), "mixtral-8x7b".to_string()]);
    assert!(messages.is_empty());
}

#[tokio::test]
async fn given_unchanged_catalog_when_listing_twice_then_results_are_identical() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog(&[
            "mixtral-8x7b",
            "gemma-7b-it",
            "llama3-8b-8192",
        ])))
        .expect(2)
        .mount(&server)
        .await;

    let session = session_for(&server);
    let mut messages: Vec<String> = Vec::new();
    let first = session.list_models(&mut messages).await;
    let second = session.list_models(&mut messages).await;

    assert_eq!(first, vec!["gemma-7b-it", "llama3-8b-8192", "mixtral-8x7b"]);
    assert_eq!(first, second);
    assert!(messages.is_empty());
}

#[tokio::test]
async fn given_only_excluded_models_when_listing_then_empty_without_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog(&[
            "whisper-large-v3",
            "distil-whisper-large-v3-en",
        ])))
        .mount(&server)
        .await;

    let mut messages: Vec<String> = Vec::new();
    let models = session_for(&server).list_models(&mut messages).await;

    assert!(models.is_empty());
    assert!(messages.is_empty());
}

#[tokio::test]
async fn given_rejected_key_when_listing_then_empty_and_nested_message_reported_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(api_error("Invalid API Key", "invalid_api_key")),
        )
        .mount(&server)
        .await;

    let mut messages: Vec<String> = Vec::new();
    let models = session_for(&server).list_models(&mut messages).await;

    assert!(models.is_empty());
    assert_eq!(messages, vec!["Authentication Error: Invalid API Key".to_string()]);
}

#[tokio::test]
async fn given_unreachable_server_when_listing_then_empty_and_one_message() {
    let mut messages: Vec<String> = Vec::new();
    let models = unreachable_session().list_models(&mut messages).await;

    assert!(models.is_empty());
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("API Connection Error:"), "got {}", messages[0]);
}

#[tokio::test]
async fn given_garbage_body_when_listing_then_empty_and_one_unknown_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let session = session_for(&server);
    assert!(matches!(
        session.try_list_models().await,
        Err(LlmError::Unexpected { .. })
    ));

    let mut messages: Vec<String> = Vec::new();
    assert!(session.list_models(&mut messages).await.is_empty());
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Unknown Error:"), "got {}", messages[0]);
}

#[tokio::test]
async fn given_server_error_when_listing_then_status_error_is_typed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(api_error("Service overloaded", "overloaded")),
        )
        .mount(&server)
        .await;

    match session_for(&server).try_list_models().await {
        Err(LlmError::Status { status, message }) => {
            assert_eq!(status, 503);
            assert_eq!(message, "Service overloaded");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn given_malformed_key_when_opening_then_no_request_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog(&["llama3-70b"])))
        .expect(0)
        .mount(&server)
        .await;

    for raw in ["sk-proj-abc", "", "  ", "key_gsk_"] {
        let result = Session::open(LLMConfig::new(server.uri()), raw);
        assert!(result.is_err(), "{raw:?} should be rejected");
    }
    assert_eq!(
        Session::open(LLMConfig::new(server.uri()), "").unwrap_err(),
        CredentialError::Empty
    );
}
