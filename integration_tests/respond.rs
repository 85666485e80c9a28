use crate::helpers::{
    TEST_API_KEY, api_error, completion, session_for, truncating_server, unreachable_session,
};

use groq_chat::LlmError;
use groq_chat::llm::chat::SYSTEM_PROMPT;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn given_successful_completion_when_responding_then_text_is_returned_verbatim() {
    let server = MockServer::start().await;
    let answer = "2 + 2 = **4**\n\n  (trailing spaces kept)  ";
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", format!("Bearer {TEST_API_KEY}").as_str()))
        .and(body_partial_json(json!({
            "model": "llama3-70b",
            "stream": false,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": "Question: What is 2+2?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(answer)))
        .expect(1)
        .mount(&server)
        .await;

    let mut messages: Vec<String> = Vec::new();
    let response = session_for(&server)
        .respond("llama3-70b", "What is 2+2?", &mut messages)
        .await;

    assert_eq!(response.as_deref(), Some(answer));
    assert!(messages.is_empty());
}

#[tokio::test]
async fn given_selected_model_when_asking_then_it_is_used() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "mixtral-8x7b"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let mut session = session_for(&server);
    session.set_model("mixtral-8x7b".to_string());

    let mut messages: Vec<String> = Vec::new();
    assert_eq!(session.ask("hi", &mut messages).await.as_deref(), Some("hello"));
    assert!(messages.is_empty());
}

#[tokio::test]
async fn given_no_selected_model_when_asking_then_nothing_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("hello")))
        .expect(0)
        .mount(&server)
        .await;

    let mut messages: Vec<String> = Vec::new();
    assert_eq!(session_for(&server).ask("hi", &mut messages).await, None);
    assert_eq!(messages.len(), 1);
}

#[tokio::test]
async fn given_rejected_key_when_responding_then_absent_with_authentication_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(api_error("Invalid API Key", "invalid_api_key")),
        )
        .mount(&server)
        .await;

    let mut messages: Vec<String> = Vec::new();
    let response = session_for(&server)
        .respond("llama3-70b", "What is 2+2?", &mut messages)
        .await;

    assert_eq!(response, None);
    assert_eq!(messages, vec!["Authentication Error: Invalid API Key".to_string()]);
}

#[tokio::test]
async fn given_unknown_model_when_responding_then_absent_with_status_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(404).set_body_json(api_error(
            "The model `nope` does not exist or you do not have access to it.",
            "model_not_found",
        )))
        .mount(&server)
        .await;

    let mut messages: Vec<String> = Vec::new();
    let response = session_for(&server).respond("nope", "hi", &mut messages).await;

    assert_eq!(response, None);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("API Status Error: 404"), "got {}", messages[0]);
    assert!(messages[0].contains("does not exist"));
}

#[tokio::test]
async fn given_unreachable_server_when_responding_then_absent_with_connection_message() {
    let session = unreachable_session();

    assert!(matches!(
        session.try_respond("llama3-70b", "hi").await,
        Err(LlmError::Connection { .. })
    ));

    let mut messages: Vec<String> = Vec::new();
    assert_eq!(session.respond("llama3-70b", "hi", &mut messages).await, None);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("API Connection Error:"), "got {}", messages[0]);
}

#[tokio::test]
async fn given_response_without_content_when_responding_then_no_partial_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let mut messages: Vec<String> = Vec::new();
    let response = session_for(&server).respond("llama3-70b", "hi", &mut messages).await;

    assert_eq!(response, None);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Unknown Error:"), "got {}", messages[0]);
}

#[tokio::test]
async fn given_connection_dropped_mid_body_when_responding_then_connection_error() {
    let base_url = truncating_server().await;
    let session = groq_chat::Session::open(groq_chat::LLMConfig::new(base_url), TEST_API_KEY)
        .expect("test key is well-formed");

    match session.try_respond("llama3-70b", "hi").await {
        Err(LlmError::Connection { .. }) => {}
        other => panic!("expected connection error, got {other:?}"),
    }
}
