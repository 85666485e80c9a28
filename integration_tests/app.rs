use crate::helpers::{ScriptedPrompter, TEST_API_KEY, api_error, catalog, completion};

use groq_chat::app::{self, ExitStatus, Options};
use groq_chat::LLMConfig;
use groq_chat::llm::chat::SYSTEM_PROMPT;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve_catalog(server: &MockServer, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog(ids)))
        .mount(server)
        .await;
}

async fn serve_answer(server: &MockServer, answer: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(answer)))
        .mount(server)
        .await;
}

fn one_shot(question: &str) -> Options {
    Options {
        api_key: Some(TEST_API_KEY.to_string()),
        model: None,
        question: Some(question.to_string()),
    }
}

#[tokio::test]
async fn given_closed_input_when_prompting_for_key_then_run_ends_without_looping() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let mut io = ScriptedPrompter::new(&[]);
    let status = app::run(&mut io, LLMConfig::new(server.uri()), Options::default()).await.unwrap();

    assert_eq!(status, ExitStatus::Success);
    assert_eq!(io.key_prompts, 1);
    assert!(io.warnings.is_empty());
}

#[tokio::test]
async fn given_blank_keys_then_closed_input_when_prompting_then_each_blank_warns_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let mut io = ScriptedPrompter::new(&["", "   "]);
    let status = app::run(&mut io, LLMConfig::new(server.uri()), Options::default()).await.unwrap();

    assert_eq!(status, ExitStatus::Success);
    assert_eq!(io.key_prompts, 3);
    assert_eq!(io.warnings, vec!["Please provide your API key to proceed."; 2]);
}

#[tokio::test]
async fn given_only_excluded_models_when_asking_one_question_then_exit_fails_with_distinct_warning() {
    let server = MockServer::start().await;
    serve_catalog(&server, &["whisper-large-v3", "distil-whisper-large-v3-en"]).await;
    Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

    let mut io = ScriptedPrompter::new(&[]);
    let status = app::run(&mut io, LLMConfig::new(server.uri()), one_shot("What is 2+2?")).await.unwrap();

    assert_eq!(status, ExitStatus::Failure);
    assert!(io.errors.is_empty());
    assert_eq!(io.warnings, vec!["No text models are available for this API key."]);
    // 키를 다시 묻지 않는다
    assert_eq!(io.key_prompts, 0);
}

#[tokio::test]
async fn given_failed_listing_when_opening_then_key_is_requested_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("authorization", "Bearer gsk_revoked"))
        .respond_with(ResponseTemplate::new(401).set_body_json(api_error("Invalid API Key", "invalid_api_key")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("authorization", format!("Bearer {TEST_API_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(catalog(&["llama3-70b"])))
        .expect(1)
        .mount(&server)
        .await;

    let mut io = ScriptedPrompter::new(&[TEST_API_KEY]);
    let opened = app::open_session(&mut io, LLMConfig::new(server.uri()), Some("gsk_revoked".to_string()))
        .await
        .unwrap();

    let (_session, models) = opened.expect("second key should open a session");
    assert_eq!(models, vec!["llama3-70b"]);
    assert_eq!(io.errors, vec!["Authentication Error: Invalid API Key"]);
    assert_eq!(io.key_prompts, 1);
    assert!(io.warnings.is_empty());
}

#[tokio::test]
async fn given_malformed_preset_key_when_opening_then_falls_back_to_prompt() {
    let server = MockServer::start().await;
    serve_catalog(&server, &["mixtral-8x7b", "llama3-70b"]).await;

    let mut io = ScriptedPrompter::new(&[TEST_API_KEY]);
    let opened = app::open_session(&mut io, LLMConfig::new(server.uri()), Some("sk-openai-key".to_string()))
        .await
        .unwrap();

    let (_session, models) = opened.expect("prompted key should open a session");
    assert_eq!(models, vec!["llama3-70b", "mixtral-8x7b"]);
    assert_eq!(io.warnings, vec!["Please provide a valid API key."]);
    assert_eq!(io.key_prompts, 1);
}

#[tokio::test]
async fn given_unmatched_model_and_closed_input_when_asking_one_question_then_exit_fails() {
    let server = MockServer::start().await;
    serve_catalog(&server, &["llama3-70b"]).await;

    let mut io = ScriptedPrompter::new(&[]);
    let options = Options {
        model: Some("claude".to_string()),
        ..one_shot("What is 2+2?")
    };
    let status = app::run(&mut io, LLMConfig::new(server.uri()), options).await.unwrap();

    assert_eq!(status, ExitStatus::Failure);
    assert_eq!(io.warnings, vec!["Model 'claude' not found. Choose one from the list."]);
}

#[tokio::test]
async fn given_failed_completion_when_asking_one_question_then_exit_fails() {
    let server = MockServer::start().await;
    serve_catalog(&server, &["llama3-70b"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(api_error("Internal error", "server_error")))
        .mount(&server)
        .await;

    let mut io = ScriptedPrompter::new(&[]);
    let status = app::run(&mut io, LLMConfig::new(server.uri()), one_shot("hi")).await.unwrap();

    assert_eq!(status, ExitStatus::Failure);
    assert_eq!(io.errors, vec!["API Status Error: 500 Internal error"]);
    assert!(io.responses.is_empty());
}

#[tokio::test]
async fn given_padded_question_when_asking_one_question_then_text_is_sent_as_typed() {
    let server = MockServer::start().await;
    serve_catalog(&server, &["llama3-70b"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": "Question:   What is 2+2?  "}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("4")))
        .expect(1)
        .mount(&server)
        .await;

    let mut io = ScriptedPrompter::new(&[]);
    let status = app::run(&mut io, LLMConfig::new(server.uri()), one_shot("  What is 2+2?  ")).await.unwrap();

    assert_eq!(status, ExitStatus::Success);
    assert_eq!(io.responses, vec!["4"]);
}

#[tokio::test]
async fn given_chat_commands_when_looping_then_model_switches_and_quit_stops_reading() {
    let server = MockServer::start().await;
    serve_catalog(&server, &["llama3-70b", "mixtral-8x7b"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "mixtral-8x7b"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("from mixtral")))
        .expect(1)
        .mount(&server)
        .await;

    // 모델 선택(Enter = 1), 빈 줄, 모델 변경, 질문, 종료, 이후 입력은 읽지 않는다
    let mut io = ScriptedPrompter::new(&["", "   ", "/model", "2", "hello", "/quit", "never read"]);
    let options = Options {
        api_key: Some(TEST_API_KEY.to_string()),
        ..Options::default()
    };
    let status = app::run(&mut io, LLMConfig::new(server.uri()), options).await.unwrap();

    assert_eq!(status, ExitStatus::Success);
    assert_eq!(io.responses, vec!["from mixtral"]);
    assert_eq!(io.model_listings.len(), 2);
    assert!(io.errors.is_empty());
    assert_eq!(io.remaining(), 1);
}

#[tokio::test]
async fn given_closed_input_in_chat_loop_when_looping_then_session_ends() {
    let server = MockServer::start().await;
    serve_catalog(&server, &["llama3-70b"]).await;
    serve_answer(&server, "unused").await;

    let mut io = ScriptedPrompter::new(&["1"]);
    let options = Options {
        api_key: Some(TEST_API_KEY.to_string()),
        ..Options::default()
    };
    let status = app::run(&mut io, LLMConfig::new(server.uri()), options).await.unwrap();

    assert_eq!(status, ExitStatus::Success);
    assert!(io.responses.is_empty());
    assert_eq!(io.remaining(), 0);
}
