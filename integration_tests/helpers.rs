//! Test helpers: a mock Groq server and a session pointed at it.

use groq_chat::{ErrorReporter, LLMConfig, Prompter, Session};

use std::collections::VecDeque;

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "gsk_test_key_123";

/// Session whose base URL is the mock server.
pub fn session_for(server: &MockServer) -> Session {
    Session::open(LLMConfig::new(server.uri()), TEST_API_KEY).expect("test key is well-formed")
}

/// Session pointed at a port nothing listens on.
pub fn unreachable_session() -> Session {
    Session::open(LLMConfig::new("http://127.0.0.1:1".to_string()), TEST_API_KEY)
        .expect("test key is well-formed")
}

/// `/models` response body in the shape Groq returns.
pub fn catalog(ids: &[&str]) -> Value {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "object": "model", "created": 1693721698, "owned_by": "Groq", "active": true}))
        .collect();
    json!({"object": "list", "data": data})
}

/// `/chat/completions` response body carrying `content`.
pub fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1715000000,
        "model": "llama3-70b",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 20, "completion_tokens": 5, "total_tokens": 25}
    })
}

pub fn api_error(message: &str, code: &str) -> Value {
    json!({"error": {"message": message, "type": "invalid_request_error", "code": code}})
}

/// Scripted [`Prompter`]: answers from a fixed list, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    inputs: VecDeque<String>,
    pub key_prompts: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub successes: Vec<String>,
    pub responses: Vec<String>,
    pub model_listings: Vec<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

impl ErrorReporter for ScriptedPrompter {
    fn report(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}

impl Prompter for ScriptedPrompter {
    fn read_api_key(&mut self) -> anyhow::Result<Option<String>> {
        self.key_prompts += 1;
        Ok(self.inputs.pop_front())
    }

    fn read_line(&mut self, _prompt: &str) -> anyhow::Result<Option<String>> {
        Ok(self.inputs.pop_front())
    }

    fn warn(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    fn success(&mut self, message: &str) {
        self.successes.push(message.to_string());
    }

    fn show_models(&mut self, models: &[String], _current: Option<&str>) {
        self.model_listings.push(models.to_vec());
    }

    fn show_response(&mut self, response: &str) {
        self.responses.push(response.to_string());
    }
}

/// Server that promises a longer body than it sends, then hangs up.
/// Returns its base URL.
pub async fn truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind local port");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 500\r\n\r\n{\"choices\":[")
                .await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{addr}")
}
