use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};
use crate::credential::ApiKey;
use super::config::LLMConfig;
use super::error::LlmError;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant. Please respond to the user's queries.";

/// 사용자 메시지 템플릿 (`{question}` 자리에 질문이 그대로 들어간다)
pub const USER_PROMPT_TEMPLATE: &str = "Question: {question}";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
}

/// system + user 두 개로 고정된 프롬프트
pub fn build_messages(question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage {
            role: "system",
            content: SYSTEM_PROMPT.to_string(),
        },
        ChatMessage {
            role: "user",
            content: USER_PROMPT_TEMPLATE.replace("{question}", question),
        },
    ]
}

/// 한 번의 non-streaming 요청으로 답변 텍스트를 받는다. 재시도 없음.
pub async fn request_completion(
    config: &LLMConfig,
    api_key: &ApiKey,
    model: &str,
    question: &str,
) -> Result<String, LlmError> {
    let client = Client::new();
    let request_body = ChatRequest {
        model,
        messages: build_messages(question),
        stream: false,
    };

    debug!("Sending completion request to {} (model {})", config.endpoint("chat/completions"), model);

    let response = client
        .post(config.endpoint("chat/completions"))
        .bearer_auth(api_key.as_str())
        .json(&request_body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        error!("Completion request failed with status {}", status);
        return Err(LlmError::from_response(status, &error_text));
    }

    let response_json: Value = response.json().await?;

    let content = response_json["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            let response_str = serde_json::to_string_pretty(&response_json)
                .unwrap_or_else(|_| "Failed to format response".to_string());
            error!("Invalid response format. Full response: {}", response_str);
            LlmError::unexpected("invalid response format: missing content field")
        })?;

    info!("Received {} bytes from {}", content.len(), model);
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_has_fixed_system_then_user_message() {
        let messages = build_messages("What is 2+2?");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, "user");
        assert_eq!(messages[1].content, "Question: What is 2+2?");
    }

    #[test]
    fn question_text_is_inserted_literally() {
        let messages = build_messages("use {braces} and \"quotes\"\nplease");
        assert_eq!(messages[1].content, "Question: use {braces} and \"quotes\"\nplease");
    }

    #[test]
    fn request_body_is_not_streaming() {
        let body = ChatRequest {
            model: "llama3-70b",
            messages: build_messages("hi"),
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3-70b");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Question: hi");
    }
}
