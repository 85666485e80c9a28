use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// 원격 LLM API 호출 실패
///
/// 표시 문자열이 그대로 사용자에게 보여지는 메시지가 된다.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Authentication Error: {message}")]
    Authentication { message: String },

    #[error("API Connection Error: {message}")]
    Connection { message: String },

    #[error("API Status Error: {status} {message}")]
    Status { status: u16, message: String },

    #[error("Unknown Error: {message}")]
    Unexpected { message: String },
}

impl LlmError {
    /// 실패한 응답의 상태 코드와 본문으로 에러를 만든다
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let message = extract_error_message(body)
            .unwrap_or_else(|| fallback_message(status, body));

        if status == StatusCode::UNAUTHORIZED {
            LlmError::Authentication { message }
        } else {
            LlmError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        LlmError::Unexpected {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(error: reqwest::Error) -> Self {
        // 본문을 읽다가 연결이 끊긴 경우도 포함
        if error.is_connect() || error.is_timeout() || error.is_body() {
            return LlmError::Connection {
                message: error.to_string(),
            };
        }

        // 본문 디코딩 실패는 연결 문제가 아니다
        if error.is_request() && !error.is_decode() {
            return LlmError::Connection {
                message: error.to_string(),
            };
        }

        LlmError::Unexpected {
            message: error.to_string(),
        }
    }
}

/// `{"error": {"message": "..."}}` 형태의 본문에서 메시지를 꺼낸다
pub fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}

fn fallback_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_nested_error_message() {
        let body = r#"{"error":{"message":"Invalid API Key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        assert_eq!(extract_error_message(body).as_deref(), Some("Invalid API Key"));
    }

    #[test]
    fn missing_nested_message_yields_none() {
        assert_eq!(extract_error_message(r#"{"error":"boom"}"#), None);
        assert_eq!(extract_error_message(r#"{"detail":"x"}"#), None);
        assert_eq!(extract_error_message("not json"), None);
    }

    #[test]
    fn unauthorized_maps_to_authentication() {
        let err = LlmError::from_response(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Invalid API Key"}}"#,
        );
        assert!(matches!(err, LlmError::Authentication { .. }));
        assert_eq!(err.to_string(), "Authentication Error: Invalid API Key");
    }

    #[test]
    fn other_statuses_keep_the_code() {
        let err = LlmError::from_response(
            StatusCode::NOT_FOUND,
            r#"{"error":{"message":"The model `nope` does not exist"}}"#,
        );
        match err {
            LlmError::Status { status, ref message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "The model `nope` does not exist");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_raw_body_then_reason() {
        let raw = LlmError::from_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(raw.to_string(), "API Status Error: 502 upstream down");

        let empty = LlmError::from_response(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(
            empty.to_string(),
            "API Status Error: 503 Service Unavailable"
        );
    }
}
