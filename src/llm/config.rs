use serde::Deserialize;
use reqwest::Client;
use tracing::{debug, info};
use crate::credential::ApiKey;
use super::error::LlmError;

/// Groq OpenAI 호환 API 기본 주소
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1";

/// 텍스트 생성이 아닌 음성 인식 모델 (목록에서 제외)
pub const EXCLUDED_MODELS: [&str; 2] = ["whisper-large-v3", "distil-whisper-large-v3-en"];

#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub api_url: String,
}

#[derive(Debug, Deserialize)]
struct ModelResponse {
    data: Vec<Model>,
}

#[derive(Debug, Deserialize)]
struct Model {
    id: String,
    owned_by: Option<String>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl LLMConfig {
    pub fn new(api_url: String) -> Self {
        Self { api_url }
    }

    /// 끝의 `/`를 정리해서 엔드포인트 주소를 만든다
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), path)
    }
}

/// 서버가 제공하는 모델 ID를 그대로 가져온다 (필터링 없음)
pub async fn fetch_available_models(config: &LLMConfig, api_key: &ApiKey) -> Result<Vec<String>, LlmError> {
    let client = Client::new();
    let url = config.endpoint("models");
    debug!("Fetching models from {}", url);

    let response = client
        .get(&url)
        .bearer_auth(api_key.as_str())
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response.text().await.unwrap_or_default();
        return Err(LlmError::from_response(status, &error_text));
    }

    let model_response: ModelResponse = response.json().await?;
    info!("Server advertised {} models", model_response.data.len());

    Ok(model_response.data
        .into_iter()
        .map(|model| {
            debug!("model {} (owned by {})", model.id, model.owned_by.as_deref().unwrap_or("unknown"));
            model.id
        })
        .collect())
}

/// 제외 목록을 걸러내고 정렬/중복 제거
pub fn select_text_models(ids: Vec<String>) -> Vec<String> {
    let mut models: Vec<String> = ids
        .into_iter()
        .filter(|id| !EXCLUDED_MODELS.contains(&id.as_str()))
        .collect();
    models.sort();
    models.dedup();
    models
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn drops_audio_models_and_sorts() {
        let result = select_text_models(ids(&[
            "llama3-70b",
            "whisper-large-v3",
            "mixtral-8x7b",
            "distil-whisper-large-v3-en",
        ]));
        assert_eq!(result, ids(&["llama3-70b", "mixtral-8x7b"]));
    }

    #[test]
    fn removes_duplicates() {
        let result = select_text_models(ids(&["gemma-7b-it", "gemma-7b-it", "llama3-8b-8192"]));
        assert_eq!(result, ids(&["gemma-7b-it", "llama3-8b-8192"]));
    }

    #[test]
    fn only_excluded_models_gives_empty_list() {
        assert!(select_text_models(ids(&EXCLUDED_MODELS)).is_empty());
    }

    #[test]
    fn endpoint_handles_trailing_slash() {
        let config = LLMConfig::new("http://localhost:1234/v1/".to_string());
        assert_eq!(config.endpoint("models"), "http://localhost:1234/v1/models");
        assert_eq!(LLMConfig::default().endpoint("chat/completions"), "https://api.groq.com/openai/v1/chat/completions");
    }
}
