//! 한 번의 대화 세션: 검증된 API 키와 선택된 모델을 들고 두 원격 호출을 수행한다.
//!
//! `list_models`와 `respond`는 실패를 호출자에게 넘기지 않는다. 실패하면 메시지를
//! [`ErrorReporter`]로 정확히 한 번 보내고 빈 목록 / `None`을 돌려준다.

use tracing::{info, warn};

use crate::credential::{ApiKey, CredentialError};
use crate::llm::{self, LLMConfig, LlmError};

/// 사용자에게 에러 메시지를 보여주는 출구
pub trait ErrorReporter {
    fn report(&mut self, message: &str);
}

/// 메시지를 모아두기만 한다
impl ErrorReporter for Vec<String> {
    fn report(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

#[derive(Debug)]
pub struct Session {
    config: LLMConfig,
    api_key: ApiKey,
    model: Option<String>,
}

impl Session {
    pub fn new(config: LLMConfig, api_key: ApiKey) -> Self {
        Self {
            config,
            api_key,
            model: None,
        }
    }

    /// 키 형식을 먼저 검사한다. 실패하면 네트워크 호출 없이 끝난다.
    pub fn open(config: LLMConfig, raw_key: &str) -> Result<Self, CredentialError> {
        let api_key = ApiKey::parse(raw_key)?;
        info!("API key accepted ({} chars)", api_key.len());
        Ok(Self::new(config, api_key))
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn set_model(&mut self, model: String) {
        info!("Selected model: {}", model);
        self.model = Some(model);
    }

    pub async fn try_list_models(&self) -> Result<Vec<String>, LlmError> {
        let ids = llm::fetch_available_models(&self.config, &self.api_key).await?;
        let models = llm::select_text_models(ids);
        info!("{} text models available", models.len());
        Ok(models)
    }

    /// 사용 가능한 텍스트 모델 목록. 실패하면 보고 후 빈 목록.
    pub async fn list_models(&self, reporter: &mut dyn ErrorReporter) -> Vec<String> {
        match self.try_list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!("Failed to list models: {}", e);
                reporter.report(&e.to_string());
                Vec::new()
            }
        }
    }

    pub async fn try_respond(&self, model: &str, question: &str) -> Result<String, LlmError> {
        llm::request_completion(&self.config, &self.api_key, model, question).await
    }

    /// 질문 하나에 대한 답변. 실패하면 보고 후 `None`.
    pub async fn respond(
        &self,
        model: &str,
        question: &str,
        reporter: &mut dyn ErrorReporter,
    ) -> Option<String> {
        match self.try_respond(model, question).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Completion failed: {}", e);
                reporter.report(&e.to_string());
                None
            }
        }
    }

    /// 선택된 모델로 답변. 모델이 없으면 보고 후 `None`.
    pub async fn ask(&self, question: &str, reporter: &mut dyn ErrorReporter) -> Option<String> {
        match self.model.as_deref() {
            Some(model) => self.respond(model, question, reporter).await,
            None => {
                reporter.report("No model selected");
                None
            }
        }
    }
}

/// `--model` 인자나 입력값으로 모델을 고른다.
///
/// 1부터 시작하는 번호, 또는 대소문자 구분 없는 부분 일치를 받는다. 빈 입력은 첫 번째 모델.
pub fn choose_model(models: &[String], choice: &str) -> Option<String> {
    let choice = choice.trim();

    if choice.is_empty() {
        return models.first().cloned();
    }

    // 숫자는 번호로만 해석한다
    if let Ok(index) = choice.parse::<usize>() {
        if index > 0 && index <= models.len() {
            return Some(models[index - 1].clone());
        }
        return None;
    }

    // 정확히 같은 이름을 부분 일치보다 먼저
    if let Some(exact) = models.iter().find(|m| m.eq_ignore_ascii_case(choice)) {
        return Some(exact.clone());
    }

    let needle = choice.to_lowercase();
    models
        .iter()
        .find(|m| m.to_lowercase().contains(&needle))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models() -> Vec<String> {
        vec![
            "gemma-7b-it".to_string(),
            "llama3-70b-8192".to_string(),
            "llama3-8b-8192".to_string(),
            "mixtral-8x7b-32768".to_string(),
        ]
    }

    #[test]
    fn blank_choice_picks_first_model() {
        assert_eq!(choose_model(&models(), "").as_deref(), Some("gemma-7b-it"));
        assert_eq!(choose_model(&models(), "  \n").as_deref(), Some("gemma-7b-it"));
        assert_eq!(choose_model(&[], ""), None);
    }

    #[test]
    fn numeric_choice_is_one_based() {
        assert_eq!(choose_model(&models(), "1").as_deref(), Some("gemma-7b-it"));
        assert_eq!(choose_model(&models(), "4").as_deref(), Some("mixtral-8x7b-32768"));
    }

    #[test]
    fn out_of_range_number_is_none() {
        assert_eq!(choose_model(&models(), "0"), None);
        assert_eq!(choose_model(&models(), "9"), None);
    }

    #[test]
    fn partial_name_is_case_insensitive() {
        assert_eq!(choose_model(&models(), "MIXTRAL").as_deref(), Some("mixtral-8x7b-32768"));
        assert_eq!(choose_model(&models(), "8b-8192").as_deref(), Some("llama3-8b-8192"));
        assert_eq!(choose_model(&models(), "claude"), None);
    }

    #[test]
    fn exact_name_wins_over_earlier_partial_match() {
        let models = vec!["llama3-70b-8192-tool".to_string(), "llama3-70b-8192".to_string()];
        assert_eq!(choose_model(&models, "llama3-70b-8192").as_deref(), Some("llama3-70b-8192"));
    }

    #[test]
    fn open_rejects_malformed_key() {
        let err = Session::open(LLMConfig::default(), "sk-openai-key").unwrap_err();
        assert!(matches!(err, CredentialError::InvalidPrefix { .. }));
    }

    #[test]
    fn session_tracks_selected_model() {
        let mut session = Session::open(LLMConfig::default(), "gsk_test").unwrap();
        assert_eq!(session.model(), None);
        session.set_model("llama3-70b-8192".to_string());
        assert_eq!(session.model(), Some("llama3-70b-8192"));
    }
}
