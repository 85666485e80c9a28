//! 키 입력부터 질문 루프까지의 전체 흐름
//!
//! 입출력은 [`Prompter`]로만 한다. 바이너리는 터미널 구현을, 테스트는 미리 적어둔 입력을 넘긴다.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::credential::CredentialError;
use crate::llm::LLMConfig;
use crate::session::{choose_model, ErrorReporter, Session};

/// 사용자 입출력. 읽기 함수는 입력이 끝났으면(EOF) `None`.
pub trait Prompter: ErrorReporter {
    fn read_api_key(&mut self) -> Result<Option<String>>;
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
    fn warn(&mut self, message: &str);
    fn success(&mut self, message: &str);
    fn show_models(&mut self, models: &[String], current: Option<&str>);
    fn show_response(&mut self, response: &str);
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// 인자나 환경 변수로 받은 키. 형식이 틀리면 입력으로 넘어간다.
    pub api_key: Option<String>,
    pub model: Option<String>,
    /// 있으면 질문 하나만 처리하고 끝낸다
    pub question: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

/// 모델 목록 조회 결과를 어떻게 다룰지
#[derive(Debug, PartialEq, Eq)]
pub enum Listing {
    Ready(Vec<String>),
    /// 조회 실패 (메시지는 이미 보고됨). 키를 다시 받는다.
    Failed,
    /// 조회는 됐지만 텍스트 모델이 하나도 없다
    NoTextModels,
}

pub fn classify_listing(models: Vec<String>, reported: usize) -> Listing {
    if !models.is_empty() {
        Listing::Ready(models)
    } else if reported > 0 {
        Listing::Failed
    } else {
        Listing::NoTextModels
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Answered,
    Failed,
    Quit,
}

pub async fn run<P: Prompter>(io: &mut P, config: LLMConfig, options: Options) -> Result<ExitStatus> {
    let one_shot = options.question.is_some();
    let failure = if one_shot { ExitStatus::Failure } else { ExitStatus::Success };

    // API 키 확인 + 모델 목록
    let Some((mut session, models)) = open_session(io, config, options.api_key).await? else {
        return Ok(failure);
    };

    // 모델 선택
    let Some(model) = select_model(io, &models, options.model.as_deref(), None)? else {
        return Ok(failure);
    };
    session.set_model(model);

    // 질문 하나만 처리
    if let Some(question) = options.question.as_deref() {
        return Ok(match ask_once(io, &session, question).await {
            Outcome::Answered => ExitStatus::Success,
            _ => ExitStatus::Failure,
        });
    }

    chat_loop(io, &mut session, &models).await?;
    Ok(ExitStatus::Success)
}

/// 키를 받아 검증하고 모델 목록을 가져온다.
///
/// 목록 조회가 실패하면 키를 다시 묻는다. 입력이 끝났거나 쓸 수 있는 모델이 없으면 `None`.
pub async fn open_session<P: Prompter>(
    io: &mut P,
    config: LLMConfig,
    preset: Option<String>,
) -> Result<Option<(Session, Vec<String>)>> {
    let mut preset = preset.filter(|key| !key.trim().is_empty());

    loop {
        let raw_key = match preset.take() {
            Some(key) => {
                debug!("Using API key from arguments or environment");
                key
            }
            None => match io.read_api_key()? {
                Some(key) => key,
                None => return Ok(None),
            },
        };

        let session = match Session::open(config.clone(), &raw_key) {
            Ok(session) => session,
            Err(CredentialError::Empty) => {
                io.warn("Please provide your API key to proceed.");
                continue;
            }
            Err(e) => {
                warn!("Rejected API key: {}", e);
                io.warn("Please provide a valid API key.");
                continue;
            }
        };
        io.success("Thanks for providing a valid API key!");

        let mut errors: Vec<String> = Vec::new();
        let models = session.list_models(&mut errors).await;
        for message in &errors {
            io.report(message);
        }

        match classify_listing(models, errors.len()) {
            Listing::Ready(models) => return Ok(Some((session, models))),
            Listing::Failed => continue,
            Listing::NoTextModels => {
                io.warn("No text models are available for this API key.");
                return Ok(None);
            }
        }
    }
}

pub fn select_model<P: Prompter>(
    io: &mut P,
    models: &[String],
    model_arg: Option<&str>,
    current: Option<&str>,
) -> Result<Option<String>> {
    if let Some(choice) = model_arg {
        if let Some(model) = choose_model(models, choice) {
            return Ok(Some(model));
        }
        io.warn(&format!("Model '{}' not found. Choose one from the list.", choice));
    }

    io.show_models(models, current);
    loop {
        let prompt = format!("\nSelect a model (1-{}, Enter = 1): ", models.len());
        let Some(input) = io.read_line(&prompt)? else {
            return Ok(None);
        };

        if let Some(model) = choose_model(models, &input) {
            return Ok(Some(model));
        }
        io.warn("Invalid selection. Try again.");
    }
}

/// 빈 질문은 보내지 않는다. 보낼 때는 입력 그대로.
async fn ask_once<P: Prompter>(io: &mut P, session: &Session, question: &str) -> Outcome {
    if question.trim().is_empty() {
        io.warn("Please enter a question.");
        return Outcome::Failed;
    }

    match session.ask(question, io).await {
        Some(response) => {
            io.show_response(&response);
            Outcome::Answered
        }
        None => Outcome::Failed,
    }
}

pub async fn chat_loop<P: Prompter>(io: &mut P, session: &mut Session, models: &[String]) -> Result<()> {
    io.success("\nType a question. /model switches model, /quit exits.");

    loop {
        let model = session.model().unwrap_or_default().to_string();
        let Some(input) = io.read_line(&format!("[{}] > ", model))? else {
            break;
        };

        let outcome = match input.trim() {
            "" => continue,
            "/quit" | "/exit" => Outcome::Quit,
            "/model" => {
                match select_model(io, models, None, session.model())? {
                    Some(model) => session.set_model(model),
                    None => break,
                }
                continue;
            }
            _ => ask_once(io, session, &input).await,
        };

        if outcome == Outcome::Quit {
            break;
        }
    }

    info!("Session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_listing_is_ready_even_if_errors_were_reported() {
        let models = vec!["llama3-70b".to_string()];
        assert_eq!(classify_listing(models.clone(), 0), Listing::Ready(models.clone()));
        assert_eq!(classify_listing(models.clone(), 1), Listing::Ready(models));
    }

    #[test]
    fn empty_listing_with_reported_error_is_a_failure() {
        assert_eq!(classify_listing(Vec::new(), 1), Listing::Failed);
    }

    #[test]
    fn empty_listing_without_error_means_no_text_models() {
        assert_eq!(classify_listing(Vec::new(), 0), Listing::NoTextModels);
    }
}
