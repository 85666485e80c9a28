use std::process::ExitCode;
use clap::Parser;
use groq_chat::app::{self, ExitStatus, Options};
use groq_chat::llm::config::DEFAULT_API_URL;
use groq_chat::utils::Terminal;
use groq_chat::LLMConfig;
use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const API_KEY_ENV: &str = "GROQ_API_KEY";
const API_URL_ENV: &str = "GROQ_API_URL";

/// Groq API로 모델을 골라 질문하고 답변을 받는 터미널 챗봇
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// API 주소 (기본값: GROQ_API_URL 또는 https://api.groq.com/openai/v1)
    #[arg(long)]
    api_url: Option<String>,

    /// API 키 (기본값: GROQ_API_KEY, 없으면 입력받음)
    #[arg(long)]
    api_key: Option<String>,

    /// 모델 (번호 또는 이름 일부)
    #[arg(short, long)]
    model: Option<String>,

    /// 질문 하나만 보내고 종료
    #[arg(short, long)]
    question: Option<String>,

    /// 로그 레벨 (RUST_LOG가 있으면 그쪽이 우선)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // .env가 없어도 괜찮다
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // 로깅 설정
    setup_logging(&args.log_level)?;

    // LLM 설정
    let llm_config = setup_llm_config(&args);
    info!("Using API at {}", llm_config.api_url);

    let options = Options {
        api_key: args.api_key.clone().or_else(|| std::env::var(API_KEY_ENV).ok()),
        model: args.model.clone(),
        question: args.question.clone(),
    };

    let mut terminal = Terminal::new();
    Ok(match app::run(&mut terminal, llm_config, options).await? {
        ExitStatus::Success => ExitCode::SUCCESS,
        ExitStatus::Failure => ExitCode::FAILURE,
    })
}

fn setup_logging(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_names(false)
        .with_ansi(true)
        .with_timer(tracing_subscriber::fmt::time::LocalTime::rfc_3339())
        .with_level(true)
        .init();

    Ok(())
}

fn setup_llm_config(args: &Args) -> LLMConfig {
    let api_url = args.api_url.clone()
        .or_else(|| std::env::var(API_URL_ENV).ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    LLMConfig::new(api_url)
}
