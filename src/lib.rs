pub mod app;
pub mod credential;
pub mod llm;
pub mod session;
pub mod utils;

pub use app::{ExitStatus, Options, Prompter};
pub use credential::{ApiKey, CredentialError, API_KEY_PREFIX};
pub use llm::{LLMConfig, LlmError};
pub use session::{choose_model, ErrorReporter, Session};
