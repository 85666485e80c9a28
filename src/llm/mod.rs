pub mod chat;
pub mod config;
pub mod error;

pub use config::{LLMConfig, fetch_available_models, select_text_models};
pub use chat::request_completion;
pub use error::LlmError;
