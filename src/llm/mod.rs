pub mod openrouter;
pub mod provider;
pub mod service;
pub mod types;

pub use openrouter::OpenRouterProvider;
pub use provider::LlmProvider;
pub use service::{LlmService, LLM_KEY_MISSING};
pub use types::{ChatMessage, ChatRequest};
