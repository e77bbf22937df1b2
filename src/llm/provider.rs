use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "openrouter")
    fn name(&self) -> &str;

    /// whether credentials are present; unconfigured providers are never called
    fn is_configured(&self) -> bool {
        true
    }

    /// chat completion (non-streaming)
    ///
    /// `Ok(None)` means the backend answered without a text message.
    async fn chat(&self, request: ChatRequest) -> Result<Option<String>, ApiError>;
}
