use std::sync::Arc;
use std::time::Instant;

use super::provider::LlmProvider;
use super::types::ChatRequest;

pub const LLM_KEY_MISSING: &str = "LLM Error: API key not set";

/// Boundary around the generative backend.
///
/// Never returns an error: missing credentials and transport failures come
/// back as sentinel text, which callers treat as a (poor) answer.
#[derive(Clone)]
pub struct LlmService {
    provider: Arc<dyn LlmProvider>,
}

impl LlmService {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// `None` when the backend replied without a text message.
    pub async fn generate(&self, system_instructions: &str, user_prompt: &str) -> Option<String> {
        if !self.provider.is_configured() {
            tracing::warn!("LLM provider '{}' has no API key", self.provider.name());
            return Some(LLM_KEY_MISSING.to_string());
        }

        let started = Instant::now();
        let request = ChatRequest::instructed(system_instructions, user_prompt);
        match self.provider.chat(request).await {
            Ok(content) => {
                tracing::debug!(
                    "LLM '{}' answered in {} ms (text={})",
                    self.provider.name(),
                    started.elapsed().as_millis(),
                    content.is_some()
                );
                content
            }
            Err(err) => {
                tracing::warn!("LLM '{}' call failed: {}", self.provider.name(), err);
                Some(format!("LLM Exception: {}", err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ApiError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticProvider {
        configured: bool,
        reply: Result<Option<String>, String>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn chat(&self, request: ChatRequest) -> Result<Option<String>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.messages.len(), 2);
            self.reply.clone().map_err(ApiError::Internal)
        }
    }

    fn service(configured: bool, reply: Result<Option<String>, String>) -> (LlmService, Arc<StaticProvider>) {
        let provider = Arc::new(StaticProvider {
            configured,
            reply,
            calls: AtomicUsize::new(0),
        });
        (LlmService::new(provider.clone()), provider)
    }

    #[tokio::test]
    async fn missing_key_returns_sentinel_without_calling() {
        let (service, provider) = service(false, Ok(Some("unused".into())));
        let out = service.generate("sys", "prompt").await;
        assert_eq!(out.as_deref(), Some(LLM_KEY_MISSING));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transport_error_becomes_sentinel_text() {
        let (service, _) = service(true, Err("connection reset".into()));
        let out = service.generate("sys", "prompt").await.unwrap();
        assert!(out.starts_with("LLM Exception:"));
        assert!(out.contains("connection reset"));
    }

    #[tokio::test]
    async fn absent_content_is_passed_through() {
        let (service, provider) = service(true, Ok(None));
        assert_eq!(service.generate("sys", "prompt").await, None);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
