//! Query pipeline: intent routing, retrieval, and answer composition.
//!
//! - `router`: small-talk short-circuit, error containment, output normalization
//! - `composer`: web-search vs. catalog branch, prompting, fallback
//! - `output`: `Answer` and the `AgentOutput` shapes

pub mod composer;
pub mod output;
pub mod router;


pub use composer::{ComposeBranch, Composition, ResponseComposer};
pub use output::{AgentOutput, Answer, Recommendation};
pub use router::{Intent, QueryRouter};

use thiserror::Error;

use crate::core::config::AgentSettings;
use crate::rag::{RetrievalError, SemanticRetriever};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),
    #[error("retrieval worker failed: {0}")]
    Worker(String),
}

/// Retrieval followed by composition, for one task query.
///
/// Constructed once at startup and shared across requests.
pub struct RetailAgent {
    retriever: SemanticRetriever,
    composer: ResponseComposer,
    settings: AgentSettings,
}

impl RetailAgent {
    pub fn new(
        retriever: SemanticRetriever,
        composer: ResponseComposer,
        settings: AgentSettings,
    ) -> Self {
        Self {
            retriever,
            composer,
            settings,
        }
    }

    pub fn retriever(&self) -> &SemanticRetriever {
        &self.retriever
    }

    pub fn composer(&self) -> &ResponseComposer {
        &self.composer
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub async fn run(&self, query: &str) -> Result<AgentOutput, AgentError> {
        let retriever = self.retriever.clone();
        let owned_query = query.to_string();
        let k = self.settings.top_k;

        // Encoding and search are CPU-bound; keep them off the async workers.
        let hits = tokio::task::spawn_blocking(move || retriever.retrieve(&owned_query, k))
            .await
            .map_err(|err| AgentError::Worker(err.to_string()))??;

        tracing::info!(hits = hits.len(), "retrieval finished");

        if !hits.is_empty() && !self.settings.compose_with_llm {
            tracing::info!(branch = "catalog_only", "compose finished");
            return Ok(AgentOutput::RecommendationList(
                hits.into_iter().map(Recommendation::from).collect(),
            ));
        }

        let composition = self.composer.compose(query, &hits).await;
        tracing::info!(branch = composition.branch.as_str(), "compose finished");
        Ok(AgentOutput::StructuredAnswer {
            answer: composition.answer,
        })
    }
}
