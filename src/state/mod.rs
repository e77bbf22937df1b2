use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::agent::{QueryRouter, ResponseComposer, RetailAgent};
use crate::catalog::{load_catalog, Catalog};
use crate::core::config::{AppPaths, ConfigService, Settings};
use crate::embedding::{embedder_from_settings, Embedder};
use crate::llm::{LlmService, OpenRouterProvider};
use crate::rag::{build_index, SemanticRetriever, VectorIndex};
use crate::tools::search::WebSearchService;

pub mod error;

use error::InitializationError;

/// Shared application state handed to every route.
///
/// Holds the resolved settings and the query router, which owns the
/// read-only catalog, index and embedder built at startup.
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub router: QueryRouter,
}

/// Snapshot reported by `/api/status`.
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub catalog_size: usize,
    pub index_dimension: usize,
    pub embedder: String,
    pub products_read: usize,
    pub dropped_rows: usize,
    pub never_ordered: usize,
    pub top_k: usize,
    pub compose_with_llm: bool,
    pub llm_provider: String,
    pub search_provider: String,
}

impl AppState {
    /// Loads configuration and builds the whole query pipeline.
    ///
    /// Steps:
    /// 1. Merge `config.yml` and `secrets.yaml`, validate, apply env overrides
    /// 2. Load the catalog CSVs, resolve the embedder, embed every entry
    /// 3. Wire the generative and web-search backends into the agent
    ///
    /// Any failure here is fatal to startup.
    pub async fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config = ConfigService::new(paths.clone());
        let raw_config = config.load_config().map_err(InitializationError::Config)?;
        let settings = Settings::from_config(&raw_config, &paths).with_env_overrides();

        let (catalog, index, embedder) = build_retrieval_parts(&paths, &settings).await?;
        let retriever =
            SemanticRetriever::new(Arc::new(catalog), Arc::new(index), embedder)?;

        let llm = OpenRouterProvider::new(&settings.llm).map_err(InitializationError::Llm)?;
        if settings.llm.api_key.is_none() {
            tracing::warn!("No LLM API key configured; generative answers are disabled");
        }
        let web = WebSearchService::from_settings(&settings.search)
            .map_err(InitializationError::Search)?;

        let composer = ResponseComposer::new(LlmService::new(Arc::new(llm)), web);
        let agent = RetailAgent::new(retriever, composer, settings.agent.clone());

        Ok(Self::new(settings, QueryRouter::new(Arc::new(agent))))
    }

    pub fn new(settings: Settings, router: QueryRouter) -> Arc<Self> {
        Arc::new(AppState { settings, router })
    }

    pub fn status(&self) -> IndexStatus {
        let agent = self.router.agent();
        let retriever = agent.retriever();
        let stats = retriever.catalog().stats();
        let (llm_provider, search_provider) = agent.composer().backend_names();
        IndexStatus {
            catalog_size: retriever.catalog().len(),
            index_dimension: retriever.index().dimension(),
            embedder: retriever.embedder_id().to_string(),
            products_read: stats.products_read,
            dropped_rows: stats.dropped(),
            never_ordered: stats.never_ordered,
            top_k: agent.settings().top_k,
            compose_with_llm: agent.settings().compose_with_llm,
            llm_provider: llm_provider.to_string(),
            search_provider: search_provider.to_string(),
        }
    }
}

/// Catalog load, model load and batch embedding are all blocking work.
async fn build_retrieval_parts(
    paths: &AppPaths,
    settings: &Settings,
) -> Result<(Catalog, VectorIndex, Arc<dyn Embedder>), InitializationError> {
    let data_dir = settings.catalog.data_dir.clone();
    let embedding = settings.embedding.clone();
    let model_cache = paths.user_data_dir.join("models");

    tokio::task::spawn_blocking(move || {
        let started = Instant::now();
        tracing::info!("Loading catalog from {}", data_dir.display());
        let catalog = load_catalog(&data_dir)?;

        let embedder = embedder_from_settings(&embedding, &model_cache)?;
        tracing::info!(
            embedder = embedder.id(),
            dimension = embedder.dimension(),
            "Embedding {} catalog entries",
            catalog.len()
        );
        let index = build_index(&catalog, embedder.as_ref(), embedding.batch_size)?;

        tracing::info!(
            entries = index.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Product index ready"
        );
        Ok::<_, InitializationError>((catalog, index, embedder))
    })
    .await
    .map_err(|err| InitializationError::Worker(err.to_string()))?
}
