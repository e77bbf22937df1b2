use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{health, query};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors_layer = build_cors_layer(&state.settings.server.cors_allowed_origins);
    Router::new()
        .route("/health", get(health::health))
        .route("/api/status", get(health::get_status))
        .route("/query", get(query::query))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(configured: &[String]) -> CorsLayer {
    let allow_origin = if configured.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            resolve_allowed_origins(configured)
                .into_iter()
                .filter_map(|origin| HeaderValue::from_str(&origin).ok())
                .collect::<Vec<_>>(),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn resolve_allowed_origins(configured: &[String]) -> Vec<String> {
    if configured.is_empty() {
        return default_local_origins();
    }
    configured.to_vec()
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8000".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://127.0.0.1:8000".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::agent::router::GREETING_ANSWER;
    use crate::agent::{QueryRouter, ResponseComposer, RetailAgent};
    use crate::catalog::{Catalog, CatalogEntry};
    use crate::core::config::{AppPaths, Settings};
    use crate::embedding::HashEmbedder;
    use crate::llm::{LlmService, OpenRouterProvider, LLM_KEY_MISSING};
    use crate::rag::{build_index, SemanticRetriever};
    use crate::tools::search::WebSearchService;

    fn test_state(dir: &TempDir) -> Arc<AppState> {
        let paths = Arc::new(AppPaths::with_dirs(
            dir.path().to_path_buf(),
            dir.path().to_path_buf(),
        ));
        let settings = Settings::from_config(&json!({}), &paths);

        let catalog = Catalog::from_entries(vec![
            CatalogEntry::new(1, "Organic Bananas", "fresh fruits", "produce", 120),
            CatalogEntry::new(2, "Whole Milk", "milk", "dairy eggs", 40),
            CatalogEntry::new(3, "Spaghetti", "dry pasta", "pantry", 0),
        ]);
        let embedder = Arc::new(HashEmbedder::new(32));
        let index = build_index(&catalog, embedder.as_ref(), 8).unwrap();
        let retriever =
            SemanticRetriever::new(Arc::new(catalog), Arc::new(index), embedder).unwrap();

        // No keys: both backends answer with their sentinels, never the network.
        let llm = OpenRouterProvider::new(&settings.llm).unwrap();
        let web = WebSearchService::from_settings(&settings.search).unwrap();
        let composer = ResponseComposer::new(LlmService::new(Arc::new(llm)), web);
        let agent = RetailAgent::new(retriever, composer, settings.agent.clone());

        AppState::new(settings, QueryRouter::new(Arc::new(agent)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get_json(router(test_state(&dir)), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn status_reports_index_shape() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get_json(router(test_state(&dir)), "/api/status").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["catalog_size"], 3);
        assert_eq!(body["index_dimension"], 32);
        assert_eq!(body["embedder"], "fnv1a-32");
        assert_eq!(body["dropped_rows"], 0);
        assert_eq!(body["never_ordered"], 1);
        assert_eq!(body["top_k"], 5);
        assert_eq!(body["compose_with_llm"], true);
        assert_eq!(body["llm_provider"], "openrouter");
        assert_eq!(body["search_provider"], "serpapi");
    }

    #[tokio::test]
    async fn greeting_query_returns_onboarding_text() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get_json(router(test_state(&dir)), "/query?q=hi").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "answer": GREETING_ANSWER }));
    }

    #[tokio::test]
    async fn task_query_without_llm_key_still_answers() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get_json(router(test_state(&dir)), "/query?q=bananas").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"], LLM_KEY_MISSING);
    }

    #[tokio::test]
    async fn missing_q_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let (status, body) = get_json(router(test_state(&dir)), "/query").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("'q'"));
    }

    #[test]
    fn empty_origin_list_falls_back_to_local_defaults() {
        let origins = resolve_allowed_origins(&[]);
        assert!(origins.contains(&"http://localhost:3000".to_string()));

        let configured = vec!["https://shop.example".to_string()];
        assert_eq!(resolve_allowed_origins(&configured), configured);
    }
}
