//! Typed view over the merged YAML configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use super::paths::AppPaths;

pub const DEFAULT_LLM_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_LLM_MODEL: &str = "openai/gpt-oss-120b:free";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub catalog: CatalogSettings,
    pub embedding: EmbeddingSettings,
    pub agent: AgentSettings,
    pub llm: LlmSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    /// `minilm` or `hash`.
    pub model: String,
    /// Output dimension of the hash embedder.
    pub dimension: usize,
    pub batch_size: usize,
}

#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub top_k: usize,
    pub compose_with_llm: bool,
}

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// `serpapi` or `duckduckgo`.
    pub provider: String,
    pub serp_api_key: Option<String>,
    pub timeout: Duration,
}

impl Settings {
    pub fn from_config(config: &Value, paths: &AppPaths) -> Self {
        let data_dir = str_at(config, "catalog", "data_dir")
            .map(|dir| {
                let path = PathBuf::from(dir);
                if path.is_relative() {
                    paths.project_root.join(path)
                } else {
                    path
                }
            })
            .unwrap_or_else(|| paths.default_catalog_dir());

        let cors_allowed_origins = config
            .get("server")
            .and_then(|v| v.get("cors_allowed_origins"))
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|item| item.as_str())
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(|item| item.to_string())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Self {
            server: ServerSettings {
                host: str_at(config, "server", "host").unwrap_or_else(|| "127.0.0.1".to_string()),
                port: u64_at(config, "server", "port").unwrap_or(8000) as u16,
                cors_allowed_origins,
            },
            catalog: CatalogSettings { data_dir },
            embedding: EmbeddingSettings {
                model: str_at(config, "embedding", "model").unwrap_or_else(|| "minilm".to_string()),
                dimension: u64_at(config, "embedding", "dimension").unwrap_or(384) as usize,
                batch_size: u64_at(config, "index", "batch_size").unwrap_or(256) as usize,
            },
            agent: AgentSettings {
                top_k: u64_at(config, "agent", "top_k").unwrap_or(5) as usize,
                compose_with_llm: config
                    .get("agent")
                    .and_then(|v| v.get("compose_with_llm"))
                    .and_then(|v| v.as_bool())
                    .unwrap_or(true),
            },
            llm: LlmSettings {
                base_url: str_at(config, "llm", "base_url")
                    .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
                model: str_at(config, "llm", "model")
                    .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
                api_key: str_at(config, "llm", "api_key").filter(|key| !key.is_empty()),
                timeout: Duration::from_secs(u64_at(config, "llm", "timeout_secs").unwrap_or(60)),
            },
            search: SearchSettings {
                provider: str_at(config, "search", "provider")
                    .unwrap_or_else(|| "serpapi".to_string()),
                serp_api_key: str_at(config, "search", "serp_api_key")
                    .filter(|key| !key.is_empty()),
                timeout: Duration::from_secs(
                    u64_at(config, "search", "timeout_secs").unwrap_or(30),
                ),
            },
        }
    }

    /// Applies `OPENROUTER_API_KEY`, `SERP_API_KEY` and `PORT`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = non_empty_env("OPENROUTER_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = non_empty_env("SERP_API_KEY") {
            self.search.serp_api_key = Some(key);
        }
        if let Some(port) = non_empty_env("PORT").and_then(|val| val.parse::<u16>().ok()) {
            self.server.port = port;
        }
        self
    }
}

fn str_at(config: &Value, section: &str, key: &str) -> Option<String> {
    config
        .get(section)
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
}

fn u64_at(config: &Value, section: &str, key: &str) -> Option<u64> {
    config
        .get(section)
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_u64())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|val| !val.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paths() -> AppPaths {
        AppPaths {
            project_root: PathBuf::from("/srv/retail"),
            user_data_dir: PathBuf::from("/srv/retail"),
            log_dir: PathBuf::from("/srv/retail/logs"),
            secrets_path: PathBuf::from("/srv/retail/secrets.yaml"),
        }
    }

    #[test]
    fn defaults_match_reference_policy() {
        let settings = Settings::from_config(&json!({}), &paths());

        assert_eq!(settings.agent.top_k, 5);
        assert!(settings.agent.compose_with_llm);
        assert_eq!(settings.llm.timeout, Duration::from_secs(60));
        assert_eq!(settings.search.timeout, Duration::from_secs(30));
        assert_eq!(settings.llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(settings.search.provider, "serpapi");
        assert_eq!(settings.embedding.model, "minilm");
        assert_eq!(settings.catalog.data_dir, PathBuf::from("/srv/retail/data"));
        assert!(settings.llm.api_key.is_none());
    }

    #[test]
    fn relative_data_dir_resolves_against_project_root() {
        let settings = Settings::from_config(
            &json!({ "catalog": { "data_dir": "fixtures/instacart" } }),
            &paths(),
        );
        assert_eq!(
            settings.catalog.data_dir,
            PathBuf::from("/srv/retail/fixtures/instacart")
        );
    }

    #[test]
    fn empty_api_keys_are_treated_as_missing() {
        let settings = Settings::from_config(
            &json!({ "llm": { "api_key": "" }, "search": { "serp_api_key": "  " } }),
            &paths(),
        );
        assert!(settings.llm.api_key.is_none());
        assert!(settings.search.serp_api_key.is_none());
    }
}
