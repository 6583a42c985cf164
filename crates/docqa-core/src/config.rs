//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge compiled defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_CHUNKING__CHUNK_SIZE`). Paths accept `~` and `${VAR}`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            other => tracing::warn!(env = other, "unknown RUST_ENV, using config.toml only"),
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        tracing::debug!(env = env_name, "configuration sources merged");
        Ok(Self { figment })
    }

    /// The full typed engine configuration, validated.
    pub fn engine(&self) -> anyhow::Result<EngineConfig> {
        let config: EngineConfig = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read engine configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub chunking: ChunkingConfig,
    pub collections: CollectionConfig,
    pub retrieval: RetrievalConfig,
    pub ingestion: IngestionConfig,
    pub timeouts: TimeoutConfig,
    pub provider: ProviderConfig,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be greater than zero".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.collections.default_name.trim().is_empty() {
            return Err(Error::InvalidConfig("collections.default_name must not be empty".into()));
        }
        if self.retrieval.top_k == 0 || self.retrieval.search_limit == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k and retrieval.search_limit must be at least 1".into()));
        }
        if self.retrieval.search_limit > self.retrieval.max_search_limit {
            return Err(Error::InvalidConfig(format!(
                "retrieval.search_limit ({}) exceeds retrieval.max_search_limit ({})",
                self.retrieval.search_limit, self.retrieval.max_search_limit
            )));
        }
        if self.ingestion.concurrency == 0 {
            return Err(Error::InvalidConfig("ingestion.concurrency must be at least 1".into()));
        }
        if self.timeouts.embed_secs == 0 || self.timeouts.answer_secs == 0 {
            return Err(Error::InvalidConfig("timeouts must be greater than zero".into()));
        }
        if self.provider.stub_dim == 0 || self.provider.embedding_dim == 0 {
            return Err(Error::InvalidConfig("embedding dimensions must be greater than zero".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub default_name: String,
    /// Directory mirroring every collection on disk; `None` keeps them in memory only.
    pub persist_dir: Option<String>,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self { default_name: "default".to_string(), persist_dir: Some("./vector_store".to_string()) }
    }
}

impl CollectionConfig {
    pub fn persist_path(&self) -> Option<PathBuf> {
        self.persist_dir.as_deref().map(expand_path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub search_limit: usize,
    pub max_search_limit: usize,
    pub max_context_chars: usize,
    pub snippet_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4, search_limit: 5, max_search_limit: 20, max_context_chars: 4000, snippet_chars: 200 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    pub max_file_size: u64,
    pub concurrency: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self { max_file_size: 10 * 1024 * 1024, concurrency: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub embed_secs: u64,
    pub answer_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { embed_secs: 30, answer_secs: 60 }
    }
}

impl TimeoutConfig {
    pub fn embed(&self) -> Duration {
        Duration::from_secs(self.embed_secs)
    }

    pub fn answer(&self) -> Duration {
        Duration::from_secs(self.answer_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI when an API key is available, stand-ins otherwise.
    #[default]
    Auto,
    OpenAi,
    Stub,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub chat_model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stub_dim: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Auto,
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dim: 1536,
            chat_model: "gpt-3.5-turbo".to_string(),
            max_tokens: 1000,
            temperature: 0.1,
            stub_dim: 384,
        }
    }
}

impl ProviderConfig {
    /// Configured key, falling back to `OPENAI_API_KEY`. Blank keys count as absent.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| env::var("OPENAI_API_KEY").ok())
            .filter(|key| !key.trim().is_empty())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
