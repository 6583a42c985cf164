//! docqa-engine
//!
//! Wires extraction, chunking, embedding, storage and answering into the
//! operations exposed to callers: ingest, ask, search, list and delete.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod confidence;
pub mod context;
pub mod ingest;
pub mod query;
pub mod timeout;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use docqa_core::chunker::TextSplitter;
use docqa_core::config::EngineConfig;
use docqa_core::traits::TextExtractor;
use docqa_core::types::{CollectionInfo, IngestionSummary, QuestionOptions, QuestionResult, SearchResult};
use docqa_core::Result;
use docqa_embed::{select_providers, Providers};
use docqa_text::FileExtractor;
use docqa_vector::{CollectionStore, JsonlPersistence};

pub use ingest::IngestionPipeline;
pub use query::QueryPipeline;

/// Document question-answering engine over named collections.
pub struct Engine {
    config: EngineConfig,
    store: Arc<CollectionStore>,
    ingestion: IngestionPipeline,
    query: QueryPipeline,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        providers: Providers,
        extractor: Arc<dyn TextExtractor>,
        store: Arc<CollectionStore>,
    ) -> Result<Self> {
        config.validate()?;
        let splitter = TextSplitter::from_config(&config.chunking)?;
        let ingestion = IngestionPipeline::new(
            extractor,
            Arc::clone(&providers.embedder),
            Arc::clone(&store),
            splitter,
            config.timeouts.embed(),
        )
        .with_concurrency(config.ingestion.concurrency);
        let query = QueryPipeline::new(
            providers.embedder,
            providers.answerer,
            Arc::clone(&store),
            config.retrieval.clone(),
            config.timeouts.clone(),
        );
        Ok(Self { config, store, ingestion, query })
    }

    /// Engine with providers chosen from `config.provider`, the file extractor
    /// and a store rehydrated from `collections.persist_dir` when one is set.
    pub async fn from_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let providers = select_providers(&config.provider)?;
        let extractor = Arc::new(FileExtractor::with_max_file_size(config.ingestion.max_file_size));
        let store = match config.collections.persist_path() {
            Some(dir) => {
                info!(dir = %dir.display(), "using persistent collection store");
                CollectionStore::open(Arc::new(JsonlPersistence::open(dir).await?)).await?
            }
            None => CollectionStore::new(),
        };
        Self::new(config, providers, extractor, Arc::new(store))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<CollectionStore> {
        &self.store
    }

    pub fn default_collection(&self) -> &str {
        &self.config.collections.default_name
    }

    /// `top_k` from configuration, metadata included.
    pub fn default_question_options(&self) -> QuestionOptions {
        QuestionOptions { top_k: self.config.retrieval.top_k, include_metadata: true }
    }

    pub async fn ingest(&self, path: impl AsRef<Path>, collection: &str) -> Result<IngestionSummary> {
        self.ingestion.ingest(path.as_ref(), collection).await
    }

    pub async fn ingest_many<P: AsRef<Path>>(&self, paths: &[P], collection: &str) -> Vec<Result<IngestionSummary>> {
        self.ingestion.ingest_many(paths, collection).await
    }

    pub async fn ask(&self, question: &str, collection: &str, options: QuestionOptions) -> Result<QuestionResult> {
        self.query.answer(question, collection, options).await
    }

    /// Semantic search; `limit` defaults to `retrieval.search_limit`.
    pub async fn search(&self, query: &str, collection: &str, limit: Option<usize>) -> Result<SearchResult> {
        let limit = limit.unwrap_or(self.config.retrieval.search_limit);
        self.query.search(query, collection, limit).await
    }

    pub async fn list_collections(&self) -> Vec<CollectionInfo> {
        self.store.list().await
    }

    pub async fn delete_collection(&self, name: &str) -> Result<()> {
        self.store.delete(name).await
    }
}
