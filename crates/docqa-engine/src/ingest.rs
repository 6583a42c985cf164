//! Ingestion pipeline: extract, chunk, embed once per document, store.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use docqa_core::chunker::TextSplitter;
use docqa_core::traits::{Embedder, TextExtractor};
use docqa_core::types::{Chunk, EmbeddedChunk, IngestionSummary};
use docqa_core::{Error, Result};
use docqa_vector::CollectionStore;

use crate::timeout::bounded;

pub struct IngestionPipeline {
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn Embedder>,
    store: Arc<CollectionStore>,
    splitter: TextSplitter,
    embed_timeout: Duration,
    concurrency: usize,
}

impl IngestionPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn Embedder>,
        store: Arc<CollectionStore>,
        splitter: TextSplitter,
        embed_timeout: Duration,
    ) -> Self {
        Self { extractor, embedder, store, splitter, embed_timeout, concurrency: 1 }
    }

    /// Upper bound on documents processed at once by [`Self::ingest_many`].
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Add one document to `collection`. Repeated ingestion of the same file
    /// appends a fresh set of chunks; nothing is de-duplicated.
    pub async fn ingest(&self, path: &Path, collection: &str) -> Result<IngestionSummary> {
        if collection.trim().is_empty() {
            return Err(Error::InvalidRequest("collection name must not be empty".into()));
        }
        let source_path = path.display().to_string();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| source_path.clone());
        info!(path = %source_path, collection, "ingesting document");

        let text = self.extractor.extract(path).await?;
        let pieces = self.splitter.split(&text);
        debug!(path = %source_path, chars = text.chars().count(), chunks = pieces.len(), "document chunked");

        let vectors = if pieces.is_empty() {
            Vec::new()
        } else {
            bounded("document embedding", self.embed_timeout, self.embedder.embed_batch(&pieces)).await?
        };
        if vectors.len() != pieces.len() {
            return Err(Error::Embedding(format!(
                "{} returned {} vectors for {} chunks",
                self.embedder.id(),
                vectors.len(),
                pieces.len()
            )));
        }

        let records: Vec<EmbeddedChunk> = pieces
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(chunk_index, (content, vector))| {
                EmbeddedChunk::new(
                    Chunk {
                        content,
                        source_path: source_path.clone(),
                        source_file_name: file_name.clone(),
                        chunk_index,
                    },
                    vector,
                )
            })
            .collect();
        let chunks_created = records.len();
        let total = self.store.add(collection, records).await?;

        info!(path = %source_path, collection, chunks_created, total, "document ingested");
        Ok(IngestionSummary { chunks_created, collection_name: collection.to_string(), file_name })
    }

    /// Ingest several documents, at most `concurrency` at a time. Results come
    /// back in input order, one per path.
    pub async fn ingest_many<P>(&self, paths: &[P], collection: &str) -> Vec<Result<IngestionSummary>>
    where
        P: AsRef<Path>,
    {
        stream::iter(paths)
            .map(|path| self.ingest(path.as_ref(), collection))
            .buffered(self.concurrency)
            .collect()
            .await
    }
}
