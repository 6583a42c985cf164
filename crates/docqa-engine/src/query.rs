//! Question answering and plain semantic search over one collection.

use std::sync::Arc;

use tracing::{debug, info};

use docqa_core::config::{RetrievalConfig, TimeoutConfig};
use docqa_core::traits::{Answerer, Embedder};
use docqa_core::types::{QuestionOptions, QuestionResult, ScoredChunk, SearchResult, SourceMatch, SourceMetadata};
use docqa_core::{Error, Result};
use docqa_vector::CollectionStore;

use crate::confidence::confidence;
use crate::context::{compose_context, snippet};
use crate::timeout::bounded;

pub struct QueryPipeline {
    embedder: Arc<dyn Embedder>,
    answerer: Arc<dyn Answerer>,
    store: Arc<CollectionStore>,
    retrieval: RetrievalConfig,
    timeouts: TimeoutConfig,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        answerer: Arc<dyn Answerer>,
        store: Arc<CollectionStore>,
        retrieval: RetrievalConfig,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self { embedder, answerer, store, retrieval, timeouts }
    }

    /// Answer `question` from the `top_k` closest chunks of `collection`.
    ///
    /// An unknown collection fails with [`Error::CollectionNotFound`]. Any
    /// failure while embedding, retrieving or generating is returned wrapped in
    /// [`Error::Answering`]; no partial result is produced.
    pub async fn answer(&self, question: &str, collection: &str, options: QuestionOptions) -> Result<QuestionResult> {
        if question.trim().is_empty() {
            return Err(Error::InvalidRequest("question must not be empty".into()));
        }
        if options.top_k == 0 {
            return Err(Error::InvalidRequest("top_k must be at least 1".into()));
        }
        if !self.store.contains(collection).await {
            return Err(Error::CollectionNotFound(collection.to_string()));
        }

        let retrieved = self
            .retrieve(question, collection, options.top_k)
            .await
            .map_err(|e| answering_error(question, collection, e))?;
        let context = compose_context(&retrieved, self.retrieval.max_context_chars);
        let answer = bounded(
            "answer generation",
            self.timeouts.answer(),
            self.answerer.answer(question, &context),
        )
        .await
        .map_err(|e| answering_error(question, collection, e))?;

        let contents: Vec<&str> = retrieved.iter().map(|scored| scored.chunk.content.as_str()).collect();
        let confidence = confidence(question, &contents);
        info!(collection, retrieved = retrieved.len(), confidence, "question answered");

        let sources = options.include_metadata.then(|| {
            retrieved
                .iter()
                .map(|scored| source_match(scored, snippet(&scored.chunk.content, self.retrieval.snippet_chars)))
                .collect()
        });
        Ok(QuestionResult {
            answer,
            question: question.to_string(),
            collection_name: collection.to_string(),
            sources,
            confidence,
        })
    }

    /// Ranked chunks for `query` with their full content; no answer is generated.
    pub async fn search(&self, query: &str, collection: &str, limit: usize) -> Result<SearchResult> {
        if query.trim().is_empty() {
            return Err(Error::InvalidRequest("query must not be empty".into()));
        }
        if limit == 0 || limit > self.retrieval.max_search_limit {
            return Err(Error::InvalidRequest(format!(
                "limit must be between 1 and {}, got {limit}",
                self.retrieval.max_search_limit
            )));
        }
        if !self.store.contains(collection).await {
            return Err(Error::CollectionNotFound(collection.to_string()));
        }

        let hits = self.retrieve(query, collection, limit).await?;
        let matches: Vec<SourceMatch> =
            hits.iter().map(|scored| source_match(scored, scored.chunk.content.clone())).collect();
        debug!(collection, limit, found = matches.len(), "search finished");
        Ok(SearchResult {
            query: query.to_string(),
            collection_name: collection.to_string(),
            total_results: matches.len(),
            matches,
        })
    }

    async fn retrieve(&self, text: &str, collection: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let vector = bounded("query embedding", self.timeouts.embed(), self.embedder.embed_one(text)).await?;
        self.store.similarity_search(collection, &vector, k).await
    }
}

fn source_match(scored: &ScoredChunk, content: String) -> SourceMatch {
    SourceMatch {
        content,
        metadata: SourceMetadata::from(&scored.chunk),
        relevance_score: scored.score,
        rank: scored.rank,
    }
}

/// A collection deleted mid-question still reads as not found.
fn answering_error(question: &str, collection: &str, source: Error) -> Error {
    match source {
        not_found @ Error::CollectionNotFound(_) => not_found,
        source => Error::Answering {
            question: question.to_string(),
            collection: collection.to_string(),
            source: Box::new(source),
        },
    }
}
