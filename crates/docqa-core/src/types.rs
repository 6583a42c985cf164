//! Domain types shared by the store, the pipelines and the CLI.

use serde::{Deserialize, Serialize};

pub type Vector = Vec<f32>;

/// A retrievable piece of a source document.
///
/// - `content`: the text payload, never empty
/// - `source_path`: path the document was ingested from
/// - `source_file_name`: final path component of `source_path`
/// - `chunk_index`: zero-based position within the parent document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub content: String,
    pub source_path: String,
    pub source_file_name: String,
    pub chunk_index: usize,
}

/// A chunk together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    #[serde(flatten)]
    pub chunk: Chunk,
    pub vector: Vector,
}

impl EmbeddedChunk {
    pub fn new(chunk: Chunk, vector: Vector) -> Self {
        Self { chunk, vector }
    }

    pub fn dim(&self) -> usize {
        self.vector.len()
    }
}

/// One similarity-search hit. `score` lies in `[0, 1]`, higher is better;
/// `rank` starts at 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub record_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionSummary {
    pub chunks_created: usize,
    pub collection_name: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceMetadata {
    pub source: String,
    pub file_name: String,
    pub chunk_index: usize,
}

impl From<&Chunk> for SourceMetadata {
    fn from(chunk: &Chunk) -> Self {
        Self {
            source: chunk.source_path.clone(),
            file_name: chunk.source_file_name.clone(),
            chunk_index: chunk.chunk_index,
        }
    }
}

/// A retrieved chunk as shown to callers of `ask` and `search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceMatch {
    pub content: String,
    pub metadata: SourceMetadata,
    pub relevance_score: f32,
    pub rank: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionOptions {
    pub top_k: usize,
    pub include_metadata: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionResult {
    pub answer: String,
    pub question: String,
    pub collection_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceMatch>>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub query: String,
    pub collection_name: String,
    pub matches: Vec<SourceMatch>,
    pub total_results: usize,
}
