use std::path::Path;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::{EmbeddedChunk, Vector};

/// Maps text to fixed-length vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `stub:d384`).
    fn id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// One vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>>;

    async fn embed_one(&self, text: &str) -> Result<Vector> {
        self.embed_batch(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| Error::Embedding(format!("{} returned no vector", self.id())))
    }
}

/// Produces a natural-language answer from a question and retrieved context.
#[async_trait]
pub trait Answerer: Send + Sync {
    fn id(&self) -> &str;
    async fn answer(&self, question: &str, context: &str) -> Result<String>;
}

/// Turns a file on disk into raw text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String>;
}

/// Durable mirror of the collection store, keyed by collection name.
#[async_trait]
pub trait CollectionPersistence: Send + Sync {
    /// Every persisted collection with its records in insertion order.
    async fn load_all(&self) -> Result<Vec<(String, Vec<EmbeddedChunk>)>>;
    /// Append records, creating the collection's storage if needed.
    async fn append(&self, collection: &str, records: &[EmbeddedChunk]) -> Result<()>;
    /// Release all storage held for the collection.
    async fn remove(&self, collection: &str) -> Result<()>;
}
