//! JSON Lines mirror of the collection store.
//!
//! One file per collection named after the blake3 hash of the collection name,
//! so arbitrary names map to safe file names. The first line is a header
//! carrying the real name; every following line is one embedded chunk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use docqa_core::traits::CollectionPersistence;
use docqa_core::types::EmbeddedChunk;
use docqa_core::{Error, Result};

const EXTENSION: &str = "jsonl";

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    collection: String,
    /// Unix milliseconds.
    created_at: i64,
}

#[derive(Debug, Clone)]
pub struct JsonlPersistence {
    dir: PathBuf,
}

impl JsonlPersistence {
    /// Use `dir` for collection files, creating it if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::persistence("*", format!("cannot create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    fn path_for(&self, collection: &str) -> PathBuf {
        let hash = blake3::hash(collection.as_bytes()).to_hex();
        self.dir.join(format!("{}.{EXTENSION}", &hash.as_str()[..32]))
    }

    /// Parse one collection file. An unreadable final line is what an
    /// interrupted append leaves behind; it is cut off the file so later
    /// appends start on a clean line.
    async fn load_file(path: &Path) -> Result<Option<(String, Vec<EmbeddedChunk>)>> {
        let raw = tokio::fs::read(path)
            .await
            .map_err(|e| Error::persistence("*", format!("cannot read {}: {e}", path.display())))?;

        let mut lines: Vec<(u64, &[u8])> = Vec::new();
        let mut offset = 0u64;
        for line in raw.split_inclusive(|b| *b == b'\n') {
            if !line.iter().all(u8::is_ascii_whitespace) {
                lines.push((offset, line));
            }
            offset += line.len() as u64;
        }
        let Some((&(_, header), body)) = lines.split_first() else {
            warn!(path = %path.display(), "skipping empty collection file");
            return Ok(None);
        };
        let header: Header = match serde_json::from_slice(header) {
            Ok(header) => header,
            Err(e) if body.is_empty() => {
                warn!(path = %path.display(), error = %e, "discarding torn collection header");
                truncate(path, 0).await?;
                return Ok(None);
            }
            Err(e) => {
                return Err(Error::persistence("*", format!("bad header in {}: {e}", path.display())));
            }
        };

        let mut records = Vec::with_capacity(body.len());
        for (i, &(start, line)) in body.iter().enumerate() {
            match serde_json::from_slice::<EmbeddedChunk>(line) {
                Ok(record) => records.push(record),
                Err(e) if i + 1 == body.len() => {
                    warn!(collection = %header.collection, error = %e, "dropping truncated trailing record");
                    truncate(path, start).await?;
                }
                Err(e) => return Err(Error::persistence(&header.collection, format!("record {i}: {e}"))),
            }
        }
        Ok(Some((header.collection, records)))
    }
}

async fn truncate(path: &Path, len: u64) -> Result<()> {
    cut_to(path, len)
        .await
        .map_err(|e| Error::persistence("*", format!("cannot truncate {}: {e}", path.display())))
}

async fn cut_to(path: &Path, len: u64) -> std::io::Result<()> {
    let file = tokio::fs::OpenOptions::new().write(true).open(path).await?;
    file.set_len(len).await?;
    file.sync_data().await
}

async fn write_synced(file: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_data().await
}

#[async_trait]
impl CollectionPersistence for JsonlPersistence {
    async fn load_all(&self) -> Result<Vec<(String, Vec<EmbeddedChunk>)>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| Error::persistence("*", format!("cannot list {}: {e}", self.dir.display())))?;

        let mut collections = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Error::persistence("*", e))? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(loaded) = Self::load_file(&path).await? {
                debug!(collection = %loaded.0, records = loaded.1.len(), "loaded collection file");
                collections.push(loaded);
            }
        }
        collections.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(collections)
    }

    async fn append(&self, collection: &str, records: &[EmbeddedChunk]) -> Result<()> {
        let mut body = String::new();
        for record in records {
            body.push_str(&serde_json::to_string(record).map_err(|e| Error::persistence(collection, e))?);
            body.push('\n');
        }

        let path = self.path_for(collection);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| Error::persistence(collection, format!("cannot open {}: {e}", path.display())))?;
        let start = file.metadata().await.map_err(|e| Error::persistence(collection, e))?.len();

        let mut buf = String::new();
        if start == 0 {
            let header = Header { collection: collection.to_string(), created_at: chrono::Utc::now().timestamp_millis() };
            buf.push_str(&serde_json::to_string(&header).map_err(|e| Error::persistence(collection, e))?);
            buf.push('\n');
        }
        buf.push_str(&body);

        if let Err(e) = write_synced(&mut file, buf.as_bytes()).await {
            // A batch is on disk whole or not at all.
            if let Err(undo) = file.set_len(start).await {
                warn!(collection, error = %undo, "could not roll back partial append");
            }
            return Err(Error::persistence(collection, e));
        }
        Ok(())
    }

    async fn remove(&self, collection: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(collection)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::persistence(collection, e)),
        }
    }
}
