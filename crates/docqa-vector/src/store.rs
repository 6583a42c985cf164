use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::{debug, info};

use docqa_core::traits::CollectionPersistence;
use docqa_core::types::{CollectionInfo, EmbeddedChunk, ScoredChunk};
use docqa_core::{Error, Result};

use crate::similarity::similarity_score;

#[derive(Debug, Default)]
struct Collection {
    /// Fixed by the first non-empty insert.
    dim: Option<usize>,
    records: Vec<EmbeddedChunk>,
    /// Set under the write lock when the collection is dropped from the map;
    /// writers holding a stale handle retry against the map.
    deleted: bool,
}

impl Collection {
    fn from_records(records: Vec<EmbeddedChunk>) -> Self {
        Self { dim: records.first().map(EmbeddedChunk::dim), records, deleted: false }
    }
}

type SharedCollection = Arc<RwLock<Collection>>;

/// Concurrency-safe map from collection name to its records.
///
/// The outer map lock is only held for lookups and membership changes. Each
/// collection has its own lock, so `add`/`delete` on one name exclude reads
/// of that name while other collections proceed untouched. When persistence
/// is wired, every `add` and `delete` is mirrored before the in-memory change.
pub struct CollectionStore {
    collections: RwLock<HashMap<String, SharedCollection>>,
    persistence: Option<Arc<dyn CollectionPersistence>>,
}

impl Default for CollectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionStore {
    /// In-memory store without persistence.
    pub fn new() -> Self {
        Self { collections: RwLock::new(HashMap::new()), persistence: None }
    }

    /// Store mirrored to `persistence`, rehydrated from what it already holds.
    pub async fn open(persistence: Arc<dyn CollectionPersistence>) -> Result<Self> {
        let mut map = HashMap::new();
        for (name, records) in persistence.load_all().await? {
            uniform_dim(&name, &records)?;
            debug!(collection = %name, records = records.len(), "rehydrated collection");
            map.insert(name, Arc::new(RwLock::new(Collection::from_records(records))));
        }
        info!(collections = map.len(), "opened persistent collection store");
        Ok(Self { collections: RwLock::new(map), persistence: Some(persistence) })
    }

    pub fn is_persistent(&self) -> bool {
        self.persistence.is_some()
    }

    /// Append records, creating the collection if absent. All-or-nothing: on
    /// error the collection is left exactly as it was.
    pub async fn add(&self, name: &str, records: Vec<EmbeddedChunk>) -> Result<usize> {
        let batch_dim = uniform_dim(name, &records)?;
        loop {
            let (mut coll, shared, created) = self.lock_or_create(name).await;
            if coll.deleted {
                continue;
            }
            if let (Some(expected), Some(actual)) = (coll.dim, batch_dim) {
                if expected != actual {
                    return Err(Error::DimensionMismatch { collection: name.to_string(), expected, actual });
                }
            }
            if let Some(persistence) = &self.persistence {
                if let Err(e) = persistence.append(name, &records).await {
                    if created {
                        self.discard(name, &shared, &mut coll).await;
                    }
                    return Err(e);
                }
            }
            if created {
                info!(collection = name, "created collection");
            }
            if coll.dim.is_none() {
                coll.dim = batch_dim;
            }
            let added = records.len();
            coll.records.extend(records);
            debug!(collection = name, added, total = coll.records.len(), "appended records");
            return Ok(coll.records.len());
        }
    }

    /// Top `k` records by descending similarity to `query`. Equal scores keep
    /// insertion order.
    pub async fn similarity_search(&self, name: &str, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let shared = self.get(name).await?;
        let coll = shared.read().await;
        if coll.deleted {
            return Err(Error::CollectionNotFound(name.to_string()));
        }
        if let Some(dim) = coll.dim {
            if dim != query.len() {
                return Err(Error::DimensionMismatch { collection: name.to_string(), expected: dim, actual: query.len() });
            }
        }

        let mut scored: Vec<(f32, &EmbeddedChunk)> =
            coll.records.iter().map(|record| (similarity_score(query, &record.vector), record)).collect();
        // sort_by is stable
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(i, (score, record))| ScoredChunk { chunk: record.chunk.clone(), score, rank: i + 1 })
            .collect())
    }

    /// Every live collection with its record count, sorted by name.
    pub async fn list(&self) -> Vec<CollectionInfo> {
        let entries: Vec<(String, SharedCollection)> = self
            .collections
            .read()
            .await
            .iter()
            .map(|(name, shared)| (name.clone(), Arc::clone(shared)))
            .collect();

        let mut infos = Vec::with_capacity(entries.len());
        for (name, shared) in entries {
            let coll = shared.read().await;
            if !coll.deleted {
                infos.push(CollectionInfo { name, record_count: coll.records.len() });
            }
        }
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Remove the collection and release its persisted storage. Waits for any
    /// in-flight `add` on the same name to finish first.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let shared = self.get(name).await?;
        let mut coll = shared.write().await;
        if coll.deleted {
            return Err(Error::CollectionNotFound(name.to_string()));
        }
        if let Some(persistence) = &self.persistence {
            persistence.remove(name).await?;
        }
        let released = coll.records.len();
        self.discard(name, &shared, &mut coll).await;
        info!(collection = name, records = released, "deleted collection");
        Ok(())
    }

    /// Waits for an in-flight `add` or `delete` on `name` to settle.
    pub async fn contains(&self, name: &str) -> bool {
        match self.get(name).await {
            Ok(shared) => !shared.read().await.deleted,
            Err(_) => false,
        }
    }

    pub async fn record_count(&self, name: &str) -> Result<usize> {
        let shared = self.get(name).await?;
        let coll = shared.read().await;
        if coll.deleted {
            return Err(Error::CollectionNotFound(name.to_string()));
        }
        Ok(coll.records.len())
    }

    /// Vector dimensionality of the collection, `None` while it is empty.
    pub async fn dimension(&self, name: &str) -> Result<Option<usize>> {
        let shared = self.get(name).await?;
        let coll = shared.read().await;
        if coll.deleted {
            return Err(Error::CollectionNotFound(name.to_string()));
        }
        Ok(coll.dim)
    }

    async fn get(&self, name: &str) -> Result<SharedCollection> {
        self.collections
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::CollectionNotFound(name.to_string()))
    }

    /// Write-locked handle for `name`, creating the collection if absent.
    /// A new collection is locked before it is published in the map, so no
    /// reader can observe it until the creating `add` has settled.
    async fn lock_or_create(&self, name: &str) -> (OwnedRwLockWriteGuard<Collection>, SharedCollection, bool) {
        let existing = self.collections.read().await.get(name).cloned();
        if let Some(shared) = existing {
            return (Arc::clone(&shared).write_owned().await, shared, false);
        }
        let mut map = self.collections.write().await;
        if let Some(shared) = map.get(name).cloned() {
            drop(map);
            return (Arc::clone(&shared).write_owned().await, shared, false);
        }
        let shared = SharedCollection::default();
        // fresh lock, nobody else can hold it
        let guard = Arc::clone(&shared).write_owned().await;
        map.insert(name.to_string(), Arc::clone(&shared));
        (guard, shared, true)
    }

    /// Mark `coll` dead and unlink it from the map. Caller holds its write lock.
    async fn discard(&self, name: &str, shared: &SharedCollection, coll: &mut Collection) {
        coll.deleted = true;
        coll.dim = None;
        coll.records = Vec::new();
        let mut map = self.collections.write().await;
        if map.get(name).is_some_and(|current| Arc::ptr_eq(current, shared)) {
            map.remove(name);
        }
    }
}

/// Shared dimensionality of a batch, `None` for an empty batch.
fn uniform_dim(collection: &str, records: &[EmbeddedChunk]) -> Result<Option<usize>> {
    let Some(first) = records.first() else {
        return Ok(None);
    };
    let expected = first.dim();
    match records.iter().find(|record| record.dim() != expected) {
        Some(bad) => Err(Error::DimensionMismatch { collection: collection.to_string(), expected, actual: bad.dim() }),
        None => Ok(Some(expected)),
    }
}
