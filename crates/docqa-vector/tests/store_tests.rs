use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use docqa_core::traits::CollectionPersistence;
use docqa_core::types::{Chunk, EmbeddedChunk};
use docqa_core::{Error, Result};
use docqa_vector::{CollectionStore, JsonlPersistence};
use tokio::sync::Notify;

fn record(content: &str, vector: Vec<f32>) -> EmbeddedChunk {
    EmbeddedChunk::new(
        Chunk {
            content: content.to_string(),
            source_path: format!("/docs/{content}.txt"),
            source_file_name: format!("{content}.txt"),
            chunk_index: 0,
        },
        vector,
    )
}

#[tokio::test]
async fn add_creates_collection_and_appends() {
    let store = CollectionStore::new();
    assert_eq!(store.add("notes", vec![record("a", vec![1.0, 0.0])]).await.unwrap(), 1);
    assert_eq!(store.add("notes", vec![record("b", vec![0.0, 1.0])]).await.unwrap(), 2);
    assert_eq!(store.record_count("notes").await.unwrap(), 2);
    assert_eq!(store.dimension("notes").await.unwrap(), Some(2));
}

#[tokio::test]
async fn collections_are_isolated_and_listed_by_name() {
    let store = CollectionStore::new();
    store.add("zeta", vec![record("z", vec![1.0, 0.0, 0.0])]).await.unwrap();
    store.add("alpha", vec![record("a", vec![0.0, 1.0]), record("b", vec![1.0, 1.0])]).await.unwrap();

    let names: Vec<(String, usize)> =
        store.list().await.into_iter().map(|info| (info.name, info.record_count)).collect();
    assert_eq!(names, vec![("alpha".to_string(), 2), ("zeta".to_string(), 1)]);

    let hits = store.similarity_search("zeta", &[1.0, 0.0, 0.0], 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk.content, "z");
}

#[tokio::test]
async fn dimension_mismatch_leaves_collection_unchanged() {
    let store = CollectionStore::new();
    store.add("notes", vec![record("a", vec![1.0, 0.0])]).await.unwrap();

    let err = store.add("notes", vec![record("b", vec![1.0, 0.0, 0.0])]).await.unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3, .. }), "{err}");
    assert_eq!(store.record_count("notes").await.unwrap(), 1);
}

#[tokio::test]
async fn ragged_batch_does_not_create_collection() {
    let store = CollectionStore::new();
    let err = store
        .add("notes", vec![record("a", vec![1.0, 0.0]), record("b", vec![1.0])])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));
    assert!(!store.contains("notes").await);
}

#[tokio::test]
async fn search_returns_top_k_in_descending_order() {
    let store = CollectionStore::new();
    store
        .add(
            "notes",
            vec![
                record("far", vec![-1.0, 0.0]),
                record("near", vec![1.0, 0.1]),
                record("exact", vec![1.0, 0.0]),
                record("side", vec![0.0, 1.0]),
            ],
        )
        .await
        .unwrap();

    let hits = store.similarity_search("notes", &[1.0, 0.0], 3).await.unwrap();
    let contents: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
    assert_eq!(contents, vec!["exact", "near", "side"]);
    assert_eq!(hits.iter().map(|h| h.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(hits.iter().all(|h| (0.0..=1.0).contains(&h.score)));
    assert!((hits[0].score - 1.0).abs() < 1e-6);

    let all = store.similarity_search("notes", &[1.0, 0.0], 10).await.unwrap();
    assert_eq!(all.len(), 4);
    assert!(all[3].score.abs() < 1e-6);
    assert!(store.similarity_search("notes", &[1.0, 0.0], 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn equal_scores_keep_insertion_order() {
    let store = CollectionStore::new();
    let batch = ["first", "second", "third"].iter().map(|c| record(c, vec![0.5, 0.5])).collect();
    store.add("notes", batch).await.unwrap();

    let hits = store.similarity_search("notes", &[1.0, 1.0], 2).await.unwrap();
    let contents: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second"]);
}

#[tokio::test]
async fn query_dimension_must_match() {
    let store = CollectionStore::new();
    store.add("notes", vec![record("a", vec![1.0, 0.0])]).await.unwrap();
    let err = store.similarity_search("notes", &[1.0, 0.0, 0.0], 1).await.unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3, .. }));
}

#[tokio::test]
async fn unknown_and_deleted_collections_are_not_found() {
    let store = CollectionStore::new();
    assert!(matches!(
        store.similarity_search("missing", &[1.0], 1).await,
        Err(Error::CollectionNotFound(name)) if name == "missing"
    ));
    assert!(matches!(store.delete("missing").await, Err(Error::CollectionNotFound(_))));

    store.add("notes", vec![record("a", vec![1.0])]).await.unwrap();
    store.delete("notes").await.unwrap();
    assert!(matches!(store.similarity_search("notes", &[1.0], 1).await, Err(Error::CollectionNotFound(_))));
    assert!(store.list().await.is_empty());

    // Re-adding after delete starts fresh, with a new dimension allowed.
    store.add("notes", vec![record("b", vec![1.0, 0.0])]).await.unwrap();
    assert_eq!(store.record_count("notes").await.unwrap(), 1);
    assert_eq!(store.dimension("notes").await.unwrap(), Some(2));
}

#[tokio::test]
async fn empty_add_creates_empty_collection() {
    let store = CollectionStore::new();
    assert_eq!(store.add("empty", Vec::new()).await.unwrap(), 0);
    assert_eq!(store.dimension("empty").await.unwrap(), None);
    assert!(store.similarity_search("empty", &[1.0, 2.0], 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_adds_and_deletes_never_interleave_batches() {
    let store = Arc::new(CollectionStore::new());
    let mut tasks = Vec::new();
    for i in 0..16 {
        let adder = Arc::clone(&store);
        tasks.push(tokio::spawn(async move {
            let batch = (0..3).map(|j| record(&format!("{i}-{j}"), vec![i as f32, j as f32, 1.0])).collect();
            adder.add("shared", batch).await.map(|_| ())
        }));
        if i == 8 {
            let deleter = Arc::clone(&store);
            tasks.push(tokio::spawn(async move {
                match deleter.delete("shared").await {
                    Ok(()) | Err(Error::CollectionNotFound(_)) => Ok(()),
                    Err(e) => Err(e),
                }
            }));
        }
    }
    for result in futures::future::join_all(tasks).await {
        result.expect("task panicked").expect("operation failed");
    }

    if !store.contains("shared").await {
        return;
    }
    // A zero query scores every record equally, so hits come back in insertion order.
    let hits = store.similarity_search("shared", &[0.0, 0.0, 0.0], usize::MAX).await.unwrap();
    assert_eq!(hits.len(), store.record_count("shared").await.unwrap());
    assert_eq!(hits.len() % 3, 0, "count = {}", hits.len());
    for batch in hits.chunks(3) {
        let batch_id = batch[0].chunk.content.split('-').next().unwrap();
        let contents: Vec<&str> = batch.iter().map(|h| h.chunk.content.as_str()).collect();
        let expected: Vec<String> = (0..3).map(|j| format!("{batch_id}-{j}")).collect();
        assert_eq!(contents, expected, "batch {batch_id} was split or interleaved");
    }
}

#[tokio::test]
async fn concurrent_adds_to_distinct_collections() {
    let store = Arc::new(CollectionStore::new());
    let adds = (0..8).map(|i| {
        let store = Arc::clone(&store);
        async move { store.add(&format!("c{i}"), vec![record("x", vec![1.0; 4])]).await }
    });
    for result in futures::future::join_all(adds).await {
        assert_eq!(result.unwrap(), 1);
    }
    assert_eq!(store.list().await.len(), 8);
}

#[tokio::test]
async fn persisted_collections_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let persistence = Arc::new(JsonlPersistence::open(dir.path()).await.unwrap());
        let store = CollectionStore::open(persistence).await.unwrap();
        assert!(store.is_persistent());
        store.add("kept", vec![record("a", vec![1.0, 0.0])]).await.unwrap();
        store.add("kept", vec![record("b", vec![0.0, 1.0])]).await.unwrap();
        store.add("dropped", vec![record("c", vec![1.0])]).await.unwrap();
        store.delete("dropped").await.unwrap();
    }

    let persistence = Arc::new(JsonlPersistence::open(dir.path()).await.unwrap());
    let store = CollectionStore::open(persistence).await.unwrap();
    let listed = store.list().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "kept");
    assert_eq!(listed[0].record_count, 2);

    let hits = store.similarity_search("kept", &[0.0, 1.0], 1).await.unwrap();
    assert_eq!(hits[0].chunk.content, "b");

    let files = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(files, 1);
}

fn only_file(dir: &Path) -> PathBuf {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(files.len(), 1);
    files.remove(0)
}

fn tear_tail(dir: &Path) {
    let file = only_file(dir);
    let mut raw = std::fs::read_to_string(&file).unwrap();
    raw.push_str("{\"chunk\":{\"content\":\"half");
    std::fs::write(&file, raw).unwrap();
}

async fn reopen(dir: &Path) -> CollectionStore {
    let persistence = Arc::new(JsonlPersistence::open(dir).await.unwrap());
    CollectionStore::open(persistence).await.unwrap()
}

#[tokio::test]
async fn truncated_trailing_record_is_dropped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = JsonlPersistence::open(dir.path()).await.unwrap();
    persistence.append("notes", &[record("a", vec![1.0])]).await.unwrap();
    tear_tail(dir.path());

    let loaded = persistence.load_all().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].0, "notes");
    assert_eq!(loaded[0].1.len(), 1);

    let raw = std::fs::read_to_string(only_file(dir.path())).unwrap();
    assert!(raw.ends_with('\n'));
    assert!(!raw.contains("half"));
}

#[tokio::test]
async fn appends_after_a_torn_tail_survive_restarts() {
    let dir = tempfile::tempdir().unwrap();
    reopen(dir.path()).await.add("notes", vec![record("a", vec![1.0, 0.0])]).await.unwrap();
    tear_tail(dir.path());

    let store = reopen(dir.path()).await;
    assert_eq!(store.record_count("notes").await.unwrap(), 1);
    store.add("notes", vec![record("b", vec![0.0, 1.0])]).await.unwrap();
    drop(store);

    let store = reopen(dir.path()).await;
    assert_eq!(store.record_count("notes").await.unwrap(), 2);
    store.add("notes", vec![record("c", vec![1.0, 1.0])]).await.unwrap();
    drop(store);

    let store = reopen(dir.path()).await;
    let hits = store.similarity_search("notes", &[0.0, 0.0], 10).await.unwrap();
    let contents: Vec<&str> = hits.iter().map(|h| h.chunk.content.as_str()).collect();
    assert_eq!(contents, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn emptied_file_gets_a_fresh_header() {
    let dir = tempfile::tempdir().unwrap();
    let persistence = JsonlPersistence::open(dir.path()).await.unwrap();
    persistence.append("notes", &[record("a", vec![1.0])]).await.unwrap();
    std::fs::write(only_file(dir.path()), "").unwrap();
    assert!(persistence.load_all().await.unwrap().is_empty());

    persistence.append("notes", &[record("b", vec![1.0])]).await.unwrap();
    let loaded = persistence.load_all().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].0, "notes");
    assert_eq!(loaded[0].1[0].chunk.content, "b");
}

struct FailingPersistence;

#[async_trait]
impl CollectionPersistence for FailingPersistence {
    async fn load_all(&self) -> Result<Vec<(String, Vec<EmbeddedChunk>)>> {
        Ok(Vec::new())
    }

    async fn append(&self, collection: &str, _records: &[EmbeddedChunk]) -> Result<()> {
        Err(Error::persistence(collection, "disk full"))
    }

    async fn remove(&self, collection: &str) -> Result<()> {
        Err(Error::persistence(collection, "read-only"))
    }
}

#[tokio::test]
async fn failed_persistence_leaves_memory_untouched() {
    let store = CollectionStore::open(Arc::new(FailingPersistence)).await.unwrap();
    let err = store.add("notes", vec![record("a", vec![1.0])]).await.unwrap_err();
    assert!(matches!(err, Error::Persistence { .. }));
    assert!(!store.contains("notes").await);
    assert!(store.list().await.is_empty());
}

#[derive(Default)]
struct GatedPersistence {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl CollectionPersistence for GatedPersistence {
    async fn load_all(&self) -> Result<Vec<(String, Vec<EmbeddedChunk>)>> {
        Ok(Vec::new())
    }

    async fn append(&self, collection: &str, _records: &[EmbeddedChunk]) -> Result<()> {
        self.entered.notify_one();
        self.release.notified().await;
        Err(Error::persistence(collection, "disk full"))
    }

    async fn remove(&self, _collection: &str) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn readers_never_see_a_collection_whose_creation_fails() {
    let gate = Arc::new(GatedPersistence::default());
    let store = Arc::new(CollectionStore::open(Arc::clone(&gate) as Arc<dyn CollectionPersistence>).await.unwrap());

    let adder = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { store.add("notes", vec![record("a", vec![1.0])]).await })
    };
    gate.entered.notified().await;

    let reader = {
        let store = Arc::clone(&store);
        tokio::spawn(async move { (store.contains("notes").await, store.list().await) })
    };
    tokio::task::yield_now().await;
    gate.release.notify_one();

    assert!(matches!(adder.await.unwrap(), Err(Error::Persistence { .. })));
    let (contained, listed) = reader.await.unwrap();
    assert!(!contained);
    assert!(listed.is_empty());
}
