use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use projectrag_common::{RagError, Result};
use projectrag_llm::{ensure_finite, Embedder};
use projectrag_vector::{VectorIndex, VectorRecord};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::source::{ProjectSource, SourceRecord};

/// Outcome of one indexing run
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    /// Records embedded and upserted
    pub processed: usize,

    /// Records excluded for a blank description
    pub skipped: usize,

    /// Records that had no primary key and got a positional id
    pub positional_ids: usize,

    pub finished_at: DateTime<Utc>,
}

/// Builds the vector index from the project store
pub struct Indexer {
    source: Arc<dyn ProjectSource>,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Indexer {
    pub fn new(
        source: Arc<dyn ProjectSource>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            source,
            embedder,
            index,
        }
    }

    /// Fetch, filter, embed and upsert every eligible project.
    ///
    /// All-or-nothing: any embedding failure aborts the run before the upsert.
    pub async fn run(&self) -> Result<IndexReport> {
        let records = self.source.fetch_all().await?;
        let total = records.len();

        let eligible: Vec<SourceRecord> = records
            .into_iter()
            .filter(|record| {
                let keep = record.is_eligible();
                if !keep {
                    debug!("Skipping project without description: {:?}", record.name);
                }
                keep
            })
            .collect();
        let skipped = total - eligible.len();

        info!(
            "Indexing {} of {} projects ({} skipped)",
            eligible.len(),
            total,
            skipped
        );

        let batch = self.build_batch(&eligible).await?;
        ensure_unique_ids(&batch)?;
        let processed = batch.len();

        let positional_ids = eligible.iter().filter(|r| r.stable_id().is_none()).count();
        if positional_ids > 0 {
            warn!(
                "{} projects have no primary key; their vector ids follow fetch order and may drift between runs",
                positional_ids
            );
        }

        if !batch.is_empty() {
            self.index.upsert(batch).await?;
        }

        info!("Indexing completed: {} projects processed", processed);

        Ok(IndexReport {
            processed,
            skipped,
            positional_ids,
            finished_at: Utc::now(),
        })
    }

    /// Embed all records concurrently; the first failure cancels the rest
    async fn build_batch(&self, eligible: &[SourceRecord]) -> Result<Vec<VectorRecord>> {
        let tasks = eligible
            .iter()
            .enumerate()
            .map(|(position, record)| self.build_record(position, record));

        try_join_all(tasks).await
    }

    async fn build_record(&self, position: usize, record: &SourceRecord) -> Result<VectorRecord> {
        let id = record_id(position, record);
        let description = record.description.as_deref().unwrap_or_default();

        let values = self
            .embedder
            .embed(description)
            .await
            .and_then(|values| ensure_finite(&values).map(|_| values))
            .map_err(|e| match e {
                RagError::Embedding(message) => {
                    RagError::embedding(format!("Project {}: {}", id, message))
                }
                other => other,
            })?;

        debug!("Embedded project {} ({} dims)", id, values.len());

        Ok(VectorRecord {
            id,
            values,
            metadata: record.to_metadata()?,
        })
    }
}

/// A repeated id would make the index keep only one of the records
fn ensure_unique_ids(batch: &[VectorRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(batch.len());
    let clashes: BTreeSet<&str> = batch
        .iter()
        .map(|record| record.id.as_str())
        .filter(|id| !seen.insert(*id))
        .collect();

    if clashes.is_empty() {
        return Ok(());
    }

    Err(RagError::source(format!(
        "Duplicate vector ids {:?}; primary keys must be unique and must not collide with positional ids",
        clashes
    )))
}

/// Primary key when present, otherwise the position among eligible records
pub fn record_id(position: usize, record: &SourceRecord) -> String {
    record
        .stable_id()
        .map(str::to_string)
        .unwrap_or_else(|| position.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use projectrag_vector::{IndexStats, QueryMatch};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StaticSource(Vec<SourceRecord>);

    #[async_trait]
    impl ProjectSource for StaticSource {
        async fn fetch_all(&self) -> Result<Vec<SourceRecord>> {
            Ok(self.0.clone())
        }
    }

    /// Embeds text as `[len, 1.0]`; fails or returns NaN for chosen inputs
    #[derive(Default)]
    struct FakeEmbedder {
        fail_on: Option<&'static str>,
        nan_on: Option<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(text) {
                return Err(RagError::embedding("model timed out"));
            }
            if self.nan_on == Some(text) {
                return Ok(vec![f32::NAN, 1.0]);
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        upserts: Mutex<Vec<Vec<VectorRecord>>>,
    }

    impl RecordingIndex {
        fn upserted(&self) -> Vec<Vec<VectorRecord>> {
            self.upserts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn upsert(&self, records: Vec<VectorRecord>) -> Result<()> {
            self.upserts.lock().unwrap().push(records);
            Ok(())
        }

        async fn query(&self, _vector: &[f32], _top_k: usize) -> Result<Vec<QueryMatch>> {
            Ok(Vec::new())
        }

        async fn stats(&self) -> Result<IndexStats> {
            Ok(IndexStats { total_vector_count: 0, dimension: 2 })
        }
    }

    fn project(name: &str, description: &str, owner: &str) -> SourceRecord {
        SourceRecord {
            id: None,
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            owner: Some(owner.to_string()),
            languages: Some(json!({})),
        }
    }

    fn indexer(
        records: Vec<SourceRecord>,
        embedder: FakeEmbedder,
    ) -> (Indexer, Arc<RecordingIndex>) {
        let index = Arc::new(RecordingIndex::default());
        let indexer = Indexer::new(
            Arc::new(StaticSource(records)),
            Arc::new(embedder),
            index.clone(),
        );
        (indexer, index)
    }

    #[tokio::test]
    async fn test_blank_descriptions_are_skipped() {
        let mut a = project("A", "desc", "bob");
        a.languages = Some(json!({"js": 10}));
        let b = project("B", "", "x");

        let (indexer, index) = indexer(vec![a, b], FakeEmbedder::default());
        let report = indexer.run().await.unwrap();

        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 1);

        let upserts = index.upserted();
        assert_eq!(upserts.len(), 1);
        let record = &upserts[0][0];
        assert_eq!(upserts[0].len(), 1);
        assert_eq!(record.id, "0");
        assert_eq!(record.metadata.project_name, "A");
        assert_eq!(record.metadata.owner, "bob");
        assert_eq!(record.metadata.languages, r#"{"js":10}"#);
    }

    #[tokio::test]
    async fn test_every_eligible_record_indexed_once_in_order() {
        let records = vec![
            project("A", "alpha", "a"),
            project("B", "   ", "b"),
            project("C", "gamma", "c"),
            project("D", "delta", "d"),
        ];

        let (indexer, index) = indexer(records, FakeEmbedder::default());
        indexer.run().await.unwrap();

        let batch = &index.upserted()[0];
        let names: Vec<&str> = batch.iter().map(|r| r.metadata.project_name.as_str()).collect();
        let ids: Vec<&str> = batch.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "D"]);
        assert_eq!(ids, vec!["0", "1", "2"]);
    }

    #[tokio::test]
    async fn test_primary_key_is_used_as_id() {
        let mut a = project("A", "alpha", "a");
        a.id = Some("proj_17".to_string());
        let b = project("B", "beta", "b");

        let (indexer, index) = indexer(vec![a, b], FakeEmbedder::default());
        let report = indexer.run().await.unwrap();

        let ids: Vec<String> = index.upserted()[0].iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec!["proj_17".to_string(), "1".to_string()]);
        assert_eq!(report.positional_ids, 1);
    }

    #[tokio::test]
    async fn test_key_colliding_with_positional_id_fails_run() {
        let mut keyed = project("A", "alpha", "a");
        keyed.id = Some("1".to_string());
        let keyless = project("B", "beta", "b");

        let (indexer, index) = indexer(vec![keyed, keyless], FakeEmbedder::default());
        match indexer.run().await {
            Err(RagError::Source(message)) => assert!(message.contains(r#""1""#)),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(index.upserted().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_primary_keys_fail_run() {
        let records: Vec<SourceRecord> = ["alpha", "beta", "gamma"]
            .iter()
            .map(|description| SourceRecord {
                id: Some("proj_7".to_string()),
                ..project("P", description, "o")
            })
            .collect();

        let (indexer, index) = indexer(records, FakeEmbedder::default());
        match indexer.run().await {
            Err(RagError::Source(message)) => assert!(message.contains("proj_7")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(index.upserted().is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_upserts_nothing() {
        let records = vec![project("A", "alpha", "a"), project("B", "beta", "b")];
        let embedder = FakeEmbedder {
            fail_on: Some("beta"),
            ..FakeEmbedder::default()
        };

        let (indexer, index) = indexer(records, embedder);
        match indexer.run().await {
            Err(RagError::Embedding(message)) => assert!(message.contains("Project 1")),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(index.upserted().is_empty());
    }

    #[tokio::test]
    async fn test_non_finite_vector_aborts_run() {
        let embedder = FakeEmbedder {
            nan_on: Some("alpha"),
            ..FakeEmbedder::default()
        };

        let (indexer, index) = indexer(vec![project("A", "alpha", "a")], embedder);
        assert!(matches!(indexer.run().await, Err(RagError::Embedding(_))));
        assert!(index.upserted().is_empty());
    }

    #[tokio::test]
    async fn test_nothing_eligible_skips_upsert() {
        let embedder = FakeEmbedder::default();
        let (indexer, index) = indexer(vec![project("B", "", "x")], embedder);

        let report = indexer.run().await.unwrap();
        assert_eq!(report.processed, 0);
        assert!(index.upserted().is_empty());
    }

    #[tokio::test]
    async fn test_blank_records_are_never_embedded() {
        let embedder = Arc::new(FakeEmbedder::default());
        let index = Arc::new(RecordingIndex::default());
        let indexer = Indexer::new(
            Arc::new(StaticSource(vec![
                project("A", "alpha", "a"),
                project("B", "", "b"),
                SourceRecord::default(),
            ])),
            embedder.clone(),
            index,
        );

        indexer.run().await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }
}
