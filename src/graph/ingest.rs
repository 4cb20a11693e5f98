// file: src/graph/ingest.rs
// description: converts extraction records into idempotent graph upserts with bounded retry
// reference: keyed merge ingestion

use crate::config::GraphConfig;
use crate::graph::store::{
    GraphError, GraphStore, NodeLabel, NodeRef, PropertyMap, RelationshipType, UnitOfWork,
};
use crate::models::{CoinType, ExtractionRecord, IndicatorKind};
use chrono::Utc;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
#[error("{unit} failed after {attempts} attempt(s): {cause}")]
pub struct IngestionError {
    pub unit: String,
    pub attempts: u32,
    #[source]
    pub cause: GraphError,
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &GraphConfig) -> Self {
        Self {
            attempts: config.retry_attempts.max(1),
            initial_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub units_applied: usize,
    pub retries: usize,
}

/// Owns the store handle for the run. Every upsert is keyed, so re-running a
/// record (or resuming one that failed halfway) never duplicates anything.
#[derive(Clone)]
pub struct GraphIngestor {
    store: Arc<dyn GraphStore>,
    retry: RetryPolicy,
    run_id: String,
}

impl GraphIngestor {
    pub fn new(store: Arc<dyn GraphStore>, retry: RetryPolicy, run_id: impl Into<String>) -> Self {
        Self {
            store,
            retry,
            run_id: run_id.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// File node first, then one unit per indicator (file, indicator, relationship).
    pub async fn ingest(
        &self,
        record: &ExtractionRecord,
        source_path: &Path,
    ) -> Result<IngestStats, IngestionError> {
        let mut stats = IngestStats::default();
        let file = NodeRef::new(
            NodeLabel::File,
            record.identity().content_hash.as_str(),
        );
        let file_properties = self.file_properties(record, source_path);

        self.apply_with_retry(
            &UnitOfWork::new().node(file.clone(), file_properties.clone()),
            &mut stats,
        )
        .await?;

        for indicator in record.indicators() {
            let target = NodeRef::new(NodeLabel::Indicator(indicator.kind), &indicator.value);
            let unit = UnitOfWork::new()
                .node(file.clone(), file_properties.clone())
                .node(target.clone(), PropertyMap::new())
                .relationship(RelationshipType(indicator.kind), file.clone(), target);

            self.apply_with_retry(&unit, &mut stats).await?;
        }

        debug!(
            "Ingested {} indicators for {} ({} units, {} retries)",
            record.len(),
            record.identity().content_hash,
            stats.units_applied,
            stats.retries
        );

        Ok(stats)
    }

    fn file_properties(&self, record: &ExtractionRecord, source_path: &Path) -> PropertyMap {
        let counts = record.count_by_kind();
        let kinds: Vec<&str> = counts.keys().map(|kind| kind.as_str()).collect();

        let mut properties = PropertyMap::new();
        properties.insert("path".to_string(), json!(source_path.display().to_string()));
        properties.insert("kinds".to_string(), json!(kinds));
        properties.insert("indicator_count".to_string(), json!(record.len()));

        let all_kinds = [IndicatorKind::Email, IndicatorKind::Ipv4]
            .into_iter()
            .chain(CoinType::ALL.iter().map(|c| IndicatorKind::CryptoAddress(*c)));
        for kind in all_kinds {
            properties.insert(
                format!("{}_count", kind.as_str()),
                json!(counts.get(&kind).copied().unwrap_or(0)),
            );
        }

        properties.insert("last_run".to_string(), json!(self.run_id));
        properties.insert("ingested_at".to_string(), json!(Utc::now().to_rfc3339()));
        properties
    }

    async fn apply_with_retry(
        &self,
        unit: &UnitOfWork,
        stats: &mut IngestStats,
    ) -> Result<(), IngestionError> {
        let mut attempt = 1;
        let mut backoff = self.retry.initial_backoff;

        loop {
            match self.store.apply(unit).await {
                Ok(()) => {
                    stats.units_applied += 1;
                    return Ok(());
                }
                Err(cause) if cause.is_retryable() && attempt < self.retry.attempts => {
                    warn!(
                        "Upsert attempt {}/{} failed for {}: {}; retrying in {:?}",
                        attempt,
                        self.retry.attempts,
                        unit.describe(),
                        cause,
                        backoff
                    );
                    stats.retries += 1;
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
                Err(cause) => {
                    return Err(IngestionError {
                        unit: unit.describe(),
                        attempts: attempt,
                        cause,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InMemoryGraphStore;
    use crate::models::{ContentHash, FileIdentity, Indicator};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(hash: &str, path: &str, indicators: Vec<Indicator>) -> ExtractionRecord {
        ExtractionRecord::new(
            FileIdentity::new(path, ContentHash::from_hex(hash)),
            indicators,
        )
    }

    fn no_backoff(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            initial_backoff: Duration::from_millis(0),
        }
    }

    #[tokio::test]
    async fn test_ingest_twice_is_idempotent() {
        let store = Arc::new(InMemoryGraphStore::new());
        let ingestor = GraphIngestor::new(store.clone(), no_backoff(1), "run-1");
        let rec = record(
            "aaaa",
            "/evidence/a.txt",
            vec![
                Indicator::new(IndicatorKind::Email, "a@b.com"),
                Indicator::new(IndicatorKind::Ipv4, "10.0.0.1"),
            ],
        );

        ingestor.ingest(&rec, Path::new("/evidence/a.txt")).await.unwrap();
        let nodes = store.node_count();
        let relationships = store.relationship_count();

        ingestor.ingest(&rec, Path::new("/evidence/a.txt")).await.unwrap();

        assert_eq!(nodes, 3);
        assert_eq!(relationships, 2);
        assert_eq!(store.node_count(), nodes);
        assert_eq!(store.relationship_count(), relationships);
    }

    #[tokio::test]
    async fn test_file_without_indicators_still_recorded() {
        let store = Arc::new(InMemoryGraphStore::new());
        let ingestor = GraphIngestor::new(store.clone(), no_backoff(1), "run-1");

        let stats = ingestor
            .ingest(&record("bbbb", "/e/empty.txt", vec![]), Path::new("/e/empty.txt"))
            .await
            .unwrap();

        assert_eq!(stats.units_applied, 1);
        let node = store.node(&NodeRef::new(NodeLabel::File, "bbbb")).unwrap();
        assert_eq!(node["indicator_count"], json!(0));
        assert_eq!(node["kinds"], json!([]));
    }

    #[tokio::test]
    async fn test_summary_properties() {
        let store = Arc::new(InMemoryGraphStore::new());
        let ingestor = GraphIngestor::new(store.clone(), no_backoff(1), "run-7");
        let rec = record(
            "cccc",
            "/e/c.txt",
            vec![
                Indicator::new(IndicatorKind::Ipv4, "10.0.0.1"),
                Indicator::new(IndicatorKind::Ipv4, "10.0.0.2"),
            ],
        );

        ingestor.ingest(&rec, Path::new("/e/c.txt")).await.unwrap();

        let node = store.node(&NodeRef::new(NodeLabel::File, "cccc")).unwrap();
        assert_eq!(node["path"], json!("/e/c.txt"));
        assert_eq!(node["kinds"], json!(["ipv4"]));
        assert_eq!(node["ipv4_count"], json!(2));
        assert_eq!(node["email_count"], json!(0));
        assert_eq!(node["btc_count"], json!(0));
        assert_eq!(node["last_run"], json!("run-7"));
    }

    #[tokio::test]
    async fn test_reingest_under_new_path_overwrites_path() {
        let store = Arc::new(InMemoryGraphStore::new());
        let ingestor = GraphIngestor::new(store.clone(), no_backoff(1), "run-1");
        let rec = record("dddd", "/old/name.txt", vec![]);

        ingestor.ingest(&rec, Path::new("/old/name.txt")).await.unwrap();
        ingestor.ingest(&rec, Path::new("/new/name.txt")).await.unwrap();

        let node = store.node(&NodeRef::new(NodeLabel::File, "dddd")).unwrap();
        assert_eq!(store.node_count(), 1);
        assert_eq!(node["path"], json!("/new/name.txt"));
    }

    /// Fails the first `failures` applies with the given error, then delegates.
    struct FlakyStore {
        inner: InMemoryGraphStore,
        failures: AtomicUsize,
        error: GraphError,
    }

    #[async_trait]
    impl GraphStore for FlakyStore {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn apply(&self, unit: &UnitOfWork) -> Result<(), GraphError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(self.error.clone());
            }
            self.inner.apply(unit).await
        }

        async fn ping(&self) -> Result<(), GraphError> {
            Ok(())
        }

        async fn ensure_schema(&self) -> Result<(), GraphError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryGraphStore::new(),
            failures: AtomicUsize::new(2),
            error: GraphError::Transient("deadlock".to_string()),
        });
        let ingestor = GraphIngestor::new(store.clone(), no_backoff(3), "run-1");
        let rec = record(
            "eeee",
            "/e/e.txt",
            vec![Indicator::new(IndicatorKind::Email, "a@b.com")],
        );

        let stats = ingestor.ingest(&rec, Path::new("/e/e.txt")).await.unwrap();

        assert_eq!(stats.retries, 2);
        assert_eq!(stats.units_applied, 2);
        assert_eq!(store.inner.relationship_count(), 1);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryGraphStore::new(),
            failures: AtomicUsize::new(10),
            error: GraphError::Unavailable("connection refused".to_string()),
        });
        let ingestor = GraphIngestor::new(store, no_backoff(3), "run-1");

        let err = ingestor
            .ingest(&record("ffff", "/e/f.txt", vec![]), Path::new("/e/f.txt"))
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 3);
        assert!(matches!(err.cause, GraphError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_rejected_statement_not_retried() {
        let store = Arc::new(FlakyStore {
            inner: InMemoryGraphStore::new(),
            failures: AtomicUsize::new(1),
            error: GraphError::Rejected {
                code: "Neo.ClientError.Statement.SyntaxError".to_string(),
                message: "bad".to_string(),
            },
        });
        let ingestor = GraphIngestor::new(store, no_backoff(5), "run-1");

        let err = ingestor
            .ingest(&record("0000", "/e/g.txt", vec![]), Path::new("/e/g.txt"))
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 1);
    }

    #[tokio::test]
    async fn test_resume_after_partial_ingest() {
        let store = Arc::new(InMemoryGraphStore::new());
        let ingestor = GraphIngestor::new(store.clone(), no_backoff(1), "run-1");
        let file = NodeRef::new(NodeLabel::File, "1111");
        let first = NodeRef::new(NodeLabel::Indicator(IndicatorKind::Email), "a@b.com");

        // state left behind by a run that failed after its first indicator
        store
            .apply(
                &UnitOfWork::new()
                    .node(file.clone(), PropertyMap::new())
                    .node(first.clone(), PropertyMap::new())
                    .relationship(RelationshipType(IndicatorKind::Email), file, first),
            )
            .await
            .unwrap();

        let rec = record(
            "1111",
            "/e/h.txt",
            vec![
                Indicator::new(IndicatorKind::Email, "a@b.com"),
                Indicator::new(IndicatorKind::Email, "c@d.com"),
            ],
        );
        ingestor.ingest(&rec, Path::new("/e/h.txt")).await.unwrap();

        assert_eq!(store.node_count(), 3);
        assert_eq!(store.relationship_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_records_share_indicator_node() {
        let store = Arc::new(InMemoryGraphStore::new());
        let ingestor = GraphIngestor::new(store.clone(), no_backoff(1), "run-1");
        let shared = Indicator::new(IndicatorKind::Email, "shared@corp.example.org");

        let first = record("2222", "/e/one.txt", vec![shared.clone()]);
        let second = record("3333", "/e/two.txt", vec![shared]);

        let a = {
            let ingestor = ingestor.clone();
            tokio::spawn(async move { ingestor.ingest(&first, Path::new("/e/one.txt")).await })
        };
        let b = {
            let ingestor = ingestor.clone();
            tokio::spawn(async move { ingestor.ingest(&second, Path::new("/e/two.txt")).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert_eq!(
            store
                .nodes_with_label(NodeLabel::Indicator(IndicatorKind::Email))
                .len(),
            1
        );
        assert_eq!(store.relationship_count(), 2);
    }
}
