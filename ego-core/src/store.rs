//! Content-addressed memory store adapter.
//!
//! Stores committed memory records together with their embeddings,
//! partitioned into per-user scopes and a global scope, and answers
//! similarity queries. This is the narrow, single-writer adapter the
//! pipeline talks to; swapping in a real vector database only has to
//! preserve this surface.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::types::{Embedding, MemoryId, NodeType};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One durable memory. Immutable once created; forgetting is external
/// storage eviction, out of scope here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique record id, shared with the corresponding graph node.
    pub id: MemoryId,
    /// Text content of the memory.
    pub content: String,
    /// Final importance score in [0, 1].
    pub importance: f32,
    /// User scope; `None` means global ("hive mind") visibility.
    pub user_scope: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Node-type tag.
    pub node_type: NodeType,
}

impl MemoryRecord {
    /// Create a new record with a fresh id, clamping importance to [0, 1].
    #[must_use]
    pub fn new(
        content: impl Into<String>,
        importance: f32,
        user_scope: Option<String>,
        node_type: NodeType,
    ) -> Self {
        Self {
            id: MemoryId::new(),
            content: content.into(),
            importance: importance.clamp(0.0, 1.0),
            user_scope,
            created_at: Utc::now(),
            node_type,
        }
    }
}

struct StoredRecord {
    record: MemoryRecord,
    embedding: Embedding,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// In-memory, single-writer memory store.
///
/// The core serializes all mutation onto the task handling the current
/// request, so no interior locking is needed here.
pub struct MemoryStore {
    embedder: Arc<dyn EmbeddingProvider>,
    user_partitions: HashMap<String, Vec<StoredRecord>>,
    global_partition: Vec<StoredRecord>,
}

impl MemoryStore {
    /// Create an empty store using the given embedding provider.
    #[must_use]
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            user_partitions: HashMap::new(),
            global_partition: Vec::new(),
        }
    }

    /// Embed text with the store's provider. Deterministic for
    /// identical input.
    ///
    /// # Errors
    /// Propagates the provider's embedding failure.
    pub fn embed(&self, text: &str) -> Result<Embedding> {
        self.embedder.embed(text)
    }

    /// Persist a record into its partition.
    pub fn store(&mut self, record: MemoryRecord, embedding: Embedding) {
        tracing::debug!(
            id = %record.id,
            scope = record.user_scope.as_deref().unwrap_or("global"),
            node_type = %record.node_type,
            "storing memory record"
        );
        let stored = StoredRecord { record, embedding };
        match &stored.record.user_scope {
            Some(scope) => self
                .user_partitions
                .entry(scope.clone())
                .or_default()
                .push(stored),
            None => self.global_partition.push(stored),
        }
    }

    /// Embed and persist a record in one step.
    ///
    /// When the embedder fails the record is kept with a zero vector:
    /// it never surfaces in similarity queries, but it exists, so a
    /// graph node committed alongside it always has a backing record.
    pub fn commit(&mut self, record: MemoryRecord) {
        let embedding = match self.embed(&record.content) {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    id = %record.id,
                    "embedding failed, storing with a neutral vector"
                );
                Embedding(vec![0.0; self.embedder.dimensions()])
            }
        };
        self.store(record, embedding);
    }

    /// Retrieve up to `top_k` records from the user scope (if given)
    /// plus up to `top_k` from the global scope, each ordered by cosine
    /// similarity, highest first.
    ///
    /// # Errors
    /// Propagates an embedding failure for the query text.
    pub fn query(
        &self,
        query_text: &str,
        user_scope: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<MemoryRecord>> {
        let query_embedding = self.embed(query_text)?;
        let mut results = Vec::new();

        if let Some(scope) = user_scope
            && let Some(partition) = self.user_partitions.get(scope)
        {
            results.extend(rank_partition(partition, &query_embedding, top_k));
        }
        results.extend(rank_partition(
            &self.global_partition,
            &query_embedding,
            top_k,
        ));
        Ok(results)
    }

    /// Total number of stored records across all partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.global_partition.len()
            + self.user_partitions.values().map(Vec::len).sum::<usize>()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a record with this id exists in any partition.
    #[must_use]
    pub fn contains(&self, id: MemoryId) -> bool {
        self.global_partition.iter().any(|s| s.record.id == id)
            || self
                .user_partitions
                .values()
                .any(|p| p.iter().any(|s| s.record.id == id))
    }
}

fn rank_partition(
    partition: &[StoredRecord],
    query: &Embedding,
    top_k: usize,
) -> Vec<MemoryRecord> {
    let mut scored: Vec<(OrderedFloat<f32>, &StoredRecord)> = partition
        .iter()
        .map(|s| (OrderedFloat(query.cosine_similarity(&s.embedding)), s))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(top_k)
        .map(|(_, s)| s.record.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashEmbeddingProvider;

    fn store() -> MemoryStore {
        MemoryStore::new(Arc::new(HashEmbeddingProvider::new(128)))
    }

    fn record(content: &str, scope: Option<&str>) -> MemoryRecord {
        MemoryRecord::new(content, 0.8, scope.map(String::from), NodeType::Memory)
    }

    #[test]
    fn exact_duplicate_text_ranks_first() {
        let mut store = store();
        for text in ["the door opened", "a red cup on the table", "loud noise outside"] {
            let rec = record(text, None);
            let emb = store.embed(text).expect("embed");
            store.store(rec, emb);
        }
        let results = store.query("a red cup on the table", None, 3).expect("query");
        assert_eq!(results[0].content, "a red cup on the table");
    }

    #[test]
    fn user_scope_is_partitioned() {
        let mut store = store();
        let rec = record("ian likes chess", Some("Ian"));
        let emb = store.embed(&rec.content).expect("embed");
        store.store(rec, emb);

        // Not visible without the scope.
        let global_only = store.query("chess", None, 5).expect("query");
        assert!(global_only.is_empty());

        let scoped = store.query("chess", Some("Ian"), 5).expect("query");
        assert_eq!(scoped.len(), 1);
    }

    #[test]
    fn global_records_visible_to_every_scope() {
        let mut store = store();
        let rec = record("the lab moved buildings", None);
        let emb = store.embed(&rec.content).expect("embed");
        store.store(rec, emb);

        let scoped = store.query("buildings", Some("Maya"), 5).expect("query");
        assert_eq!(scoped.len(), 1);
        assert!(scoped[0].user_scope.is_none());
    }

    #[test]
    fn top_k_caps_each_partition() {
        let mut store = store();
        for i in 0..10 {
            let rec = record(&format!("global event number {i}"), None);
            let emb = store.embed(&rec.content).expect("embed");
            store.store(rec, emb);
        }
        let results = store.query("event", None, 3).expect("query");
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn commit_persists_even_when_the_embedder_fails() {
        struct FailingProvider;
        impl EmbeddingProvider for FailingProvider {
            fn embed(&self, _text: &str) -> Result<Embedding> {
                Err(crate::EgoError::Embedding("model unavailable".to_string()))
            }
            fn dimensions(&self) -> usize {
                64
            }
            fn model_name(&self) -> &str {
                "failing"
            }
        }

        let mut store = MemoryStore::new(Arc::new(FailingProvider));
        let rec = record("the door opened", None);
        let id = rec.id;
        store.commit(rec);
        assert_eq!(store.len(), 1);
        assert!(store.contains(id));
    }

    #[test]
    fn importance_is_clamped_on_creation() {
        let rec = MemoryRecord::new("x", 1.7, None, NodeType::Joy);
        assert!((rec.importance - 1.0).abs() < f32::EPSILON);
    }
}
