//! InMemoryDocumentStore - HashMap-backed document store for testing and development.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

use super::{
    CommitReceipt, DocumentStore, FieldValue, Fields, Filter, Precondition, StoreError,
    StoredDocument, WriteBatch, WriteOp, DEFAULT_MAX_BATCH_WRITES,
};

/// Internal stored representation of a document.
struct StoredEntry {
    data: Map<String, Value>,
    version: u64,
}

/// Secondary index: JSON-encoded field value -> ids of documents holding it.
type FieldIndex = HashMap<String, BTreeSet<String>>;

#[derive(Default)]
struct State {
    collections: HashMap<String, HashMap<String, StoredEntry>>,
    indexes: HashMap<(String, String), FieldIndex>,
    last_commit: Option<DateTime<Utc>>,
}

impl State {
    fn contains(&self, collection: &str, id: &str) -> bool {
        self.collections
            .get(collection)
            .map(|docs| docs.contains_key(id))
            .unwrap_or(false)
    }

    fn version_of(&self, collection: &str, id: &str) -> Option<u64> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|entry| entry.version)
    }

    fn check(&self, precondition: &Precondition) -> Result<(), StoreError> {
        let (collection, id, holds) = match precondition {
            Precondition::Version {
                collection,
                id,
                version,
            } => (
                collection,
                id,
                self.version_of(collection, id) == Some(*version),
            ),
            Precondition::Exists { collection, id } => {
                (collection, id, self.contains(collection, id))
            }
            Precondition::Missing { collection, id } => {
                (collection, id, !self.contains(collection, id))
            }
        };

        if holds {
            Ok(())
        } else {
            Err(StoreError::Conflict {
                collection: collection.clone(),
                id: id.clone(),
            })
        }
    }

    /// Check every write against the state it will see, before anything is applied.
    fn validate(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let mut staged: HashMap<(&str, &str), bool> = HashMap::new();

        for op in ops {
            let key = (op.collection(), op.id());
            let exists = staged
                .get(&key)
                .copied()
                .unwrap_or_else(|| self.contains(key.0, key.1));

            match op {
                WriteOp::Create { .. } if exists => {
                    return Err(StoreError::AlreadyExists {
                        collection: key.0.to_string(),
                        id: key.1.to_string(),
                    })
                }
                WriteOp::Create { .. } => {
                    staged.insert(key, true);
                }
                WriteOp::Update { .. } if !exists => {
                    return Err(StoreError::NotFound {
                        collection: key.0.to_string(),
                        id: key.1.to_string(),
                    })
                }
                WriteOp::Update { .. } => {}
                WriteOp::Delete { .. } => {
                    staged.insert(key, false);
                }
            }
        }

        Ok(())
    }

    /// Commit times are strictly increasing even when the wall clock is not.
    fn next_commit_time(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let commit_time = match self.last_commit {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_commit = Some(commit_time);
        commit_time
    }

    fn apply(&mut self, op: WriteOp, stamp: &Value) {
        match op {
            WriteOp::Create {
                collection,
                id,
                fields,
            } => {
                let data = resolve(Map::new(), &fields, stamp);
                self.index_insert(&collection, &id, &data);
                self.collections
                    .entry(collection)
                    .or_default()
                    .insert(id, StoredEntry { data, version: 1 });
            }
            WriteOp::Update {
                collection,
                id,
                fields,
            } => {
                let Some(entry) = self
                    .collections
                    .get_mut(&collection)
                    .and_then(|docs| docs.remove(&id))
                else {
                    return;
                };
                self.index_remove(&collection, &id, &entry.data);
                let data = resolve(entry.data, &fields, stamp);
                self.index_insert(&collection, &id, &data);
                self.collections.entry(collection).or_default().insert(
                    id,
                    StoredEntry {
                        data,
                        version: entry.version + 1,
                    },
                );
            }
            WriteOp::Delete { collection, id } => {
                let removed = self
                    .collections
                    .get_mut(&collection)
                    .and_then(|docs| docs.remove(&id));
                if let Some(entry) = removed {
                    self.index_remove(&collection, &id, &entry.data);
                }
            }
        }
    }

    fn index_insert(&mut self, collection: &str, id: &str, data: &Map<String, Value>) {
        for ((indexed, field), index) in self.indexes.iter_mut() {
            if indexed != collection {
                continue;
            }
            if let Some(value) = data.get(field) {
                index
                    .entry(value.to_string())
                    .or_default()
                    .insert(id.to_string());
            }
        }
    }

    fn index_remove(&mut self, collection: &str, id: &str, data: &Map<String, Value>) {
        for ((indexed, field), index) in self.indexes.iter_mut() {
            if indexed != collection {
                continue;
            }
            if let Some(value) = data.get(field) {
                let key = value.to_string();
                if let Some(ids) = index.get_mut(&key) {
                    ids.remove(id);
                    if ids.is_empty() {
                        index.remove(&key);
                    }
                }
            }
        }
    }
}

fn resolve(mut data: Map<String, Value>, fields: &Fields, stamp: &Value) -> Map<String, Value> {
    for (name, value) in fields.iter() {
        let value = match value {
            FieldValue::Value(value) => value.clone(),
            FieldValue::ServerTimestamp => stamp.clone(),
        };
        data.insert(name.clone(), value);
    }
    data
}

/// In-memory document store backed by nested HashMaps.
///
/// Clone-friendly via Arc; clones share storage. Equality queries on
/// fields registered with [`with_index`](Self::with_index) are answered
/// from a secondary index instead of a collection scan.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    state: Arc<RwLock<State>>,
    max_batch_writes: usize,
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDocumentStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            max_batch_writes: DEFAULT_MAX_BATCH_WRITES,
        }
    }

    /// Maintain a secondary index on `collection.field`.
    pub fn with_index(self, collection: &str, field: &str) -> Self {
        if let Ok(mut state) = self.state.write() {
            let mut index = FieldIndex::new();
            if let Some(docs) = state.collections.get(collection) {
                for (id, entry) in docs {
                    if let Some(value) = entry.data.get(field) {
                        index
                            .entry(value.to_string())
                            .or_default()
                            .insert(id.clone());
                    }
                }
            }
            state
                .indexes
                .insert((collection.to_string(), field.to_string()), index);
        }
        self
    }

    /// Limit the number of writes accepted per commit.
    pub fn with_max_batch_writes(mut self, limit: usize) -> Self {
        self.max_batch_writes = limit.max(1);
        self
    }

    /// Number of documents currently held in a collection.
    pub fn document_count(&self, collection: &str) -> Result<usize, StoreError> {
        let state = self.read_state()?;
        Ok(state
            .collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0))
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, StoreError> {
        let state = self.read_state()?;
        Ok(state
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|entry| StoredDocument {
                id: id.to_string(),
                version: entry.version,
                data: entry.data.clone(),
            }))
    }

    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let state = self.read_state()?;
        let Some(docs) = state.collections.get(collection) else {
            return Ok(Vec::new());
        };

        let indexed = filter.clauses().iter().find_map(|(field, value)| {
            state
                .indexes
                .get(&(collection.to_string(), field.clone()))
                .map(|index| index.get(&value.to_string()))
        });

        let candidates: Vec<&String> = match indexed {
            Some(Some(ids)) => ids.iter().collect(),
            Some(None) => Vec::new(),
            None => docs.keys().collect(),
        };

        Ok(candidates
            .into_iter()
            .filter_map(|id| docs.get(id).map(|entry| (id, entry)))
            .filter(|(_, entry)| filter.matches(&entry.data))
            .map(|(id, entry)| StoredDocument {
                id: id.clone(),
                version: entry.version,
                data: entry.data.clone(),
            })
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError> {
        if batch.len() > self.max_batch_writes {
            return Err(StoreError::BatchTooLarge {
                size: batch.len(),
                limit: self.max_batch_writes,
            });
        }

        let (preconditions, ops) = batch.into_parts();
        let writes = ops.len();

        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::Storage("lock poisoned".into()))?;

        for precondition in &preconditions {
            state.check(precondition)?;
        }
        state.validate(&ops)?;

        let commit_time = state.next_commit_time();
        let stamp =
            serde_json::to_value(commit_time).map_err(|e| StoreError::Storage(e.to_string()))?;

        for op in ops {
            state.apply(op, &stamp);
        }

        tracing::debug!(writes, %commit_time, "in-memory batch committed");

        Ok(CommitReceipt {
            commit_time,
            writes,
        })
    }

    fn allocate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn max_batch_writes(&self) -> usize {
        self.max_batch_writes
    }
}
