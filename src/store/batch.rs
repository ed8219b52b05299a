//! WriteBatch - Atomic groups of document writes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A field value in a write. `ServerTimestamp` is replaced by the commit time.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    ServerTimestamp,
}

/// An ordered set of field writes for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: BTreeMap<String, FieldValue>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field to a concrete value.
    pub fn set(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.entries
            .insert(name.to_string(), FieldValue::Value(value.into()));
        self
    }

    /// Set a field only when a value is present.
    pub fn set_opt<V: Into<Value>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(name, value),
            None => self,
        }
    }

    /// Mark a field to receive the commit time.
    pub fn server_timestamp(mut self, name: &str) -> Self {
        self.entries
            .insert(name.to_string(), FieldValue::ServerTimestamp);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.entries.iter()
    }
}

/// A single write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create a new document. Fails if the id is taken.
    Create {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Merge fields into an existing document. Fails if it is missing.
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Delete a document. Deleting a missing document is a no-op.
    Delete { collection: String, id: String },
}

impl WriteOp {
    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Create { collection, .. }
            | WriteOp::Update { collection, .. }
            | WriteOp::Delete { collection, .. } => collection,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            WriteOp::Create { id, .. } | WriteOp::Update { id, .. } | WriteOp::Delete { id, .. } => {
                id
            }
        }
    }
}

/// A condition that must hold at commit time for the batch to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// The document exists at exactly this version.
    Version {
        collection: String,
        id: String,
        version: u64,
    },
    /// The document exists, at any version.
    Exists { collection: String, id: String },
    /// The document does not exist.
    Missing { collection: String, id: String },
}

/// Writes that commit together or not at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    preconditions: Vec<Precondition>,
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, collection: &str, id: &str, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Create {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        self
    }

    pub fn update(&mut self, collection: &str, id: &str, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        self
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn require(&mut self, precondition: Precondition) -> &mut Self {
        if !self.preconditions.contains(&precondition) {
            self.preconditions.push(precondition);
        }
        self
    }

    /// Number of writes (preconditions are not counted).
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    pub fn into_parts(self) -> (Vec<Precondition>, Vec<WriteOp>) {
        (self.preconditions, self.ops)
    }
}

/// The result of a successful commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Server time assigned to every `ServerTimestamp` field in the batch.
    pub commit_time: DateTime<Utc>,
    pub writes: usize,
}
