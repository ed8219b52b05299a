//! Store - Document storage abstraction for stories, chapters and articles.
//!
//! The hosted document database is modelled as the [`DocumentStore`] trait:
//! read by id, equality-filtered queries, and atomic batched commits guarded
//! by preconditions. Timestamps marked with [`FieldValue::ServerTimestamp`]
//! are resolved by the store at commit time.
//!
//! ## Example
//!
//! ```ignore
//! use serial_press::{Chapter, DocumentsExt, Fields, Filter, InMemoryDocumentStore, Story, Transaction};
//!
//! let store = InMemoryDocumentStore::new().with_index("chapters", "storyId");
//! let chapters = store.collection::<Chapter>().find(&Filter::eq("storyId", "s-1")).await?;
//!
//! let mut tx = Transaction::new(&store);
//! let story = tx.get::<Story>("s-1").await?;
//! tx.update("stories", "s-1", Fields::new().server_timestamp("updatedAt"));
//! let receipt = tx.commit().await?;
//! ```

mod batch;
mod collection;
mod filter;
mod in_memory;
mod store;
mod transaction;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Trait for records persisted in a named collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Collection the record lives in (a table in SQL, a collection in a document database).
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this record.
    fn id(&self) -> &str;
}

/// A versioned wrapper around decoded document data.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

/// A raw document as held by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub version: u64,
    pub data: Map<String, Value>,
}

impl StoredDocument {
    /// Decode into a typed document. The store key is injected as `id`
    /// when the stored fields do not carry one.
    pub fn decode<D: Document>(&self) -> Result<Versioned<D>, StoreError> {
        let mut data = self.data.clone();
        data.entry("id")
            .or_insert_with(|| Value::String(self.id.clone()));
        let decoded = serde_json::from_value(Value::Object(data)).map_err(|e| StoreError::Serde {
            collection: D::COLLECTION.to_string(),
            id: self.id.clone(),
            message: e.to_string(),
        })?;
        Ok(Versioned {
            data: decoded,
            version: self.version,
        })
    }
}

/// Error type for document store operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A precondition recorded by a transaction no longer holds.
    #[error("conflicting write on {collection}:{id}")]
    Conflict { collection: String, id: String },

    #[error("document already exists: {collection}:{id}")]
    AlreadyExists { collection: String, id: String },

    #[error("document not found: {collection}:{id}")]
    NotFound { collection: String, id: String },

    #[error("batch of {size} writes exceeds the store limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    #[error("document {collection}:{id} could not be decoded: {message}")]
    Serde {
        collection: String,
        id: String,
        message: String,
    },

    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    /// Whether this error was caused by a concurrent writer.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

pub use batch::{CommitReceipt, FieldValue, Fields, Precondition, WriteBatch, WriteOp};
pub use collection::{Collection, DocumentsExt};
pub use filter::Filter;
pub use in_memory::InMemoryDocumentStore;
pub use store::{DocumentStore, DEFAULT_MAX_BATCH_WRITES};
pub use transaction::Transaction;
