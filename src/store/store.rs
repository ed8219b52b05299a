//! DocumentStore - Abstract document database.

use async_trait::async_trait;

use super::{CommitReceipt, Filter, StoreError, StoredDocument, WriteBatch};

/// Write limit used when a store does not advertise its own.
pub const DEFAULT_MAX_BATCH_WRITES: usize = 500;

/// Abstract document storage with atomic batched commits.
///
/// Implementations must apply a [`WriteBatch`] all-or-nothing: either every
/// precondition holds and every write lands with one shared commit time,
/// or nothing is written.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Get a document by id. Returns `None` if not found.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<StoredDocument>, StoreError>;

    /// Find documents matching an equality filter. Result order is unspecified.
    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Atomically check preconditions and apply all writes.
    async fn commit(&self, batch: WriteBatch) -> Result<CommitReceipt, StoreError>;

    /// Allocate a fresh document id.
    fn allocate_id(&self) -> String;

    /// Largest number of writes accepted by a single commit.
    fn max_batch_writes(&self) -> usize {
        DEFAULT_MAX_BATCH_WRITES
    }
}
