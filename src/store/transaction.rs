//! Transaction - Read-then-conditional-write on top of batched commits.
//!
//! Every document read through a transaction pins its observed state as a
//! precondition of the final commit: a document read at version `n` must
//! still be at `n`, and a document read as missing must still be missing.
//! If another writer got there first, the commit fails with
//! [`StoreError::Conflict`] and nothing is written.

use super::{
    CommitReceipt, Document, DocumentStore, Fields, Precondition, StoreError, Versioned,
    WriteBatch,
};

pub struct Transaction<'a, S: ?Sized> {
    store: &'a S,
    batch: WriteBatch,
}

impl<'a, S: DocumentStore + ?Sized> Transaction<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            batch: WriteBatch::new(),
        }
    }

    /// Read a document and pin its current state.
    pub async fn get<D: Document>(&mut self, id: &str) -> Result<Option<Versioned<D>>, StoreError> {
        match self.store.get(D::COLLECTION, id).await? {
            Some(stored) => {
                self.batch.require(Precondition::Version {
                    collection: D::COLLECTION.to_string(),
                    id: id.to_string(),
                    version: stored.version,
                });
                stored.decode::<D>().map(Some)
            }
            None => {
                self.batch.require(Precondition::Missing {
                    collection: D::COLLECTION.to_string(),
                    id: id.to_string(),
                });
                Ok(None)
            }
        }
    }

    pub fn create(&mut self, collection: &str, id: &str, fields: Fields) -> &mut Self {
        self.batch.create(collection, id, fields);
        self
    }

    pub fn update(&mut self, collection: &str, id: &str, fields: Fields) -> &mut Self {
        self.batch.update(collection, id, fields);
        self
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> &mut Self {
        self.batch.delete(collection, id);
        self
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    /// Commit all queued writes, provided every pinned read still holds.
    pub async fn commit(self) -> Result<CommitReceipt, StoreError> {
        self.store.commit(self.batch).await
    }
}
