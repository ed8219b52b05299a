//! Collection - Typed accessor for document reads.

use std::marker::PhantomData;

use super::{Document, DocumentStore, Filter, StoreError, Versioned};

/// Typed view over one collection of a [`DocumentStore`].
pub struct Collection<'a, S: ?Sized, D> {
    store: &'a S,
    _marker: PhantomData<fn() -> D>,
}

impl<'a, S: DocumentStore + ?Sized, D: Document> Collection<'a, S, D> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    /// Get a document by id.
    pub async fn get(&self, id: &str) -> Result<Option<Versioned<D>>, StoreError> {
        match self.store.get(D::COLLECTION, id).await? {
            Some(stored) => stored.decode::<D>().map(Some),
            None => Ok(None),
        }
    }

    /// Find documents matching an equality filter.
    pub async fn find(&self, filter: &Filter) -> Result<Vec<Versioned<D>>, StoreError> {
        self.store
            .query(D::COLLECTION, filter)
            .await?
            .iter()
            .map(|stored| stored.decode::<D>())
            .collect()
    }

    /// Every document in the collection.
    pub async fn all(&self) -> Result<Vec<Versioned<D>>, StoreError> {
        self.find(&Filter::all()).await
    }

    /// Count documents matching an equality filter.
    pub async fn count(&self, filter: &Filter) -> Result<usize, StoreError> {
        Ok(self.store.query(D::COLLECTION, filter).await?.len())
    }
}

/// Extension trait for typed collection access on any DocumentStore.
pub trait DocumentsExt: DocumentStore {
    /// Get a typed collection accessor.
    fn collection<D: Document>(&self) -> Collection<'_, Self, D> {
        Collection::new(self)
    }
}

impl<S: DocumentStore + ?Sized> DocumentsExt for S {}
