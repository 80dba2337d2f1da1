//! # StoreClient Trait
//!
//! Common reads for resource-specific stores, built on a generic `DomainStore`.

use async_trait::async_trait;
use remodel::model::RecordId;
use remodel::store::Cache;
use remodel::{Callbacks, DomainStore, Model, Resource, StoreError};

/// Trait for typed stores to inherit the standard reads.
///
/// Every provided method propagates network failures instead of swallowing
/// them, so callers always see why a call came back empty-handed.
#[async_trait]
pub trait StoreClient<R: Resource>: Send + Sync {
    /// The resource-specific error type.
    type Error: From<StoreError> + Send + Sync;

    /// Access the inner generic store.
    fn inner(&self) -> &DomainStore<R>;

    /// Cached model, fetched when missing.
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: RecordId) -> Result<Option<Model<R>>, Self::Error> {
        tracing::debug!("Looking up");
        Ok(self
            .inner()
            .find_or_show_entry(id, Default::default(), Callbacks::propagate())
            .await?)
    }

    /// Replaces the cache with the full collection.
    #[tracing::instrument(skip(self))]
    async fn load_all(&self) -> Result<Cache<R>, Self::Error> {
        tracing::debug!("Loading collection");
        let cache = self
            .inner()
            .list_entries(Default::default(), Callbacks::propagate())
            .await?;
        Ok(cache.unwrap_or_default())
    }

    /// Deletes the record on the backend and evicts it.
    #[tracing::instrument(skip(self))]
    async fn delete(&self, id: RecordId) -> Result<(), Self::Error> {
        tracing::debug!("Deleting");
        self.inner().delete_entry(id, Callbacks::propagate()).await?;
        Ok(())
    }
}
