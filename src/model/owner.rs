use super::{Model, RecordId, Resource};
use crate::error::StoreError;
use async_trait::async_trait;

/// Persistence capability a [`Model`] delegates `save()` and `delete()` to.
///
/// [`DomainStore`](crate::store::DomainStore) hands its models a weak
/// [`StoreHandle`](crate::store::StoreHandle) implementing this trait; tests
/// and alternative stores can provide their own.
#[async_trait]
pub trait ModelOwner<R: Resource>: Send + Sync {
    /// Persists a new model and returns the model reconciled from the response.
    async fn create_entry(&self, model: Model<R>) -> Result<Model<R>, StoreError>;

    /// Persists local changes and returns the model reconciled from the response.
    async fn update_entry(&self, model: Model<R>) -> Result<Model<R>, StoreError>;

    /// Deletes the record; `Ok(false)` when a failure was swallowed.
    async fn delete_entry(&self, id: RecordId) -> Result<bool, StoreError>;
}

/// Owner of models built outside a store; refuses every persistence call.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DetachedOwner;

impl DetachedOwner {
    fn refuse() -> StoreError {
        StoreError::InvalidOwner("model is not attached to a domain store".to_string())
    }
}

#[async_trait]
impl<R: Resource> ModelOwner<R> for DetachedOwner {
    async fn create_entry(&self, _model: Model<R>) -> Result<Model<R>, StoreError> {
        Err(Self::refuse())
    }

    async fn update_entry(&self, _model: Model<R>) -> Result<Model<R>, StoreError> {
        Err(Self::refuse())
    }

    async fn delete_entry(&self, _id: RecordId) -> Result<bool, StoreError> {
        Err(Self::refuse())
    }
}
