//! # User Store
//!
//! Provides a high-level API over the `User` domain store.

use crate::model::User;
use crate::stores::{StoreClient, UserError};
use async_trait::async_trait;
use remodel::model::RecordId;
use remodel::store::Cache;
use remodel::{Callbacks, DomainStore, Model, Params, Record, StoreError, StoreOptions, Transport};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Store for the `users` resource.
#[derive(Clone)]
pub struct UserStore {
    inner: DomainStore<User>,
}

impl UserStore {
    pub fn new(transport: Arc<dyn Transport>, options: StoreOptions) -> Self {
        Self {
            inner: DomainStore::new(transport, options),
        }
    }
}

#[async_trait]
impl StoreClient<User> for UserStore {
    type Error = UserError;

    fn inner(&self) -> &DomainStore<User> {
        &self.inner
    }
}

impl UserStore {
    #[instrument(skip(self))]
    pub async fn register(&self, name: &str, email: &str) -> Result<Model<User>, UserError> {
        debug!("Sending request");
        let mut record = Record::new();
        record.insert("name".to_string(), name.into());
        record.insert("email".to_string(), email.into());
        Ok(self.inner.create_entry(record, Callbacks::propagate()).await?)
    }

    #[instrument(skip(self))]
    pub async fn rename(&self, id: RecordId, name: &str) -> Result<Model<User>, UserError> {
        let mut user = self
            .get(id.clone())
            .await?
            .ok_or_else(|| UserError::NotFound(id.to_string()))?;
        user.set("name", name)?;
        Ok(self.inner.update_entry(&user, Callbacks::propagate()).await?)
    }

    /// Fetches the users with `role` and merges them into the cache. Unlike
    /// `load_all`, users already cached under other roles stay.
    #[instrument(skip(self))]
    pub async fn with_role(&self, role: &str) -> Result<Vec<Model<User>>, UserError> {
        let mut params = Params::new();
        params.insert("role".to_string(), role.into());

        let callbacks = Callbacks::propagate().on_success(|store: &DomainStore<User>, body: Value| {
            let Value::Array(records) = body else {
                return Err(StoreError::InvalidInput(format!("expected an array of users, got {body}")));
            };
            let fetched = store.normalize_models(records)?;
            for user in fetched.models() {
                store.push_entry(user.fields().clone())?;
            }
            Ok(fetched)
        });

        let fetched = self.inner.list_entries(params, callbacks).await?;
        Ok(fetched
            .as_ref()
            .map(Cache::models)
            .unwrap_or_default()
            .into_iter()
            .cloned()
            .collect())
    }
}
