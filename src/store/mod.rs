//! # Domain Store
//!
//! A [`DomainStore<R>`] caches the models of one [`Resource`] and orchestrates
//! their CRUD calls through an [`ApiClient`].
//!
//! ## Endpoints
//!
//! ```text
//! GET       {base_path}/{plural}        list_entries
//! GET       {base_path}/{plural}/:id    show_entry
//! POST      {base_path}/{plural}        create_entry
//! PUT       {base_path}/{plural}/:id    update_entry / update_entries
//! DELETE    {base_path}/{plural}/:id    delete_entry
//! ```
//!
//! ## Request protocol
//!
//! Every network operation runs the same three phases:
//!
//! 1. **issue** the request (after synchronous precondition checks, which fail
//!    fast with `InvalidId` / `InvalidInput`);
//! 2. on success **transform and cache** the response, or hand the failure to
//!    the error hook ([`Callbacks`]); by default failures are logged and
//!    swallowed, and the operation resolves to `Ok(None)`;
//! 3. **settle**: reset the loading/saving flags, then run the caller's
//!    `on_finally` hook.
//!
//! ## Concurrency
//!
//! The store is a cheap-clone handle over shared state. The cache sits behind a
//! `std::sync::Mutex` that is only taken in synchronous sections, never across
//! an `.await`, so a response is always reconciled in one uninterrupted step.
//! Two conflicting operations in flight at once leave the cache with whichever
//! response lands last.

mod cache;
mod callbacks;
mod options;

pub use cache::Cache;
pub use callbacks::Callbacks;
pub use options::StoreOptions;

use crate::api::{ApiClient, RequestOptions, Transport, TransportConfig};
use crate::error::{ApiError, StoreError};
use crate::model::{IntoRecordId, Model, ModelOwner, ModelStatus, RecordId, Resource, Schema, StatusOverrides};
use crate::{Params, Record};
use async_trait::async_trait;
use futures_util::future::{join_all, try_join_all};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{debug, error, info, instrument};

/// Loading flags of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub is_loading: bool,
    /// Set once a full list has been loaded into the cache.
    pub listed_all: bool,
}

/// Input of [`DomainStore::create_entry`]: a plain record or a built model.
pub enum NewEntry<R: Resource> {
    Record(Record),
    Model(Model<R>),
}

impl<R: Resource> From<Record> for NewEntry<R> {
    fn from(record: Record) -> Self {
        NewEntry::Record(record)
    }
}

impl<R: Resource> From<Model<R>> for NewEntry<R> {
    fn from(model: Model<R>) -> Self {
        NewEntry::Model(model)
    }
}

impl<R: Resource> TryFrom<Value> for NewEntry<R> {
    type Error = StoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(record) => Ok(NewEntry::Record(record)),
            other => Err(StoreError::InvalidInput(format!(
                "expecting a model or a record object, got {other}"
            ))),
        }
    }
}

/// Input of [`DomainStore::update_entries`]: a list or a keyed map of models.
pub struct ModelBatch<R: Resource>(Vec<Model<R>>);

impl<R: Resource> From<Vec<Model<R>>> for ModelBatch<R> {
    fn from(models: Vec<Model<R>>) -> Self {
        Self(models)
    }
}

impl<R: Resource> From<&[Model<R>]> for ModelBatch<R> {
    fn from(models: &[Model<R>]) -> Self {
        Self(models.to_vec())
    }
}

impl<R: Resource, K> From<HashMap<K, Model<R>>> for ModelBatch<R> {
    fn from(models: HashMap<K, Model<R>>) -> Self {
        Self(models.into_values().collect())
    }
}

impl<R: Resource, K> From<BTreeMap<K, Model<R>>> for ModelBatch<R> {
    fn from(models: BTreeMap<K, Model<R>>) -> Self {
        Self(models.into_values().collect())
    }
}

impl<R: Resource> From<Cache<R>> for ModelBatch<R> {
    fn from(cache: Cache<R>) -> Self {
        Self(cache.models().into_iter().cloned().collect())
    }
}

struct StoreState<R: Resource> {
    cache: Cache<R>,
    status: StoreStatus,
}

impl<R: Resource> Default for StoreState<R> {
    fn default() -> Self {
        Self {
            cache: Cache::new(),
            status: StoreStatus::default(),
        }
    }
}

pub(crate) struct StoreInner<R: Resource> {
    api: ApiClient,
    model_name: String,
    schema: Arc<Schema>,
    owner: Arc<dyn ModelOwner<R>>,
    state: Mutex<StoreState<R>>,
}

/// Cache and CRUD orchestrator for one resource.
pub struct DomainStore<R: Resource> {
    inner: Arc<StoreInner<R>>,
}

impl<R: Resource> Clone for DomainStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Resource> DomainStore<R> {
    /// A store for `{base_path}/{plural model name}` with default transport settings.
    pub fn new(transport: Arc<dyn Transport>, options: StoreOptions) -> Self {
        Self::with_config(transport, options, TransportConfig::default())
    }

    pub fn with_config(transport: Arc<dyn Transport>, options: StoreOptions, config: TransportConfig) -> Self {
        let model_name = options.model_name.unwrap_or_else(|| R::MODEL_NAME.to_string());
        let api = ApiClient::new(transport, &options.base_path, &model_name, config);
        Self::with_client(api, model_name)
    }

    pub fn with_client(api: ApiClient, model_name: impl Into<String>) -> Self {
        let model_name = model_name.into();
        let inner = Arc::new_cyclic(|weak: &Weak<StoreInner<R>>| StoreInner {
            api,
            model_name,
            schema: Arc::new(Schema::of::<R>()),
            owner: Arc::new(StoreHandle { inner: weak.clone() }),
            state: Mutex::new(StoreState::default()),
        });
        debug!(model = %inner.model_name, endpoint = inner.api.endpoint(), "Store created");
        Self { inner }
    }

    pub fn model_name(&self) -> &str {
        &self.inner.model_name
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// A weak handle the store's models persist through.
    pub fn handle(&self) -> StoreHandle<R> {
        StoreHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState<R>> {
        self.inner.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn status(&self) -> StoreStatus {
        self.state().status
    }

    pub fn len(&self) -> usize {
        self.state().cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().cache.is_empty()
    }

    // =========================================================================
    // CACHE READS
    // =========================================================================

    /// Cached model by id. Never touches the network.
    pub fn find(&self, id: impl IntoRecordId) -> Result<Option<Model<R>>, StoreError> {
        let id = id.into_record_id()?;
        Ok(self.state().cache.get(&id).cloned())
    }

    pub fn find_serialized(&self, id: impl IntoRecordId) -> Result<Option<Record>, StoreError> {
        Ok(self.find(id)?.map(|model| model.serialize()))
    }

    /// Snapshot of the whole cache.
    pub fn all(&self) -> Cache<R> {
        self.state().cache.clone()
    }

    /// Wire form of every cached model, in id order.
    pub fn all_serialized(&self) -> Vec<Record> {
        self.state().cache.serialize()
    }

    // =========================================================================
    // CACHE MUTATORS
    // =========================================================================

    /// Builds a model with `isNew` set. Nothing is cached or sent.
    pub fn create_record(&self, record: Record) -> Result<Model<R>, StoreError> {
        self.build(record, StatusOverrides::new_record())
    }

    fn build(&self, record: Record, overrides: StatusOverrides) -> Result<Model<R>, StoreError> {
        Ok(Model::build(
            Arc::clone(&self.inner.owner),
            Arc::clone(&self.inner.schema),
            record,
            overrides,
        )?)
    }

    /// Builds a model from `record` and caches it under its id, replacing any
    /// previous entry. Fails with `EmptyRecord` when the record has no id.
    pub fn push_entry(&self, record: Record) -> Result<Model<R>, StoreError> {
        let model = self.build(record, StatusOverrides::default())?;
        let mut state = self.state();
        let id = state.cache.insert(model.clone())?;
        info!(model = %self.inner.model_name, %id, size = state.cache.len(), "Cached entry");
        Ok(model)
    }

    fn push_value(&self, body: Value) -> Result<Model<R>, StoreError> {
        self.push_entry(into_record(body)?)
    }

    fn push_all(&self, body: Value) -> Result<Vec<Model<R>>, StoreError> {
        let models = into_records(body)?
            .into_iter()
            .map(|record| self.build(record, StatusOverrides::default()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = self.state();
        for model in &models {
            state.cache.insert(model.clone())?;
        }
        info!(model = %self.inner.model_name, count = models.len(), size = state.cache.len(), "Cached batch");
        Ok(models)
    }

    /// Evicts the entry with `id`, returning it.
    pub fn delete_cached(&self, id: impl IntoRecordId) -> Result<Option<Model<R>>, StoreError> {
        let id = id.into_record_id()?;
        let mut state = self.state();
        let removed = state.cache.remove(&id);
        info!(
            model = %self.inner.model_name,
            %id,
            found = removed.is_some(),
            size = state.cache.len(),
            "Evicted entry"
        );
        Ok(removed)
    }

    /// Builds a fresh cache from a list of records. The store's own cache is
    /// left untouched.
    pub fn normalize_models(&self, records: Vec<Value>) -> Result<Cache<R>, StoreError> {
        records
            .into_iter()
            .map(|value| {
                let model = self.build(into_record(value)?, StatusOverrides::default())?;
                let id = model
                    .id()
                    .ok_or_else(|| StoreError::EmptyRecord(format!("{:?}", model.fields())))?;
                Ok((id, model))
            })
            .collect()
    }

    fn replace_cache(&self, body: Value) -> Result<Cache<R>, StoreError> {
        let cache = self.normalize_models(into_array(body)?)?;
        let mut state = self.state();
        state.cache = cache.clone();
        state.status.listed_all = true;
        info!(model = %self.inner.model_name, size = cache.len(), "Replaced cache");
        Ok(cache)
    }

    fn set_loading(&self, is_loading: bool) {
        self.state().status.is_loading = is_loading;
    }

    /// Copies the model's status onto the cached entry with the same id.
    fn sync_status(&self, model: &Model<R>) {
        if let Some(id) = model.id() {
            self.update_cached_status(&id, |status| *status = model.status());
        }
    }

    fn update_cached_status(&self, id: &RecordId, update: impl FnOnce(&mut ModelStatus)) {
        if let Some(cached) = self.state().cache.get_mut(id) {
            update(cached.status_mut());
        }
    }

    fn log_error(&self, err: &StoreError) {
        error!(model = %self.inner.model_name, error = %err, "Request failed");
    }

    // =========================================================================
    // NETWORK OPERATIONS
    // =========================================================================

    /// Issue, transform-and-cache, settle. See the module docs.
    async fn run_request<T>(
        &self,
        request: impl Future<Output = Result<Value, ApiError>>,
        callbacks: Callbacks<R, T>,
        default_success: impl FnOnce(&Self, Value) -> Result<T, StoreError>,
        settle: impl FnOnce(&Self, Option<&mut T>),
    ) -> Result<Option<T>, StoreError> {
        let Callbacks { success, error, finally } = callbacks;

        let outcome = match request.await {
            Ok(body) => match success {
                Some(hook) => hook(self, body),
                None => default_success(self, body),
            },
            Err(err) => Err(err.into()),
        };

        let mut result = match outcome {
            Ok(value) => Ok(Some(value)),
            Err(err) => match error {
                Some(hook) => hook(err).map(|()| None),
                None => {
                    self.log_error(&err);
                    Ok(None)
                }
            },
        };

        settle(self, result.as_mut().ok().and_then(Option::as_mut));
        if let Some(hook) = finally {
            hook(self);
        }
        result
    }

    /// Cached model, or [`show_entry`](Self::show_entry) when it is not cached.
    pub async fn find_or_show_entry(
        &self,
        id: impl IntoRecordId,
        params: Params,
        callbacks: Callbacks<R, Model<R>>,
    ) -> Result<Option<Model<R>>, StoreError> {
        let id = id.into_record_id()?;
        if let Some(model) = self.find(&id)? {
            return Ok(Some(model));
        }
        self.show_entry(id, params, callbacks).await
    }

    /// The cache when it holds anything, otherwise [`list_entries`](Self::list_entries).
    pub async fn all_or_list_entries(
        &self,
        params: Params,
        callbacks: Callbacks<R, Cache<R>>,
    ) -> Result<Option<Cache<R>>, StoreError> {
        let cache = self.all();
        if !cache.is_empty() {
            return Ok(Some(cache));
        }
        self.list_entries(params, callbacks).await
    }

    /// [`all_or_list_entries`](Self::all_or_list_entries) with each model serialized.
    pub async fn all_or_list_entries_serialized(
        &self,
        params: Params,
        callbacks: Callbacks<R, Cache<R>>,
    ) -> Result<Option<Vec<Record>>, StoreError> {
        let cache = self.all_or_list_entries(params, callbacks).await?;
        Ok(cache.map(|cache| cache.serialize()))
    }

    /// Fetches the collection and replaces the whole cache with it.
    #[instrument(skip_all, fields(model = %self.inner.model_name))]
    pub async fn list_entries(
        &self,
        params: Params,
        callbacks: Callbacks<R, Cache<R>>,
    ) -> Result<Option<Cache<R>>, StoreError> {
        self.set_loading(true);
        let request = self.inner.api.get(params, RequestOptions::default());
        self.run_request(request, callbacks, Self::replace_cache, |store, _| {
            store.set_loading(false)
        })
        .await
    }

    /// Fetches one record and upserts it into the cache.
    #[instrument(skip_all, fields(model = %self.inner.model_name))]
    pub async fn show_entry(
        &self,
        id: impl IntoRecordId,
        params: Params,
        callbacks: Callbacks<R, Model<R>>,
    ) -> Result<Option<Model<R>>, StoreError> {
        let id = id.into_record_id()?;
        let mut params = params;
        params.insert("id".to_string(), id.to_value());

        self.set_loading(true);
        let request = self.inner.api.get(params, RequestOptions::default());
        self.run_request(request, callbacks, Self::push_value, |store, _| {
            store.set_loading(false)
        })
        .await
    }

    /// POSTs a new record.
    ///
    /// Resolves to the model built from the response, or to the in-flight model
    /// when a failure was swallowed. Either way the settled model has `isSaving`
    /// and `isNew` cleared.
    #[instrument(skip_all, fields(model = %self.inner.model_name))]
    pub async fn create_entry(
        &self,
        entry: impl Into<NewEntry<R>>,
        callbacks: Callbacks<R, Model<R>>,
    ) -> Result<Model<R>, StoreError> {
        let mut in_flight = match entry.into() {
            NewEntry::Record(record) => self.create_record(record)?,
            NewEntry::Model(model) => model,
        };
        let payload = in_flight.serialize();
        in_flight.status_mut().is_saving = true;
        self.sync_status(&in_flight);

        let request = self.inner.api.post(payload, RequestOptions::default());
        let created = self
            .run_request(request, callbacks, Self::push_value, |store, created| {
                let target = created.unwrap_or(&mut in_flight);
                let status = target.status_mut();
                status.is_saving = false;
                status.is_new = false;
                store.sync_status(target);
            })
            .await?;
        Ok(created.unwrap_or(in_flight))
    }

    /// PUTs the model's serialized fields.
    ///
    /// Resolves to the model built from the response, or to the in-flight model
    /// when a failure was swallowed.
    #[instrument(skip_all, fields(model = %self.inner.model_name))]
    pub async fn update_entry(
        &self,
        model: &Model<R>,
        callbacks: Callbacks<R, Model<R>>,
    ) -> Result<Model<R>, StoreError> {
        model.require_id()?;
        let mut in_flight = model.clone();
        in_flight.status_mut().is_saving = true;
        self.sync_status(&in_flight);

        let request = self.inner.api.put(in_flight.serialize(), RequestOptions::default());
        let updated = self
            .run_request(request, callbacks, Self::push_value, |store, updated| {
                let target = updated.unwrap_or(&mut in_flight);
                target.status_mut().is_saving = false;
                store.sync_status(target);
            })
            .await?;
        Ok(updated.unwrap_or(in_flight))
    }

    /// PUTs every model concurrently; all or nothing.
    ///
    /// The batch fails as soon as one update fails, and then no response of the
    /// batch is cached (updates the server already applied are not rolled
    /// back). On a swallowed failure the input models are returned unchanged.
    #[instrument(skip_all, fields(model = %self.inner.model_name))]
    pub async fn update_entries(
        &self,
        models: impl Into<ModelBatch<R>>,
        callbacks: Callbacks<R, Vec<Model<R>>>,
    ) -> Result<Vec<Model<R>>, StoreError> {
        let ModelBatch(models) = models.into();
        let payloads = models
            .iter()
            .map(|model| {
                model.require_id()?;
                Ok(model.serialize())
            })
            .collect::<Result<Vec<_>, StoreError>>()?;
        debug!(count = payloads.len(), "Updating batch");

        let requests = payloads
            .into_iter()
            .map(|payload| self.inner.api.put(payload, RequestOptions::default()));
        let batch = async { try_join_all(requests).await.map(Value::Array) };

        let updated = self
            .run_request(batch, callbacks, Self::push_all, |_, _| {})
            .await?;
        Ok(updated.unwrap_or(models))
    }

    /// PUTs every model concurrently and reconciles each success on its own.
    /// One result per input model, in input order.
    #[instrument(skip_all, fields(model = %self.inner.model_name))]
    pub async fn update_entries_settled(&self, models: impl Into<ModelBatch<R>>) -> Vec<Result<Model<R>, StoreError>> {
        let ModelBatch(models) = models.into();
        let updates = models.iter().map(|model| async move {
            model.require_id()?;
            let body = self.inner.api.put(model.serialize(), RequestOptions::default()).await?;
            self.push_value(body)
        });

        let results = join_all(updates).await;
        let failed = results.iter().filter(|result| result.is_err()).count();
        debug!(count = results.len(), failed, "Settled batch");
        results
    }

    /// DELETEs the record and evicts it from the cache.
    ///
    /// Returns `Ok(true)` on success and `Ok(false)` when a failure was
    /// swallowed. The id does not need to be cached. Whatever the outcome, a
    /// still-cached entry ends up with `isSaving = false` and `isDeleted = true`.
    #[instrument(skip_all, fields(model = %self.inner.model_name))]
    pub async fn delete_entry(&self, id: impl IntoRecordId, callbacks: Callbacks<R, ()>) -> Result<bool, StoreError> {
        let id = id.into_record_id()?;
        self.update_cached_status(&id, |status| status.is_saving = true);

        let mut record = Record::new();
        record.insert("id".to_string(), id.to_value());
        let request = self.inner.api.delete(record, RequestOptions::default());

        let deleted = self
            .run_request(
                request,
                callbacks,
                |store, _| store.delete_cached(&id).map(|_| ()),
                |store, _| {
                    store.update_cached_status(&id, |status| {
                        status.is_saving = false;
                        status.is_deleted = true;
                    })
                },
            )
            .await?;
        Ok(deleted.is_some())
    }
}

impl<R: Resource> fmt::Debug for DomainStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainStore")
            .field("model_name", &self.inner.model_name)
            .field("endpoint", &self.inner.api.endpoint())
            .field("len", &self.len())
            .finish()
    }
}

fn into_record(value: Value) -> Result<Record, StoreError> {
    match value {
        Value::Object(record) => Ok(record),
        other => Err(StoreError::InvalidInput(format!("expected a record object, got {other}"))),
    }
}

fn into_array(value: Value) -> Result<Vec<Value>, StoreError> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(StoreError::InvalidInput(format!("expected an array of records, got {other}"))),
    }
}

fn into_records(value: Value) -> Result<Vec<Record>, StoreError> {
    into_array(value)?.into_iter().map(into_record).collect()
}

/// Weak reference from a model back to its store.
///
/// Persistence through a handle whose store has been dropped fails with
/// [`StoreError::InvalidOwner`].
pub struct StoreHandle<R: Resource> {
    inner: Weak<StoreInner<R>>,
}

impl<R: Resource> Clone for StoreHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<R: Resource> StoreHandle<R> {
    pub fn upgrade(&self) -> Option<DomainStore<R>> {
        self.inner.upgrade().map(|inner| DomainStore { inner })
    }

    fn store(&self) -> Result<DomainStore<R>, StoreError> {
        self.upgrade()
            .ok_or_else(|| StoreError::InvalidOwner(format!("store for \"{}\" has been dropped", R::MODEL_NAME)))
    }
}

#[async_trait]
impl<R: Resource> ModelOwner<R> for StoreHandle<R> {
    async fn create_entry(&self, model: Model<R>) -> Result<Model<R>, StoreError> {
        self.store()?.create_entry(model, Callbacks::default()).await
    }

    async fn update_entry(&self, model: Model<R>) -> Result<Model<R>, StoreError> {
        self.store()?.update_entry(&model, Callbacks::default()).await
    }

    async fn delete_entry(&self, id: RecordId) -> Result<bool, StoreError> {
        self.store()?.delete_entry(id, Callbacks::default()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{AttributeSet, Descriptor, TypeTag};
    use crate::mock::MockTransport;
    use serde_json::json;

    struct User;

    impl Resource for User {
        const MODEL_NAME: &'static str = "user";

        fn attributes() -> AttributeSet {
            AttributeSet::base().with("name", Descriptor::new(TypeTag::String))
        }
    }

    fn store() -> (Arc<MockTransport>, DomainStore<User>) {
        let mock = Arc::new(MockTransport::new());
        let store = DomainStore::new(mock.clone(), StoreOptions::default());
        (mock, store)
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_find_rejects_invalid_ids() {
        let (_, store) = store();
        assert!(matches!(store.find("abc"), Err(StoreError::InvalidId(_))));
        assert!(matches!(store.find(json!(null)), Err(StoreError::InvalidId(_))));
        assert_eq!(store.find(1).unwrap(), None);
    }

    #[test]
    fn test_push_entry_overwrites_without_double_counting() {
        let (_, store) = store();
        store.push_entry(record(json!({ "id": 1, "name": "Avo" }))).unwrap();
        store.push_entry(record(json!({ "id": "1", "name": "Ngyv" }))).unwrap();
        store.push_entry(record(json!({ "id": 2 }))).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.find("01").unwrap().unwrap().get("name"), Some(json!("Ngyv")));

        store.delete_cached(1).unwrap();
        store.delete_cached(1).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_push_entry_requires_an_id() {
        let (_, store) = store();
        let err = store.push_entry(record(json!({ "name": "Avo" }))).unwrap_err();
        assert!(matches!(err, StoreError::EmptyRecord(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_normalize_models_builds_a_fresh_cache() {
        let (_, store) = store();
        store.push_entry(record(json!({ "id": 9 }))).unwrap();

        let cache = store
            .normalize_models(vec![json!({ "id": 2 }), json!({ "id": 10 }), json!({ "id": 2, "name": "dup" })])
            .unwrap();
        assert_eq!(cache.len(), 2);
        let ids: Vec<String> = cache.ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["2", "10"]);
        assert_eq!(store.len(), 1);

        assert!(matches!(store.normalize_models(vec![json!(3)]), Err(StoreError::InvalidInput(_))));
    }

    #[test]
    fn test_create_record_is_new_and_uncached() {
        let (_, store) = store();
        let model = store.create_record(record(json!({ "name": "Avo" }))).unwrap();
        assert!(model.status().is_new);
        assert!(store.is_empty());
    }

    #[test]
    fn test_serialized_reads() {
        let (_, store) = store();
        store.push_entry(record(json!({ "id": 2, "name": "B", "created_at": "2018-05-08" }))).unwrap();
        store.push_entry(record(json!({ "id": 1, "name": "A" }))).unwrap();

        assert_eq!(
            store.find_serialized(2).unwrap(),
            Some(record(json!({ "id": 2, "name": "B", "created_at": "2018-05-08" })))
        );
        let names: Vec<Value> = store.all_serialized().into_iter().map(|r| r["name"].clone()).collect();
        assert_eq!(names, vec![json!("A"), json!("B")]);
    }

    #[test]
    fn test_new_entry_from_value() {
        assert!(NewEntry::<User>::try_from(json!({ "name": "Avo" })).is_ok());
        assert!(matches!(
            NewEntry::<User>::try_from(json!("Avo")),
            Err(StoreError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_show_entry_caches_response() {
        let (mock, store) = store();
        mock.expect_get("/api/users/1").return_ok(json!({ "id": 1, "name": "Avo" }));

        let model = store.show_entry("1", Params::new(), Callbacks::default()).await.unwrap();
        assert_eq!(model.unwrap().get("name"), Some(json!("Avo")));
        assert_eq!(store.len(), 1);
        assert!(!store.status().is_loading);

        let cached = store.find_or_show_entry(1, Params::new(), Callbacks::default()).await.unwrap();
        assert!(cached.is_some());
        mock.verify();
    }

    #[tokio::test]
    async fn test_list_entries_replaces_cache() {
        let (mock, store) = store();
        store.push_entry(record(json!({ "id": 99 }))).unwrap();
        mock.expect_get("/api/users?name=Avo").return_ok(json!([{ "id": 1, "name": "Avo" }]));

        let mut params = Params::new();
        params.insert("name".into(), json!("Avo"));
        let cache = store.list_entries(params, Callbacks::default()).await.unwrap().unwrap();

        assert_eq!(cache.len(), 1);
        assert_eq!(store.find(99).unwrap(), None);
        assert_eq!(store.status(), StoreStatus { is_loading: false, listed_all: true });

        let again = store.all_or_list_entries(Params::new(), Callbacks::default()).await.unwrap();
        assert_eq!(again.unwrap().len(), 1);
        mock.verify();
    }

    #[tokio::test]
    async fn test_errors_are_swallowed_unless_propagated() {
        let (mock, store) = store();
        mock.expect_get("/api/users").return_status(500, json!({}));
        mock.expect_get("/api/users").return_status(500, json!({}));

        let swallowed = store.list_entries(Params::new(), Callbacks::default()).await;
        assert_eq!(swallowed, Ok(None));

        let propagated = store.list_entries(Params::new(), Callbacks::propagate()).await;
        assert!(matches!(propagated, Err(ref err) if err.is_network()));
        assert!(!store.status().is_loading);
        assert!(!store.status().listed_all);
    }

    #[tokio::test]
    async fn test_custom_success_and_finally_hooks() {
        let (mock, store) = store();
        mock.expect_get("/api/users").return_ok(json!({ "users": [{ "id": 4 }] }));

        let finished = Arc::new(Mutex::new(false));
        let flag = finished.clone();
        let callbacks = Callbacks::new()
            .on_success(|store: &DomainStore<User>, body: Value| {
                let records = body["users"].as_array().cloned().unwrap_or_default();
                let cache = store.normalize_models(records)?;
                for model in cache.models() {
                    store.push_entry(model.fields().clone())?;
                }
                Ok(cache)
            })
            .on_finally(move |store: &DomainStore<User>| {
                assert!(!store.status().is_loading);
                *flag.lock().unwrap() = true;
            });

        let cache = store.list_entries(Params::new(), callbacks).await.unwrap().unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(store.len(), 1);
        assert!(*finished.lock().unwrap());
    }

    #[tokio::test]
    async fn test_dropped_store_invalidates_models() {
        let (_, store) = store();
        let mut model = store.push_entry(record(json!({ "id": 1, "name": "Avo" }))).unwrap();
        drop(store);

        model.set("name", "Ngyv").unwrap();
        assert!(matches!(model.save().await, Err(StoreError::InvalidOwner(_))));
    }
}
