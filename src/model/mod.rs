//! # Models
//!
//! A [`Model`] wraps one record of a [`Resource`]. It keeps two views of the
//! record:
//!
//! * `snapshot` - the record as last received from the store, never mutated;
//! * `fields` - the live view, edited through [`Model::set`].
//!
//! Dirty tracking compares the two. Persistence is delegated to the model's
//! [`ModelOwner`], normally the [`DomainStore`](crate::store::DomainStore)
//! that built it.
//!
//! ```rust
//! use remodel::model::{Model, Resource};
//!
//! struct Note;
//! impl Resource for Note {
//!     const MODEL_NAME: &'static str = "note";
//! }
//!
//! let record = serde_json::json!({ "id": 1, "body": "draft" });
//! let mut note = Model::<Note>::detached(record.as_object().cloned().unwrap()).unwrap();
//! assert!(!note.is_dirty());
//!
//! note.set("body", "final").unwrap();
//! assert!(note.is_dirty());
//! note.discard_changes();
//! assert_eq!(note.get("body"), Some("draft".into()));
//! ```

mod id;
mod owner;
mod resource;

pub use id::{IntoRecordId, RecordId};
pub use owner::ModelOwner;
pub use resource::Resource;

use crate::descriptor::AttributeSet;
use crate::error::{ModelError, StoreError};
use crate::keys::KeyMap;
use crate::validate::validate_record;
use crate::{path, Record};
use owner::DetachedOwner;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

const STATUS_PATH: &str = "status";

/// Persistence flags of a model, independent of field dirtiness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub is_saving: bool,
    pub is_new: bool,
    pub is_deleted: bool,
}

impl ModelStatus {
    pub fn apply(&mut self, overrides: StatusOverrides) {
        if let Some(is_saving) = overrides.is_saving {
            self.is_saving = is_saving;
        }
        if let Some(is_new) = overrides.is_new {
            self.is_new = is_new;
        }
        if let Some(is_deleted) = overrides.is_deleted {
            self.is_deleted = is_deleted;
        }
    }

    fn flag(&self, name: &str) -> Option<bool> {
        match name {
            "isSaving" => Some(self.is_saving),
            "isNew" => Some(self.is_new),
            "isDeleted" => Some(self.is_deleted),
            _ => None,
        }
    }

    fn flag_mut(&mut self, name: &str) -> Option<&mut bool> {
        match name {
            "isSaving" => Some(&mut self.is_saving),
            "isNew" => Some(&mut self.is_new),
            "isDeleted" => Some(&mut self.is_deleted),
            _ => None,
        }
    }
}

/// Partial [`ModelStatus`] applied on construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverrides {
    pub is_saving: Option<bool>,
    pub is_new: Option<bool>,
    pub is_deleted: Option<bool>,
}

impl StatusOverrides {
    /// Status of a record built locally and not yet persisted.
    pub fn new_record() -> Self {
        Self {
            is_new: Some(true),
            ..Self::default()
        }
    }
}

/// One entry of [`Model::changed_attributes`]. `None` means the key is absent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// Which persistence call [`Model::save`] dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated,
    Deleted,
    Unchanged,
}

/// Descriptors and key table of a resource, derived once per store.
#[derive(Debug, Clone)]
pub(crate) struct Schema {
    pub(crate) attributes: AttributeSet,
    pub(crate) keys: KeyMap,
}

impl Schema {
    pub(crate) fn of<R: Resource>() -> Self {
        let attributes = R::attributes();
        let keys = KeyMap::from_attributes(&attributes);
        Self { attributes, keys }
    }
}

/// In-memory wrapper around one record, with dirty tracking.
pub struct Model<R: Resource> {
    owner: Arc<dyn ModelOwner<R>>,
    schema: Arc<Schema>,
    fields: Record,
    snapshot: Arc<Record>,
    status: ModelStatus,
}

impl<R: Resource> Model<R> {
    /// Validates `record`, normalizes its keys to camelCase and snapshots it.
    ///
    /// Fails when a `required` attribute does not match its descriptor.
    pub fn new(owner: Arc<dyn ModelOwner<R>>, record: Record, overrides: StatusOverrides) -> Result<Self, ModelError> {
        Self::build(owner, Arc::new(Schema::of::<R>()), record, overrides)
    }

    /// A model that is not attached to any store. `save()` and `delete()`
    /// fail with [`StoreError::InvalidOwner`].
    pub fn detached(record: Record) -> Result<Self, ModelError> {
        Self::new(Arc::new(DetachedOwner), record, StatusOverrides::default())
    }

    pub(crate) fn build(
        owner: Arc<dyn ModelOwner<R>>,
        schema: Arc<Schema>,
        record: Record,
        overrides: StatusOverrides,
    ) -> Result<Self, ModelError> {
        let mut fields = schema.keys.record_to_local(&record);
        validate_record(&fields, &schema.attributes)?;

        for (name, descriptor) in schema.attributes.iter() {
            match descriptor.default_value() {
                Some(default) if !fields.contains_key(name) => {
                    fields.insert(name.to_string(), default.clone());
                }
                _ => {}
            }
        }

        let mut status = ModelStatus::default();
        status.apply(overrides);

        Ok(Self {
            owner,
            schema,
            snapshot: Arc::new(fields.clone()),
            fields,
            status,
        })
    }

    pub fn status(&self) -> ModelStatus {
        self.status
    }

    pub(crate) fn status_mut(&mut self) -> &mut ModelStatus {
        &mut self.status
    }

    pub fn fields(&self) -> &Record {
        &self.fields
    }

    pub fn snapshot(&self) -> &Record {
        &self.snapshot
    }

    /// Top-level attribute lookup.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn id(&self) -> Option<RecordId> {
        self.fields.get("id").and_then(|id| id.into_record_id().ok())
    }

    /// Dotted-path read. `status`, `status.isSaving`, `status.isNew` and
    /// `status.isDeleted` read the persistence flags; every other path reads
    /// the fields.
    pub fn get(&self, path: &str) -> Option<Value> {
        if path == STATUS_PATH {
            return serde_json::to_value(self.status).ok();
        }
        if let Some(flag) = path.strip_prefix("status.") {
            return self.status.flag(flag).map(Value::Bool);
        }
        path::get(&self.fields, path).cloned()
    }

    /// Dotted-path write. Status flags accept booleans only.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ModelError> {
        let value = value.into();
        if path == STATUS_PATH {
            return Err(ModelError::InvalidPath {
                path: path.to_string(),
                reason: "status is reserved; set its flags individually".to_string(),
            });
        }
        if let Some(flag) = path.strip_prefix("status.") {
            let (Some(slot), Value::Bool(on)) = (self.status.flag_mut(flag), &value) else {
                return Err(ModelError::InvalidPath {
                    path: path.to_string(),
                    reason: "expected a boolean status flag".to_string(),
                });
            };
            *slot = *on;
            return Ok(());
        }
        path::set(&mut self.fields, path, value)
    }

    /// Removes the value at `path`, returning it.
    pub fn unset(&mut self, path: &str) -> Option<Value> {
        path::unset(&mut self.fields, path)
    }

    /// Keys whose live value differs from the snapshot (deep comparison).
    /// Keys missing on one side count as changed.
    pub fn changed_attributes(&self) -> BTreeMap<String, Change> {
        let keys: BTreeSet<&String> = self.snapshot.keys().chain(self.fields.keys()).collect();
        keys.into_iter()
            .filter_map(|key| {
                let before = self.snapshot.get(key);
                let after = self.fields.get(key);
                (before != after).then(|| {
                    (
                        key.clone(),
                        Change {
                            before: before.cloned(),
                            after: after.cloned(),
                        },
                    )
                })
            })
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.status.is_deleted || !self.changed_attributes().is_empty()
    }

    /// Resets the fields to the snapshot.
    pub fn discard_changes(&mut self) {
        self.fields = (*self.snapshot).clone();
    }

    /// Marks the model deleted locally; the next `save()` deletes it remotely.
    pub fn soft_delete(&mut self) {
        self.status.is_deleted = true;
    }

    /// Wire form of the model: snake_case keys, current values.
    ///
    /// Projects the resource's serializable keys, or every snapshot key when the
    /// resource does not declare any. Keys without a current value are skipped.
    pub fn serialize(&self) -> Record {
        let keys: Vec<String> = match R::serializable() {
            Some(keys) => keys.into_iter().map(str::to_string).collect(),
            None => self.snapshot.keys().cloned().collect(),
        };
        keys.into_iter()
            .filter_map(|key| {
                let value = self.fields.get(&key)?.clone();
                Some((self.schema.keys.to_wire(&key), value))
            })
            .collect()
    }

    /// Persists the model according to its status: new models are created,
    /// soft-deleted models are deleted, dirty models are updated. Clean models
    /// are left alone.
    ///
    /// On return `self` holds the model reconciled by the owner.
    pub async fn save(&mut self) -> Result<SaveOutcome, StoreError> {
        let owner = Arc::clone(&self.owner);
        if self.status.is_new {
            *self = owner.create_entry(self.clone()).await?;
            Ok(SaveOutcome::Created)
        } else if self.status.is_deleted {
            self.delete().await?;
            Ok(SaveOutcome::Deleted)
        } else if self.is_dirty() {
            *self = owner.update_entry(self.clone()).await?;
            Ok(SaveOutcome::Updated)
        } else {
            Ok(SaveOutcome::Unchanged)
        }
    }

    /// Deletes the record remotely regardless of dirtiness. Returns whether
    /// the owner reported success.
    pub async fn delete(&mut self) -> Result<bool, StoreError> {
        let id = self.require_id()?;
        let owner = Arc::clone(&self.owner);
        self.status.is_saving = true;
        let deleted = owner.delete_entry(id).await;
        self.status.is_saving = false;
        self.status.is_deleted = true;
        deleted
    }

    pub(crate) fn require_id(&self) -> Result<RecordId, StoreError> {
        match self.fields.get("id") {
            Some(id) => id.into_record_id(),
            None => Err(StoreError::InvalidId("undefined".to_string())),
        }
    }
}

impl<R: Resource> Clone for Model<R> {
    fn clone(&self) -> Self {
        Self {
            owner: Arc::clone(&self.owner),
            schema: Arc::clone(&self.schema),
            fields: self.fields.clone(),
            snapshot: Arc::clone(&self.snapshot),
            status: self.status,
        }
    }
}

impl<R: Resource> PartialEq for Model<R> {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields && self.snapshot == other.snapshot && self.status == other.status
    }
}

impl<R: Resource> fmt::Debug for Model<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("model", &R::MODEL_NAME)
            .field("fields", &self.fields)
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Descriptor, TypeTag};
    use crate::error::ValidationError;
    use serde_json::json;

    struct User;

    impl Resource for User {
        const MODEL_NAME: &'static str = "user";

        fn attributes() -> AttributeSet {
            AttributeSet::base()
                .with(
                    "name",
                    Descriptor::new(TypeTag::String)
                        .required()
                        .accepting([TypeTag::Undefined, TypeTag::Null, TypeTag::EmptyString]),
                )
                .with("favouriteFood", Descriptor::new(TypeTag::Array))
                .with("role", Descriptor::new(TypeTag::String).with_default("member"))
        }
    }

    struct Summary;

    impl Resource for Summary {
        const MODEL_NAME: &'static str = "summary";

        fn serializable() -> Option<Vec<&'static str>> {
            Some(vec!["id", "title"])
        }
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_construction_is_clean() {
        let model = Model::<User>::detached(record(json!({ "id": 1, "name": "Avo" }))).unwrap();

        assert_eq!(model.get("name"), Some(json!("Avo")));
        assert!(!model.status().is_new);
        assert!(!model.is_dirty());
        assert!(model.changed_attributes().is_empty());
        assert_eq!(model.field("role"), Some(&json!("member")));
    }

    #[test]
    fn test_required_mismatch_fails_construction() {
        let err = Model::<User>::detached(record(json!({ "name": 10 }))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected \"string\" but got property \"10\" of type \"number\" instead"
        );
        assert!(matches!(err, ModelError::Validation(ValidationError::AttributeTypeMismatch { .. })));
    }

    #[test]
    fn test_wire_keys_are_localized_and_restored() {
        let wire = json!({ "id": 3, "name": "Avo", "favourite_food": ["pho"], "created_at": "2018-05-08" });
        let model = Model::<User>::detached(record(wire.clone())).unwrap();

        assert_eq!(model.get("favouriteFood.0"), Some(json!("pho")));
        assert_eq!(model.get("createdAt"), Some(json!("2018-05-08")));

        let mut expected = record(wire);
        expected.insert("role".into(), json!("member"));
        assert_eq!(model.serialize(), expected);
    }

    #[test]
    fn test_set_tracks_changes() {
        let mut model = Model::<User>::detached(record(json!({ "id": 1, "name": "Avo" }))).unwrap();

        model.set("name", "Avo").unwrap();
        assert!(!model.is_dirty());

        model.set("name", "Ngyv").unwrap();
        model.set("address.city", "Singapore").unwrap();
        let changes = model.changed_attributes();
        assert_eq!(changes.len(), 2);
        assert_eq!(
            changes["name"],
            Change {
                before: Some(json!("Avo")),
                after: Some(json!("Ngyv"))
            }
        );
        assert_eq!(changes["address"].before, None);

        model.discard_changes();
        assert!(!model.is_dirty());
        assert_eq!(model.get("address"), None);
    }

    #[test]
    fn test_unset_counts_as_change() {
        let mut model = Model::<User>::detached(record(json!({ "id": 1, "name": "Avo" }))).unwrap();
        assert_eq!(model.unset("name"), Some(json!("Avo")));
        assert_eq!(model.changed_attributes()["name"].after, None);
    }

    #[test]
    fn test_status_paths() {
        let mut model = Model::<User>::detached(record(json!({ "id": 1 }))).unwrap();
        assert_eq!(model.get("status.isDeleted"), Some(json!(false)));

        model.set("status.isDeleted", true).unwrap();
        assert!(model.status().is_deleted);
        assert!(model.is_dirty());
        assert_eq!(
            model.get("status"),
            Some(json!({ "isSaving": false, "isNew": false, "isDeleted": true }))
        );

        assert!(model.set("status.isDeleted", "yes").is_err());
        assert!(model.set("status.unknown", true).is_err());
        assert!(model.set("status", json!({})).is_err());
    }

    #[test]
    fn test_soft_delete_makes_dirty() {
        let mut model = Model::<User>::detached(record(json!({ "id": 1 }))).unwrap();
        model.soft_delete();
        assert!(model.is_dirty());
        assert!(model.changed_attributes().is_empty());
    }

    #[test]
    fn test_serialize_uses_whitelist() {
        let model =
            Model::<Summary>::detached(record(json!({ "id": 7, "title": "Hi", "body": "long" }))).unwrap();
        assert_eq!(model.serialize(), record(json!({ "id": 7, "title": "Hi" })));
    }

    #[test]
    fn test_overrides_apply() {
        let model = Model::<User>::new(
            Arc::new(DetachedOwner),
            record(json!({ "name": "New" })),
            StatusOverrides::new_record(),
        )
        .unwrap();
        assert!(model.status().is_new);
        assert_eq!(model.id(), None);
    }

    #[tokio::test]
    async fn test_detached_model_cannot_persist() {
        let mut model = Model::<User>::detached(record(json!({ "id": 1, "name": "Avo" }))).unwrap();
        assert_eq!(model.save().await.unwrap(), SaveOutcome::Unchanged);

        model.set("name", "Ngyv").unwrap();
        assert!(matches!(model.save().await, Err(StoreError::InvalidOwner(_))));
        assert!(matches!(model.delete().await, Err(StoreError::InvalidOwner(_))));
    }
}
