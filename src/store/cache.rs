use crate::error::StoreError;
use crate::model::{Model, RecordId, Resource};
use crate::Record;
use std::collections::HashMap;
use std::fmt;

/// Models of one store keyed by [`RecordId`].
///
/// Every entry's `id` field names its key; the count is always the number of
/// distinct keys.
pub struct Cache<R: Resource> {
    entries: HashMap<RecordId, Model<R>>,
}

impl<R: Resource> Cache<R> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &RecordId) -> Option<&Model<R>> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.entries.contains_key(id)
    }

    /// Ids in numeric order.
    pub fn ids(&self) -> Vec<RecordId> {
        let mut ids: Vec<RecordId> = self.entries.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Models in id order.
    pub fn models(&self) -> Vec<&Model<R>> {
        self.ids().iter().filter_map(|id| self.entries.get(id)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &Model<R>)> {
        self.entries.iter()
    }

    /// Wire form of every model, in id order.
    pub fn serialize(&self) -> Vec<Record> {
        self.models().into_iter().map(Model::serialize).collect()
    }

    /// Inserts or overwrites the entry named by the model's id.
    pub(crate) fn insert(&mut self, model: Model<R>) -> Result<RecordId, StoreError> {
        let id = model
            .id()
            .ok_or_else(|| StoreError::EmptyRecord(format!("{:?}", model.fields())))?;
        self.entries.insert(id.clone(), model);
        Ok(id)
    }

    pub(crate) fn remove(&mut self, id: &RecordId) -> Option<Model<R>> {
        self.entries.remove(id)
    }

    pub(crate) fn get_mut(&mut self, id: &RecordId) -> Option<&mut Model<R>> {
        self.entries.get_mut(id)
    }
}

impl<R: Resource> Default for Cache<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> Clone for Cache<R> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<R: Resource> PartialEq for Cache<R> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<R: Resource> fmt::Debug for Cache<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<R: Resource> FromIterator<(RecordId, Model<R>)> for Cache<R> {
    fn from_iter<I: IntoIterator<Item = (RecordId, Model<R>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
