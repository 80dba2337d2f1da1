//! # Post Store
//!
//! Provides a high-level API over the `Post` domain store.

use crate::model::Post;
use crate::stores::{PostError, StoreClient};
use async_trait::async_trait;
use remodel::model::RecordId;
use remodel::{Callbacks, DomainStore, Model, Record, StoreOptions, Transport};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Store for the `posts` resource.
#[derive(Clone)]
pub struct PostStore {
    inner: DomainStore<Post>,
}

impl PostStore {
    pub fn new(transport: Arc<dyn Transport>, options: StoreOptions) -> Self {
        Self {
            inner: DomainStore::new(transport, options),
        }
    }
}

#[async_trait]
impl StoreClient<Post> for PostStore {
    type Error = PostError;

    fn inner(&self) -> &DomainStore<Post> {
        &self.inner
    }
}

impl PostStore {
    #[instrument(skip(self, body))]
    pub async fn draft(&self, author: &RecordId, title: &str, body: &str) -> Result<Model<Post>, PostError> {
        debug!("Sending request");
        let mut record = Record::new();
        record.insert("title".to_string(), title.into());
        record.insert("body".to_string(), body.into());
        record.insert("userId".to_string(), author.to_value());
        Ok(self.inner.create_entry(record, Callbacks::propagate()).await?)
    }

    /// Publishes every post in one batch. Nothing is cached unless all of
    /// them succeed.
    #[instrument(skip(self))]
    pub async fn publish(&self, ids: &[RecordId]) -> Result<Vec<Model<Post>>, PostError> {
        let mut batch = Vec::with_capacity(ids.len());
        for id in ids {
            let mut post = self
                .inner
                .find(id)?
                .ok_or_else(|| PostError::NotFound(id.to_string()))?;
            post.set("published", true)?;
            batch.push(post);
        }
        Ok(self.inner.update_entries(batch, Callbacks::propagate()).await?)
    }

    /// Cached posts of one author, in id order.
    pub fn by_author(&self, author: &RecordId) -> Vec<Model<Post>> {
        let author = author.to_value();
        self.inner
            .all()
            .models()
            .into_iter()
            .filter(|post| post.get("userId").as_ref() == Some(&author))
            .cloned()
            .collect()
    }

    /// Cached posts that are published, in id order.
    pub fn published(&self) -> Vec<Model<Post>> {
        self.inner
            .all()
            .models()
            .into_iter()
            .filter(|post| post.get("published") == Some(json!(true)))
            .cloned()
            .collect()
    }

    /// Wire form of every cached post.
    pub fn export(&self) -> Vec<Value> {
        self.inner.all_serialized().into_iter().map(Value::Object).collect()
    }
}
