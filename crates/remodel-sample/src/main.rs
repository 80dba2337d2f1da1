//! # Remodel Sample
//!
//! Runs the typed stores of [`remodel_sample`] against an in-memory backend:
//!
//! 1. Loads the seeded users and registers a new one.
//! 2. Renames a user and edits another through `Model::save`.
//! 3. Drafts posts and publishes them in one batch.
//! 4. Deletes a user, then shows a swallowed and a propagated failure.

use remodel::api::InMemoryBackend;
use remodel::logging::setup_tracing;
use remodel::model::IntoRecordId;
use remodel::{Callbacks, StoreOptions};
use remodel_sample::stores::{PostStore, StoreClient, UserStore};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing once for the entire application
    setup_tracing();

    let backend = Arc::new(InMemoryBackend::new("/api").seed(
        "users",
        [
            json!({ "id": 1, "name": "Avo", "email": "avo@example.com", "role": "admin" }),
            json!({ "id": 2, "name": "Ngyv", "email": "ngyv@example.com", "role": "member" }),
        ],
    ));
    let users = UserStore::new(backend.clone(), StoreOptions::default());
    let posts = PostStore::new(backend.clone(), StoreOptions::default());

    let span = tracing::info_span!("users");
    let author = async {
        let loaded = users.load_all().await?;
        info!(count = loaded.len(), "Users loaded");

        let user = users.register("Mirth", "mirth@example.com").await?;
        info!(id = ?user.id(), role = ?user.get("role"), "User registered");

        let renamed = users.rename(1_i64.into_record_id()?, "Avocado").await?;
        info!(name = ?renamed.get("name"), "User renamed");

        let mut ngyv = users.get(2_i64.into_record_id()?).await?.ok_or("user 2 is gone")?;
        ngyv.set("email", "ngyv@example.org")?;
        let outcome = ngyv.save().await?;
        info!(?outcome, dirty = ngyv.is_dirty(), "User saved");

        Ok::<_, Box<dyn std::error::Error>>(renamed)
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("posts");
    async {
        let author_id = author.id().ok_or("author has no id")?;
        let first = posts.draft(&author_id, "Hello", "First post").await?;
        let second = posts.draft(&author_id, "Again", "Second post").await?;
        let ids: Vec<_> = [first.id(), second.id()].into_iter().flatten().collect();

        let published = posts.publish(&ids).await?;
        info!(count = published.len(), "Posts published");
        info!(payload = %json!(posts.export()), "Cached posts");
        info!(by_author = posts.by_author(&author_id).len(), published = posts.published().len(), "Post counts");

        Ok::<_, Box<dyn std::error::Error>>(())
    }
    .instrument(span)
    .await?;

    users.delete(2_i64.into_record_id()?).await?;
    info!(remaining = backend.records("users").len(), "User deleted");

    // Default callbacks log the failure and hand back the cached state.
    backend.fail_next(503);
    let missing = users.inner().show_entry(42, Default::default(), Callbacks::default()).await?;
    info!(found = missing.is_some(), "Swallowed failure");

    backend.fail_next(503);
    if let Err(e) = users.load_all().await {
        error!(error = %e, "Propagated failure");
    }

    info!("Application completed successfully");
    Ok(())
}
