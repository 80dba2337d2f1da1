//! # Typed Stores
//!
//! The application does not hand raw [`DomainStore`](remodel::DomainStore)s
//! around. Each resource gets a wrapper that exposes domain methods and its
//! own error type; the generic reads come from [`StoreClient`].

mod error;
mod post_store;
mod store_client;
mod user_store;

pub use error::{PostError, UserError};
pub use post_store::PostStore;
pub use store_client::StoreClient;
pub use user_store::UserStore;
