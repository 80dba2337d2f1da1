//! Error types for the typed stores.

use remodel::{ModelError, StoreError};
use thiserror::Error;

/// Errors that can occur during user operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    /// The requested user was not found.
    #[error("User not found: {0}")]
    NotFound(String),

    /// An edit on the user model was rejected.
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors that can occur during post operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PostError {
    #[error("Post not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
