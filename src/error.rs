//! # Errors
//!
//! Every layer owns one error enum, and [`StoreError`] is the union the store
//! surfaces to callers. Precondition faults (`InvalidId`, `InvalidInput`, ...)
//! are returned synchronously from the call that detects them. Network failures
//! travel through [`ApiError`] and reach the caller only when the operation's
//! error callback decides to propagate them.

use crate::descriptor::TypeTag;
use serde_json::Value;

/// Errors raised while declaring attribute descriptors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DescriptorError {
    #[error("Unexpected \"{0}\" passed as \"typeName\"")]
    InvalidTypeName(String),
    #[error("Attribute \"type\" for \"{0}\" is not specified")]
    MissingTypeDescriptor(String),
    #[error("Invalid attribute schema: {0}")]
    InvalidSchema(String),
}

/// Errors raised by attribute validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The record handed to validation is not an object.
    #[error("Non-object passed")]
    InvalidInput,

    /// A `required` attribute does not match its declared type.
    #[error("Expected \"{expected}\" but got property \"{value}\" of type \"{actual}\" instead")]
    AttributeTypeMismatch {
        expected: TypeTag,
        value: String,
        actual: TypeTag,
    },
}

/// Errors raised by a [`Model`](crate::model::Model) outside of persistence.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Invalid path \"{path}\": {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Errors produced by the transport that carries requests to the backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("Transport closed")]
    Closed,
    #[error("Transport dropped response channel")]
    Dropped,
    #[error("Request failed: {0}")]
    Failed(String),
}

/// Errors returned by the [`ApiClient`](crate::api::ApiClient).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The backend answered with a non-2xx status.
    #[error("Request rejected with status {status}")]
    Status { status: u16, body: Value },

    /// `put`/`delete` need the record id to address the resource.
    #[error("Missing \"id\" for {0} request")]
    MissingId(&'static str),
}

/// Errors surfaced by a [`DomainStore`](crate::store::DomainStore).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Expected \"id\" as \"number\" or numeric \"string\", got {0}")]
    InvalidId(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Record has no \"id\" to cache it under: {0}")]
    EmptyRecord(String),

    /// The model is not attached to a live store.
    #[error("Invalid domain store: {0}")]
    InvalidOwner(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl StoreError {
    /// True when the error came back from the network rather than a local precondition.
    pub fn is_network(&self) -> bool {
        matches!(self, StoreError::Api(_))
    }
}
