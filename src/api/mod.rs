//! # REST API Client
//!
//! [`ApiClient`] turns CRUD calls into [`HttpRequest`]s for one resource and
//! hands them to a [`Transport`]. The transport is the only piece that knows
//! how bytes move: production code plugs in its HTTP stack, tests use
//! [`MockTransport`](crate::mock::MockTransport) or the [`InMemoryBackend`].
//!
//! Every request carries `Accept` / `Content-Type: application/json` and the
//! `csrf-token` from [`TransportConfig`], merged with configured and per-call
//! headers (per-call wins).

mod client;
pub mod inflect;
mod memory;
pub mod query;
mod transport;

pub use client::ApiClient;
pub use inflect::pluralize;
pub use memory::InMemoryBackend;
pub use transport::{
    Credentials, HttpMethod, HttpRequest, HttpResponse, RequestOptions, Transport, TransportConfig, CSRF_TOKEN_ENV,
};
