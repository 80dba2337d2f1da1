//! # Mock Transports & Testing Guide
//!
//! Two test doubles implement [`Transport`] so a
//! [`DomainStore`](crate::store::DomainStore) or an
//! [`ApiClient`](crate::api::ApiClient) can be tested without a server.
//!
//! | Double | Answers | Use Case |
//! |--------|---------|----------|
//! | [`MockTransport`] | Immediately, from a queue of expectations | Request shape, error handling, cache reconciliation |
//! | [`ChannelTransport`] | When the test responds to the [`PendingRequest`] | In-flight state, response ordering, concurrency |
//!
//! For full CRUD flows against a stateful fake, use
//! [`InMemoryBackend`](crate::api::InMemoryBackend) instead.
//!
//! ## Pattern 0: Expectations
//!
//! ```rust
//! use remodel::mock::MockTransport;
//! use remodel::model::Resource;
//! use remodel::store::{Callbacks, DomainStore, StoreOptions};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! struct User;
//! impl Resource for User {
//!     const MODEL_NAME: &'static str = "user";
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mock = Arc::new(MockTransport::new());
//!     mock.expect_get("/api/users/1").return_ok(json!({ "id": 1, "name": "Avo" }));
//!
//!     let store = DomainStore::<User>::new(mock.clone(), StoreOptions::default());
//!     let user = store.show_entry(1, Default::default(), Callbacks::default()).await.unwrap();
//!     assert_eq!(user.unwrap().get("name"), Some(json!("Avo")));
//!
//!     mock.verify();
//! }
//! ```
//!
//! ## Pattern 1: Holding a response in flight
//!
//! ```rust
//! use remodel::mock::{create_mock_transport, expect_request};
//! use remodel::model::Resource;
//! use remodel::store::{Callbacks, DomainStore, StoreOptions};
//! use serde_json::json;
//!
//! struct User;
//! impl Resource for User {
//!     const MODEL_NAME: &'static str = "user";
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let (transport, mut receiver) = create_mock_transport(10);
//!     let store = DomainStore::<User>::new(transport, StoreOptions::default());
//!
//!     let task = tokio::spawn({
//!         let store = store.clone();
//!         async move { store.list_entries(Default::default(), Callbacks::default()).await }
//!     });
//!
//!     let pending = expect_request(&mut receiver).await.expect("Expected a request");
//!     assert!(store.status().is_loading);
//!     pending.respond_ok(json!([{ "id": 1 }]));
//!
//!     task.await.unwrap().unwrap();
//!     assert!(!store.status().is_loading);
//! }
//! ```

use crate::api::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::error::TransportError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

struct Expectation {
    method: HttpMethod,
    url: String,
    response: Result<HttpResponse, TransportError>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A transport that answers from a queue of expectations, in order.
///
/// A request that does not match the next expectation panics, failing the test.
///
/// # Example
/// ```ignore
/// let mock = Arc::new(MockTransport::new());
/// mock.expect_put("/api/users/1").return_ok(json!({ "id": 1, "name": "Ngyv" }));
/// mock.expect_delete("/api/users/1").return_status(500, json!({}));
///
/// // Use the mock as a store's transport...
/// mock.verify(); // Ensures all expectations were met
/// ```
#[derive(Default)]
pub struct MockTransport {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    /// Creates a mock transport with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects a request with `method` to exactly `url` (including the query).
    pub fn expect(&self, method: HttpMethod, url: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            url: url.into(),
            expectations: self.expectations.clone(),
        }
    }

    pub fn expect_get(&self, url: impl Into<String>) -> ExpectationBuilder {
        self.expect(HttpMethod::Get, url)
    }

    pub fn expect_post(&self, url: impl Into<String>) -> ExpectationBuilder {
        self.expect(HttpMethod::Post, url)
    }

    pub fn expect_put(&self, url: impl Into<String>) -> ExpectationBuilder {
        self.expect(HttpMethod::Put, url)
    }

    pub fn expect_delete(&self, url: impl Into<String>) -> ExpectationBuilder {
        self.expect(HttpMethod::Delete, url)
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let remaining = lock(&self.expectations).len();
        if remaining > 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(request.clone());
        let expectation = lock(&self.expectations).pop_front();

        match expectation {
            Some(expected) if expected.method == request.method && expected.url == request.url => expected.response,
            Some(expected) => panic!(
                "Unexpected request {} {}, expected {} {}",
                request.method, request.url, expected.method, expected.url
            ),
            None => panic!("Unexpected request {} {}, no expectations left", request.method, request.url),
        }
    }
}

/// Builder for one expected request.
pub struct ExpectationBuilder {
    method: HttpMethod,
    url: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl ExpectationBuilder {
    /// Answers with `200` and `body`.
    pub fn return_ok(self, body: Value) {
        self.push(Ok(HttpResponse::ok(body)));
    }

    /// Answers with an arbitrary status.
    pub fn return_status(self, status: u16, body: Value) {
        self.push(Ok(HttpResponse::with_status(status, body)));
    }

    /// Fails the exchange itself.
    pub fn return_err(self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<HttpResponse, TransportError>) {
        lock(&self.expectations).push_back(Expectation {
            method: self.method,
            url: self.url,
            response,
        });
    }
}

// =============================================================================
// CHANNEL HELPERS
// =============================================================================

/// A request waiting for the test to answer it.
#[derive(Debug)]
pub struct PendingRequest {
    pub request: HttpRequest,
    respond_to: oneshot::Sender<Result<HttpResponse, TransportError>>,
}

impl PendingRequest {
    pub fn respond(self, response: Result<HttpResponse, TransportError>) {
        let _ = self.respond_to.send(response);
    }

    pub fn respond_ok(self, body: Value) {
        self.respond(Ok(HttpResponse::ok(body)));
    }

    pub fn respond_status(self, status: u16, body: Value) {
        self.respond(Ok(HttpResponse::with_status(status, body)));
    }

    pub fn respond_err(self, error: TransportError) {
        self.respond(Err(error));
    }
}

/// A transport that forwards every request to a channel the test controls.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    sender: mpsc::Sender<PendingRequest>,
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(PendingRequest { request, respond_to })
            .await
            .map_err(|_| TransportError::Closed)?;
        response.await.map_err(|_| TransportError::Dropped)?
    }
}

/// Creates a channel transport and the receiver the test answers from.
///
/// # Testing Strategy
/// The store awaits each response, so the test can inspect state between the
/// request leaving and the response arriving (in-flight flags), and can answer
/// concurrent requests in any order.
pub fn create_mock_transport(buffer_size: usize) -> (Arc<ChannelTransport>, mpsc::Receiver<PendingRequest>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (Arc::new(ChannelTransport { sender }), receiver)
}

/// Waits for the next request sent through a [`ChannelTransport`].
pub async fn expect_request(receiver: &mut mpsc::Receiver<PendingRequest>) -> Option<PendingRequest> {
    receiver.recv().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, RequestOptions, TransportConfig};
    use serde_json::json;

    #[tokio::test]
    async fn test_channel_transport_round_trip() {
        let (transport, mut receiver) = create_mock_transport(4);
        let api = ApiClient::new(transport, "/api", "post", TransportConfig::default());

        let task = tokio::spawn(async move { api.get(Default::default(), RequestOptions::default()).await });

        let pending = expect_request(&mut receiver).await.expect("Expected a request");
        assert_eq!(pending.request.url, "/api/posts");
        pending.respond_ok(json!([]));

        assert_eq!(task.await.unwrap().unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_dropped_responder_reports_dropped() {
        let (transport, mut receiver) = create_mock_transport(4);
        let api = ApiClient::new(transport, "/api", "post", TransportConfig::default());

        let task = tokio::spawn(async move { api.get(Default::default(), RequestOptions::default()).await });
        drop(expect_request(&mut receiver).await);

        let err = task.await.unwrap().unwrap_err();
        assert_eq!(err, crate::error::ApiError::Transport(TransportError::Dropped));
    }

    #[tokio::test]
    #[should_panic(expected = "Not all expectations were met")]
    async fn test_verify_panics_on_leftovers() {
        let mock = MockTransport::new();
        mock.expect_get("/api/users").return_ok(json!([]));
        mock.verify();
    }
}
