use super::inflect::pluralize;
use super::query;
use super::transport::{HttpMethod, HttpRequest, RequestOptions, Transport, TransportConfig};
use crate::error::ApiError;
use crate::Record;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// CRUD client for one REST resource.
///
/// | call     | request                                    |
/// |----------|--------------------------------------------|
/// | `get`    | `GET {endpoint}[/{id}]?{params}`           |
/// | `post`   | `POST {endpoint}` with the record as body  |
/// | `put`    | `PUT {endpoint}/{id}` with the record body |
/// | `delete` | `DELETE {endpoint}/{id}`                   |
///
/// The `id` key is always taken out of the record and moved into the path.
/// Cloning is cheap; the transport is shared.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
    config: TransportConfig,
}

impl ApiClient {
    /// Binds a client to `{base_path}/{pluralized model_name}`.
    pub fn new(transport: Arc<dyn Transport>, base_path: &str, model_name: &str, config: TransportConfig) -> Self {
        let endpoint = format!("{}/{}", base_path.trim_end_matches('/'), pluralize(model_name));
        Self {
            transport,
            endpoint,
            config,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    pub async fn get(&self, params: Record, options: RequestOptions) -> Result<Value, ApiError> {
        self.request(HttpMethod::Get, params, options).await
    }

    pub async fn post(&self, record: Record, options: RequestOptions) -> Result<Value, ApiError> {
        self.request(HttpMethod::Post, record, options).await
    }

    pub async fn put(&self, record: Record, options: RequestOptions) -> Result<Value, ApiError> {
        self.request(HttpMethod::Put, record, options).await
    }

    pub async fn delete(&self, record: Record, options: RequestOptions) -> Result<Value, ApiError> {
        self.request(HttpMethod::Delete, record, options).await
    }

    /// Built-in headers, then configured defaults, then per-call headers.
    pub fn headers(&self, options: &RequestOptions) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::from([
            ("csrf-token".to_string(), self.config.csrf_token.clone()),
            ("Accept".to_string(), "application/json".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ]);
        headers.extend(self.config.default_headers.clone());
        headers.extend(options.headers.clone());
        headers
    }

    #[instrument(skip(self, data, options), fields(endpoint = %self.endpoint))]
    async fn request(&self, method: HttpMethod, mut data: Record, options: RequestOptions) -> Result<Value, ApiError> {
        let mut url = self.endpoint.clone();
        match data.remove("id").as_ref().and_then(id_segment) {
            Some(id) => url = format!("{url}/{id}"),
            None if matches!(method, HttpMethod::Put | HttpMethod::Delete) => {
                return Err(ApiError::MissingId(method.as_str()));
            }
            None => {}
        }

        let body = match method {
            HttpMethod::Get => {
                if !data.is_empty() {
                    url = format!("{url}?{}", query::encode(&data));
                }
                None
            }
            HttpMethod::Delete => None,
            HttpMethod::Post | HttpMethod::Put => Some(Value::Object(data)),
        };

        let request = HttpRequest {
            method,
            url,
            headers: self.headers(&options),
            credentials: options.credentials.unwrap_or(self.config.credentials),
            body,
        };
        debug!(%method, url = %request.url, "Sending request");

        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response.body)
        } else {
            warn!(%method, status = response.status, "Request rejected");
            Err(ApiError::Status {
                status: response.status,
                body: response.body,
            })
        }
    }
}

/// Path segment for an id value; `None` for null, empty or structured ids.
fn id_segment(id: &Value) -> Option<String> {
    match id {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(query::encode_component(s)),
        _ => None,
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoint", &self.endpoint)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::Credentials;
    use crate::error::TransportError;
    use crate::mock::MockTransport;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn client(mock: &Arc<MockTransport>) -> ApiClient {
        ApiClient::new(mock.clone(), "/api/", "user", TransportConfig::default().with_csrf_token("t0k3n"))
    }

    #[tokio::test]
    async fn test_get_builds_urls() {
        let mock = Arc::new(MockTransport::new());
        mock.expect_get("/api/users?name=Avo%20Cado").return_ok(json!([]));
        mock.expect_get("/api/users/3?expand=posts").return_ok(json!({ "id": 3 }));

        let api = client(&mock);
        assert_eq!(api.endpoint(), "/api/users");
        api.get(record(json!({ "name": "Avo Cado" })), RequestOptions::default())
            .await
            .unwrap();
        let one = api
            .get(record(json!({ "id": 3, "expand": "posts" })), RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(one, json!({ "id": 3 }));
        mock.verify();
    }

    #[tokio::test]
    async fn test_write_requests_move_id_into_path() {
        let mock = Arc::new(MockTransport::new());
        mock.expect_post("/api/users").return_ok(json!({ "id": 1 }));
        mock.expect_put("/api/users/1").return_ok(json!({ "id": 1 }));
        mock.expect_delete("/api/users/1").return_ok(Value::Null);

        let api = client(&mock);
        let body = record(json!({ "id": 9, "name": "Avo" }));
        api.post(body, RequestOptions::default()).await.unwrap();
        api.put(record(json!({ "id": 1, "name": "Avo" })), RequestOptions::default())
            .await
            .unwrap();
        api.delete(record(json!({ "id": 1 })), RequestOptions::default())
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].body, Some(json!({ "name": "Avo" })));
        assert_eq!(requests[1].body, Some(json!({ "name": "Avo" })));
        assert_eq!(requests[2].body, None);
        mock.verify();
    }

    #[tokio::test]
    async fn test_put_without_id_is_rejected_locally() {
        let mock = Arc::new(MockTransport::new());
        let err = client(&mock)
            .put(record(json!({ "name": "Avo" })), RequestOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::MissingId("PUT"));
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_headers_and_credentials_merge() {
        let mock = Arc::new(MockTransport::new());
        mock.expect_get("/api/users").return_ok(json!([]));

        let config = TransportConfig::default()
            .with_csrf_token("t0k3n")
            .with_header("X-App", "remodel")
            .with_header("Accept", "text/plain");
        let api = ApiClient::new(mock.clone(), "/api", "user", config);
        let options = RequestOptions::default()
            .header("Accept", "application/vnd.api+json")
            .credentials(Credentials::Include);
        api.get(Record::new(), options).await.unwrap();

        let request = &mock.requests()[0];
        assert_eq!(request.headers["csrf-token"], "t0k3n");
        assert_eq!(request.headers["X-App"], "remodel");
        assert_eq!(request.headers["Accept"], "application/vnd.api+json");
        assert_eq!(request.headers["Content-Type"], "application/json");
        assert_eq!(request.credentials, Credentials::Include);
    }

    #[tokio::test]
    async fn test_non_success_status_and_transport_errors() {
        let mock = Arc::new(MockTransport::new());
        mock.expect_get("/api/users/1").return_status(404, json!({ "error": "Not Found" }));
        mock.expect_get("/api/users/2").return_err(TransportError::Failed("offline".into()));

        let api = client(&mock);
        let err = api.get(record(json!({ "id": 1 })), RequestOptions::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 404, .. }));

        let err = api.get(record(json!({ "id": "2" })), RequestOptions::default()).await.unwrap_err();
        assert_eq!(err, ApiError::Transport(TransportError::Failed("offline".into())));
    }
}
