//! # In-Memory REST Backend
//!
//! [`InMemoryBackend`] implements [`Transport`] as a tiny REST server so a
//! store can be exercised end to end without a network:
//!
//! ```text
//! GET    {base}/{resource}         list, query params filter by equality
//! GET    {base}/{resource}/{id}    one record, 404 when missing
//! POST   {base}/{resource}         assigns the next id and timestamps
//! PUT    {base}/{resource}/{id}    merges the body, bumps updated_at
//! DELETE {base}/{resource}/{id}    null body, 404 when missing
//! ```

use super::query;
use super::transport::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::error::TransportError;
use crate::Record;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct BackendState {
    resources: HashMap<String, BTreeMap<i64, Record>>,
    failures: VecDeque<u16>,
    requests: Vec<HttpRequest>,
}

impl BackendState {
    fn table(&mut self, resource: &str) -> &mut BTreeMap<i64, Record> {
        self.resources.entry(resource.to_string()).or_default()
    }

    fn next_id(&mut self, resource: &str) -> i64 {
        self.table(resource).keys().next_back().map_or(1, |max| max + 1)
    }
}

#[derive(Debug)]
pub struct InMemoryBackend {
    base_path: String,
    state: Mutex<BackendState>,
}

impl InMemoryBackend {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into().trim_end_matches('/').to_string(),
            state: Mutex::new(BackendState::default()),
        }
    }

    /// Adds fixture records under `resource` (the plural path segment).
    /// Records without a numeric `id` get the next free one.
    pub fn seed(self, resource: &str, records: impl IntoIterator<Item = Value>) -> Self {
        {
            let mut state = self.lock();
            for record in records {
                let Value::Object(mut record) = record else {
                    continue;
                };
                let id = match record.get("id").and_then(Value::as_i64) {
                    Some(id) => id,
                    None => state.next_id(resource),
                };
                record.insert("id".to_string(), json!(id));
                state.table(resource).insert(id, record);
            }
        }
        self
    }

    /// Current records of `resource`, ordered by id.
    pub fn records(&self, resource: &str) -> Vec<Record> {
        self.lock()
            .resources
            .get(resource)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Answers the next request with `status` instead of serving it.
    pub fn fail_next(&self, status: u16) {
        self.lock().failures.push_back(status);
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn handle(&self, request: HttpRequest) -> HttpResponse {
        let mut state = self.lock();
        state.requests.push(request.clone());

        if let Some(status) = state.failures.pop_front() {
            return error(status, "Injected failure");
        }

        let path = request.path().to_string();
        let Some(route) = path.strip_prefix(&self.base_path) else {
            return error(404, "Not Found");
        };
        let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
        let (resource, id) = match segments.as_slice() {
            [resource] => (*resource, None),
            [resource, id] => match id.parse::<i64>() {
                Ok(id) => (*resource, Some(id)),
                Err(_) => return error(404, "Not Found"),
            },
            _ => return error(404, "Not Found"),
        };

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let response = match (request.method, id) {
            (HttpMethod::Get, None) => {
                let filters = request.query().map(query::decode).unwrap_or_default();
                let matches: Vec<Value> = state
                    .table(resource)
                    .values()
                    .filter(|record| {
                        filters.iter().all(|(key, wanted)| {
                            record.get(key).map(query::param_string).as_deref() == wanted.as_str()
                        })
                    })
                    .cloned()
                    .map(Value::Object)
                    .collect();
                HttpResponse::ok(Value::Array(matches))
            }
            (HttpMethod::Get, Some(id)) => match state.table(resource).get(&id) {
                Some(record) => HttpResponse::ok(Value::Object(record.clone())),
                None => error(404, "Not Found"),
            },
            (HttpMethod::Post, None) => {
                let Some(Value::Object(mut record)) = request.body else {
                    return error(400, "Expected a JSON object");
                };
                let id = state.next_id(resource);
                record.insert("id".to_string(), json!(id));
                record.insert("created_at".to_string(), json!(now));
                record.insert("updated_at".to_string(), json!(now));
                state.table(resource).insert(id, record.clone());
                HttpResponse::with_status(201, Value::Object(record))
            }
            (HttpMethod::Put, Some(id)) => {
                let Some(Value::Object(changes)) = request.body else {
                    return error(400, "Expected a JSON object");
                };
                match state.table(resource).get_mut(&id) {
                    Some(record) => {
                        for (key, value) in changes {
                            if key != "id" {
                                record.insert(key, value);
                            }
                        }
                        record.insert("updated_at".to_string(), json!(now));
                        HttpResponse::ok(Value::Object(record.clone()))
                    }
                    None => error(404, "Not Found"),
                }
            }
            (HttpMethod::Delete, Some(id)) => match state.table(resource).remove(&id) {
                Some(_) => HttpResponse::ok(Value::Null),
                None => error(404, "Not Found"),
            },
            _ => error(405, "Method Not Allowed"),
        };

        debug!(method = %request.method, url = %request.url, status = response.status, "Served");
        response
    }
}

fn error(status: u16, message: &str) -> HttpResponse {
    HttpResponse::with_status(status, json!({ "error": message }))
}

#[async_trait]
impl Transport for InMemoryBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        Ok(self.handle(request))
    }
}
