//! In-memory gateway used by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;

use serde_json::{Value, json};

use gims_core::api::{ApiRequest, Gateway, HttpMethod};
use gims_core::error::{GimsError, Result};

pub const SYSTEM_URL: &str = "https://gims.test";

/// Canned GET responses keyed by path (optionally with a query string),
/// echoing writes and recording every call.
pub struct FakeGateway {
    responses: RefCell<HashMap<String, Value>>,
    failures: RefCell<HashMap<(HttpMethod, String), GimsError>>,
    calls: RefCell<Vec<ApiRequest>>,
    next_id: Cell<i64>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            responses: RefCell::new(HashMap::new()),
            failures: RefCell::new(HashMap::new()),
            calls: RefCell::new(Vec::new()),
            next_id: Cell::new(1000),
        }
    }

    /// Register a GET response. `key` is a path such as `/scripts/script/42/`
    /// or a path with one query pair, `/datasource_types/method_params/?method_id=5`.
    pub fn on_get(&self, key: &str, value: Value) -> &Self {
        self.responses.borrow_mut().insert(key.to_string(), value);
        self
    }

    /// Make one method/path fail with `error`.
    pub fn fail(&self, method: HttpMethod, path: &str, error: GimsError) -> &Self {
        self.failures
            .borrow_mut()
            .insert((method, path.to_string()), error);
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.borrow().clone()
    }

    pub fn mutating_calls(&self) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter(|c| c.method.is_mutating())
            .collect()
    }

    pub fn calls_to(&self, method: HttpMethod, path: &str) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    fn lookup(&self, request: &ApiRequest) -> Option<Value> {
        let responses = self.responses.borrow();
        for (key, value) in &request.query {
            let with_query = format!("{}?{key}={value}", request.path);
            if let Some(found) = responses.get(&with_query) {
                return Some(found.clone());
            }
        }
        responses.get(&request.path).cloned()
    }

    fn take_failure(&self, request: &ApiRequest) -> Option<GimsError> {
        self.failures
            .borrow_mut()
            .remove(&(request.method, request.path.clone()))
    }
}

impl Gateway for FakeGateway {
    fn request(&self, request: ApiRequest) -> Result<Option<Value>> {
        self.calls.borrow_mut().push(request.clone());
        if let Some(error) = self.take_failure(&request) {
            return Err(error);
        }

        match request.method {
            HttpMethod::Get => self
                .lookup(&request)
                .map(Some)
                .ok_or_else(|| GimsError::api(404, "Not found", "Resource not found")),
            HttpMethod::Post => {
                let id = self.next_id.get();
                self.next_id.set(id + 1);
                let mut body = request.body.unwrap_or_else(|| json!({}));
                if let Some(obj) = body.as_object_mut() {
                    obj.insert("id".into(), json!(id));
                    obj.insert("updated_at".into(), json!("2025-07-01T00:00:00Z"));
                }
                Ok(Some(body))
            }
            HttpMethod::Patch => Ok(Some(request.body.unwrap_or(Value::Null))),
            HttpMethod::Delete => Ok(None),
        }
    }

    fn system_url(&self) -> &str {
        SYSTEM_URL
    }
}

pub fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, content).expect("write file");
}

pub fn read_file(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read file")
}

/// Script projection with the given meta and code.
pub fn script_dir(dir: &Path, meta: &str, code: &str) {
    write_file(&dir.join("meta.yaml"), meta);
    write_file(&dir.join("code.py"), code);
}
