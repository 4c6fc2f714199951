//! Remote API gateway.
//!
//! Everything above this module talks to GIMS through the [`Gateway`] trait
//! (request/response) and [`EventStream`] (server-sent events). The only
//! production implementation is [`HttpGateway`]; tests substitute fakes.

pub mod http;
pub mod response;
pub mod routes;

use std::ops::ControlFlow;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{GimsError, Result};

pub use http::HttpGateway;

/// HTTP verbs used by the automation API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the verb changes server state
    pub fn is_mutating(self) -> bool {
        !matches!(self, Self::Get)
    }
}

/// A single call against the automation API, relative to its base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Post, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(HttpMethod::Patch, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Authenticated request/response transport.
pub trait Gateway {
    /// Perform one request. `Ok(None)` means the server answered 204.
    fn request(&self, request: ApiRequest) -> Result<Option<Value>>;

    /// Source system URL recorded in local projections (`exported_from`).
    fn system_url(&self) -> &str;

    fn get(&self, path: &str) -> Result<Value> {
        Ok(self.request(ApiRequest::get(path))?.unwrap_or(Value::Null))
    }

    fn get_query(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let mut request = ApiRequest::get(path);
        for (key, value) in query {
            request = request.with_query(*key, value);
        }
        Ok(self.request(request)?.unwrap_or(Value::Null))
    }

    fn post(&self, path: &str, body: Value) -> Result<Value> {
        Ok(self
            .request(ApiRequest::post(path, body))?
            .unwrap_or(Value::Null))
    }

    fn patch(&self, path: &str, body: Value) -> Result<Value> {
        Ok(self
            .request(ApiRequest::patch(path, body))?
            .unwrap_or(Value::Null))
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.request(ApiRequest::delete(path)).map(|_| ())
    }
}

/// How an event stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The server closed the connection
    Closed,
    /// The sink asked to stop
    Stopped,
    /// The time budget ran out
    Deadline,
    /// The user interrupted the process
    Interrupted,
}

/// Server-sent-event consumer. Each `data:` payload is handed to `sink`.
pub trait EventStream {
    fn stream_events(
        &self,
        url: &str,
        budget: Duration,
        sink: &mut dyn FnMut(&str) -> ControlFlow<()>,
    ) -> Result<StreamEnd>;

    /// Wait between reconnect attempts. `Break` means the user interrupted.
    fn pause(&self, delay: Duration) -> ControlFlow<()> {
        std::thread::sleep(delay);
        ControlFlow::Continue(())
    }
}

/// Decode a JSON value into a typed record, reporting shape mismatches as
/// protocol errors.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| GimsError::Protocol {
        status: 200,
        detail: format!("Unexpected response shape: {e}"),
    })
}

/// Decode a JSON array response; `null` decodes as an empty list.
pub fn decode_list<T: DeserializeOwned>(value: Value) -> Result<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        other => decode(other),
    }
}
