//! Blocking HTTP gateway on top of `reqwest`.
//!
//! The gateway owns a current-thread tokio runtime and drives every call to
//! completion before returning, so callers stay synchronous.

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::{Value, json};
use tokio::runtime::Runtime;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::response::{MAX_ERROR_BODY_CHARS, interpret_response};
use super::{ApiRequest, EventStream, Gateway, HttpMethod, StreamEnd};
use crate::config::GimsConfig;
use crate::error::{GimsError, Result};

/// Idle read slice while waiting for the next event chunk
const READ_SLICE: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

struct Tokens {
    access: String,
    refresh: String,
}

struct RawResponse {
    status: u16,
    content_type: Option<String>,
    body: String,
}

pub struct HttpGateway {
    config: GimsConfig,
    runtime: Runtime,
    client: reqwest::Client,
    /// No total timeout; event streams are bounded by their own budget.
    stream_client: reqwest::Client,
    tokens: RefCell<Tokens>,
}

impl HttpGateway {
    pub fn new(config: GimsConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| GimsError::Transport(format!("Failed to start async runtime: {e}")))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("gims/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(transport)?;

        let stream_client = reqwest::Client::builder()
            .user_agent(concat!("gims/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(transport)?;

        let tokens = RefCell::new(Tokens {
            access: config.access_token.clone(),
            refresh: config.refresh_token.clone(),
        });

        Ok(Self {
            config,
            runtime,
            client,
            stream_client,
            tokens,
        })
    }

    /// Build from the config file and `GIMS_*` environment.
    pub fn from_env() -> Result<Self> {
        Self::new(GimsConfig::load()?)
    }

    pub fn config(&self) -> &GimsConfig {
        &self.config
    }

    fn access_token(&self) -> String {
        self.tokens.borrow().access.clone()
    }

    async fn send(&self, request: &ApiRequest, token: &str) -> Result<RawResponse> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let url = format!("{}{}", self.config.api_base_url(), request.path);

        let mut builder = self
            .client
            .request(method, &url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.map_err(transport)?;

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }

    /// Exchange the refresh token for a new access token.
    async fn refresh_tokens(&self) -> Result<()> {
        let refresh = self.tokens.borrow().refresh.clone();
        let response = self
            .client
            .post(self.config.token_refresh_url())
            .json(&json!({ "refresh": refresh }))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport)?;

        if status == 401 {
            return Err(GimsError::api(
                401,
                "Authentication failed",
                "Refresh token is invalid. Get new tokens from GIMS.",
            ));
        }
        if status != 200 {
            let head: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(GimsError::api(status, "Token refresh failed", head));
        }

        let data: Value = serde_json::from_str(&body).map_err(|e| GimsError::Protocol {
            status,
            detail: format!("Malformed token refresh response: {e}"),
        })?;
        let access = data
            .get("access")
            .and_then(Value::as_str)
            .ok_or_else(|| GimsError::Protocol {
                status,
                detail: "Token refresh response has no access token".to_string(),
            })?;

        let mut tokens = self.tokens.borrow_mut();
        tokens.access = access.to_string();
        if let Some(rotated) = data.get("refresh").and_then(Value::as_str) {
            tokens.refresh = rotated.to_string();
        }
        debug!("Access token refreshed");
        Ok(())
    }

    /// Absolute URL for an event stream; relative paths hang off the system URL.
    fn stream_url(&self, url: &str) -> Result<String> {
        if url.starts_with('/') {
            return Ok(format!("{}{}", self.config.url, url));
        }
        if url::Url::parse(url).is_ok() {
            return Ok(url.to_string());
        }
        let base = url::Url::parse(&format!("{}/", self.config.url))
            .map_err(|e| GimsError::Config(e.to_string()))?;
        base.join(url)
            .map(String::from)
            .map_err(|e| GimsError::InvalidInput(format!("Invalid stream URL '{url}': {e}")))
    }

    async fn pump_events(
        &self,
        url: &str,
        budget: Duration,
        sink: &mut dyn FnMut(&str) -> ControlFlow<()>,
    ) -> Result<StreamEnd> {
        let deadline = Instant::now() + budget;
        let mut refreshed = false;

        loop {
            let token = self.access_token();
            let connect = self
                .stream_client
                .get(url)
                .bearer_auth(&token)
                .header(ACCEPT, "text/event-stream")
                .send();

            let response = match tokio::time::timeout_at(deadline, connect).await {
                Err(_) => return Ok(StreamEnd::Deadline),
                Ok(result) => result.map_err(sse_error)?,
            };

            let status = response.status().as_u16();
            if status == 401 && !refreshed {
                warn!("Log stream rejected the access token, refreshing");
                self.refresh_tokens().await?;
                refreshed = true;
                continue;
            }
            if status != 200 {
                return Err(GimsError::api(
                    status,
                    "Failed to connect to log stream",
                    format!("HTTP {status}"),
                ));
            }

            return read_event_lines(response, deadline, sink).await;
        }
    }
}

async fn read_event_lines(
    mut response: reqwest::Response,
    deadline: Instant,
    sink: &mut dyn FnMut(&str) -> ControlFlow<()>,
) -> Result<StreamEnd> {
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let now = Instant::now();
        if now >= deadline {
            return Ok(StreamEnd::Deadline);
        }
        let slice_end = (now + READ_SLICE).min(deadline);

        let chunk = match tokio::time::timeout_at(slice_end, response.chunk()).await {
            Err(_) => continue,
            Ok(Ok(Some(chunk))) => chunk,
            Ok(Ok(None)) => {
                if !pending.is_empty() && feed_line(&pending, sink).is_break() {
                    return Ok(StreamEnd::Stopped);
                }
                return Ok(StreamEnd::Closed);
            }
            Ok(Err(e)) => return Err(sse_error(e)),
        };

        pending.extend_from_slice(&chunk);
        while let Some(pos) = pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = pending.drain(..=pos).collect();
            if feed_line(&line, sink).is_break() {
                return Ok(StreamEnd::Stopped);
            }
        }
    }
}

/// Hand the payload of a `data:` line to the sink; other lines are framing.
fn feed_line(raw: &[u8], sink: &mut dyn FnMut(&str) -> ControlFlow<()>) -> ControlFlow<()> {
    let line = String::from_utf8_lossy(raw);
    let line = line.trim_end_matches(['\r', '\n']);
    match line.strip_prefix("data:") {
        Some(data) => sink(data),
        None => ControlFlow::Continue(()),
    }
}

fn transport(e: reqwest::Error) -> GimsError {
    GimsError::Transport(e.to_string())
}

fn sse_error(e: reqwest::Error) -> GimsError {
    GimsError::Api {
        status: 0,
        message: "SSE connection error".to_string(),
        detail: Some(e.to_string()),
    }
}

impl Gateway for HttpGateway {
    fn request(&self, request: ApiRequest) -> Result<Option<Value>> {
        debug!(method = request.method.as_str(), path = %request.path, "GIMS request");

        self.runtime.block_on(async {
            let mut raw = self.send(&request, &self.access_token()).await?;
            if raw.status == 401 {
                warn!("Access token rejected, refreshing");
                self.refresh_tokens().await?;
                raw = self.send(&request, &self.access_token()).await?;
            }
            debug!(status = raw.status, path = %request.path, "GIMS response");
            interpret_response(raw.status, raw.content_type.as_deref(), &raw.body)
        })
    }

    fn system_url(&self) -> &str {
        &self.config.url
    }
}

impl EventStream for HttpGateway {
    fn stream_events(
        &self,
        url: &str,
        budget: Duration,
        sink: &mut dyn FnMut(&str) -> ControlFlow<()>,
    ) -> Result<StreamEnd> {
        let url = self.stream_url(url)?;
        debug!(url = %url, budget_secs = budget.as_secs(), "Opening log stream");

        self.runtime.block_on(async {
            tokio::select! {
                end = self.pump_events(&url, budget, sink) => end,
                _ = tokio::signal::ctrl_c() => Ok(StreamEnd::Interrupted),
            }
        })
    }

    fn pause(&self, delay: Duration) -> ControlFlow<()> {
        self.runtime.block_on(async {
            tokio::select! {
                _ = tokio::time::sleep(delay) => ControlFlow::Continue(()),
                _ = tokio::signal::ctrl_c() => ControlFlow::Break(()),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> HttpGateway {
        HttpGateway::new(GimsConfig {
            url: "https://gims.example.org".into(),
            access_token: "a".into(),
            refresh_token: "r".into(),
            verify_ssl: true,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn relative_stream_urls_hang_off_system_url() {
        let gw = gateway();
        assert_eq!(
            gw.stream_url("/logs/stream/42").unwrap(),
            "https://gims.example.org/logs/stream/42"
        );
        assert_eq!(
            gw.stream_url("https://logs.example.org/s/1").unwrap(),
            "https://logs.example.org/s/1"
        );
        assert_eq!(
            gw.stream_url("logs/stream/7").unwrap(),
            "https://gims.example.org/logs/stream/7"
        );
    }

    #[test]
    fn only_data_lines_reach_the_sink() {
        let mut seen = Vec::new();
        let mut sink = |data: &str| {
            seen.push(data.to_string());
            ControlFlow::Continue(())
        };
        let _ = feed_line(b"event: log\n", &mut sink);
        let _ = feed_line(b"data: {\"content\":\"x\"}\r\n", &mut sink);
        let _ = feed_line(b": keepalive\n", &mut sink);
        assert_eq!(seen, vec![" {\"content\":\"x\"}".to_string()]);
    }
}
