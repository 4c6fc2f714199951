//! Script execution log tailing over server-sent events.
//!
//! A capture ends on the first of: an end-marker line, the size budget, the
//! time budget, or a user interrupt. Partial output is always returned.

use std::ops::ControlFlow;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{EventStream, Gateway, StreamEnd, routes};
use crate::error::{GimsError, Result};

pub const DEFAULT_END_MARKER: &str = "END SCRIPT";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_SIZE_KB: u64 = 100;
/// Delay before reopening a closed stream
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// `2026-01-11 04:23:33,350 [INFO] `
static LOG_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3} \[[^\]]+\] ")
        .expect("valid log prefix pattern")
});

/// Options for one `logs stream` capture
#[derive(Debug, Clone)]
pub struct StreamOptions {
    pub timeout: Duration,
    /// Historical lines to replay; 0 means only new lines
    pub tail: u32,
    pub end_markers: Vec<String>,
    pub filter: Option<String>,
    pub keep_timestamp: bool,
    pub max_size_kb: u64,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            tail: 0,
            end_markers: vec![DEFAULT_END_MARKER.to_string()],
            filter: None,
            keep_timestamp: false,
            max_size_kb: DEFAULT_MAX_SIZE_KB,
        }
    }
}

impl StreamOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tail(mut self, tail: u32) -> Self {
        self.tail = tail;
        self
    }

    /// Replace the end markers; an empty list keeps the default.
    pub fn with_end_markers(mut self, markers: Vec<String>) -> Self {
        if !markers.is_empty() {
            self.end_markers = markers;
        }
        self
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_keep_timestamp(mut self, keep: bool) -> Self {
        self.keep_timestamp = keep;
        self
    }

    pub fn with_max_size_kb(mut self, kb: u64) -> Self {
        self.max_size_kb = kb;
        self
    }
}

/// Line filter; an invalid regex degrades to a plain substring match.
#[derive(Debug, Clone)]
pub enum LineFilter {
    All,
    Pattern(Regex),
    Substring(String),
}

impl LineFilter {
    pub fn new(pattern: Option<&str>) -> Self {
        match pattern {
            None => Self::All,
            Some(p) => match Regex::new(p) {
                Ok(regex) => Self::Pattern(regex),
                Err(_) => Self::Substring(p.to_string()),
            },
        }
    }

    pub fn matches(&self, line: &str) -> bool {
        match self {
            Self::All => true,
            Self::Pattern(regex) => regex.is_match(line),
            Self::Substring(s) => line.contains(s.as_str()),
        }
    }
}

/// Drop the `timestamp [LEVEL] ` prefix of a log line, if present.
pub fn strip_log_prefix(line: &str) -> &str {
    match LOG_PREFIX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Append the `tail` query parameter to a stream URL.
pub fn with_tail_param(url: &str, tail: u32) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}tail={tail}")
}

/// Accumulates log lines from event payloads.
#[derive(Debug)]
pub struct LogCollector {
    end_markers: Vec<String>,
    filter: LineFilter,
    keep_timestamp: bool,
    max_bytes: u64,
    used_bytes: u64,
    lines: Vec<String>,
    end_marker_found: bool,
    size_limit_reached: bool,
}

impl LogCollector {
    pub fn new(options: &StreamOptions) -> Self {
        Self {
            end_markers: options.end_markers.clone(),
            filter: LineFilter::new(options.filter.as_deref()),
            keep_timestamp: options.keep_timestamp,
            max_bytes: options.max_size_kb * 1024,
            used_bytes: 0,
            lines: Vec::new(),
            end_marker_found: false,
            size_limit_reached: false,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    fn clean<'l>(&self, line: &'l str) -> &'l str {
        if self.keep_timestamp {
            line
        } else {
            strip_log_prefix(line)
        }
    }

    /// Keep `line` if it fits the size budget.
    fn try_keep(&mut self, line: &str) -> bool {
        let cost = line.len() as u64 + 1;
        if self.used_bytes + cost > self.max_bytes {
            return false;
        }
        self.used_bytes += cost;
        self.lines.push(line.to_string());
        true
    }

    /// Feed one SSE `data:` payload. `Break` means the capture is complete.
    pub fn push_payload(&mut self, data: &str) -> ControlFlow<()> {
        let content = payload_content(data);

        for line in content.lines() {
            if line.trim().is_empty() {
                continue;
            }

            // End markers are checked before filtering
            if self.end_markers.iter().any(|m| line.contains(m.as_str())) {
                self.end_marker_found = true;
                let cleaned = self.clean(line);
                if self.filter.matches(cleaned) {
                    self.try_keep(cleaned);
                }
                return ControlFlow::Break(());
            }

            let cleaned = self.clean(line);
            if !self.filter.matches(cleaned) {
                continue;
            }
            if !self.try_keep(cleaned) {
                self.size_limit_reached = true;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

/// The `content` of a JSON payload, or the raw payload text.
fn payload_content(data: &str) -> String {
    match serde_json::from_str::<Value>(data.trim()) {
        Ok(Value::Object(obj)) => match obj.get("content") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        },
        _ => data.strip_prefix(' ').unwrap_or(data).to_string(),
    }
}

/// Result of a capture
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCapture {
    pub lines: Vec<String>,
    pub warnings: Vec<String>,
    pub end_marker_found: bool,
    pub timeout_reached: bool,
    pub size_limit_reached: bool,
    pub interrupted: bool,
}

/// First log stream URL registered for a script.
pub fn resolve_log_url(gateway: &dyn Gateway, script_id: i64) -> Result<String> {
    let info = match gateway.get(&routes::script_log_url(script_id)) {
        Ok(info) => info,
        Err(e) if e.is_not_found() => {
            return Err(GimsError::NotFound(format!(
                "Script with ID {script_id} not found or has no log"
            )));
        }
        Err(e) => return Err(e),
    };

    info.get("url")
        .and_then(Value::as_array)
        .and_then(|urls| urls.first())
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| GimsError::NotFound(format!("Script {script_id} has no log available")))
}

/// Tail the execution log of a script until a stop condition is met.
pub fn stream_script_log<G>(client: &G, script_id: i64, options: &StreamOptions) -> Result<LogCapture>
where
    G: Gateway + EventStream,
{
    let url = with_tail_param(&resolve_log_url(client, script_id)?, options.tail);
    let mut collector = LogCollector::new(options);
    let mut capture = LogCapture::default();
    let mut connection_error: Option<String> = None;
    let started = Instant::now();

    loop {
        let elapsed = started.elapsed();
        if elapsed >= options.timeout {
            capture.timeout_reached = true;
            break;
        }
        let remaining = options.timeout - elapsed;

        let mut received = false;
        let outcome = client.stream_events(&url, remaining, &mut |data: &str| {
            received = true;
            collector.push_payload(data)
        });

        let retry_allowed = options.timeout.saturating_sub(started.elapsed()) > RETRY_DELAY;
        match outcome {
            Ok(StreamEnd::Stopped) => break,
            Ok(StreamEnd::Deadline) => {
                capture.timeout_reached = true;
                break;
            }
            Ok(StreamEnd::Interrupted) => {
                capture.interrupted = true;
                break;
            }
            Ok(StreamEnd::Closed) => {
                if received && !collector.lines().is_empty() {
                    break;
                }
                if !retry_allowed {
                    capture.timeout_reached = true;
                    break;
                }
                debug!(script_id, "Log stream closed, reconnecting");
            }
            Err(e) => {
                let reason = format!("SSE connection error: {}", e.message());
                if !retry_allowed {
                    connection_error = Some(reason);
                    break;
                }
                warn!(script_id, error = %e, "Log stream failed, reconnecting");
            }
        }

        if client.pause(RETRY_DELAY).is_break() {
            capture.interrupted = true;
            break;
        }
    }

    capture.end_marker_found = collector.end_marker_found;
    capture.size_limit_reached = collector.size_limit_reached;

    if capture.timeout_reached && !capture.end_marker_found {
        capture.warnings.push(format!(
            "WARNING: Timeout ({}s) reached without end marker",
            options.timeout.as_secs()
        ));
    }
    if capture.size_limit_reached {
        capture
            .warnings
            .push(format!("WARNING: Size limit ({}KB) reached", options.max_size_kb));
    }
    if let Some(reason) = connection_error {
        capture.warnings.push(format!("WARNING: {reason}"));
    }

    capture.lines = collector.lines;
    Ok(capture)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use serde_json::json;

    use super::*;
    use crate::api::ApiRequest;

    #[test]
    fn prefix_is_stripped_only_when_present() {
        assert_eq!(
            strip_log_prefix("2026-01-11 04:23:33,350 [INFO] Host is up"),
            "Host is up"
        );
        assert_eq!(strip_log_prefix("plain line"), "plain line");
    }

    #[test]
    fn invalid_regex_falls_back_to_substring() {
        let filter = LineFilter::new(Some("[ERROR"));
        assert!(matches!(filter, LineFilter::Substring(_)));
        assert!(filter.matches("x [ERROR y"));
        assert!(!filter.matches("ERROR"));
    }

    #[test]
    fn tail_param_respects_existing_query() {
        assert_eq!(with_tail_param("/logviewer/stream/a/", 0), "/logviewer/stream/a/?tail=0");
        assert_eq!(with_tail_param("/s/?x=1", 10), "/s/?x=1&tail=10");
    }

    #[test]
    fn end_marker_line_is_kept_and_stops() {
        let mut collector = LogCollector::new(&StreamOptions::default());
        let payload = json!({
            "content": "2026-01-11 04:23:33,350 [INFO] start\n\n2026-01-11 04:23:34,000 [INFO] END SCRIPT\nafter"
        })
        .to_string();
        assert!(collector.push_payload(&payload).is_break());
        assert_eq!(collector.lines(), ["start", "END SCRIPT"]);
        assert!(collector.end_marker_found);
    }

    #[test]
    fn size_budget_counts_line_plus_newline() {
        let options = StreamOptions::default().with_max_size_kb(1);
        let mut collector = LogCollector::new(&options);
        let line = "x".repeat(511);
        let payload = json!({ "content": format!("{line}\n{line}\n{line}") }).to_string();
        assert!(collector.push_payload(&payload).is_break());
        assert_eq!(collector.lines().len(), 2);
        assert!(collector.size_limit_reached);
    }

    #[test]
    fn non_json_payload_is_raw_text() {
        let mut collector = LogCollector::new(&StreamOptions::default());
        assert!(collector.push_payload(" hello").is_continue());
        assert_eq!(collector.lines(), ["hello"]);
    }

    /// Gateway + event stream replaying canned connections.
    struct ScriptedLog {
        log_info: Value,
        connections: RefCell<VecDeque<Vec<&'static str>>>,
        opened: RefCell<Vec<String>>,
    }

    impl Gateway for ScriptedLog {
        fn request(&self, _request: ApiRequest) -> Result<Option<Value>> {
            Ok(Some(self.log_info.clone()))
        }

        fn system_url(&self) -> &str {
            "https://gims.test"
        }
    }

    impl EventStream for ScriptedLog {
        fn stream_events(
            &self,
            url: &str,
            _budget: Duration,
            sink: &mut dyn FnMut(&str) -> ControlFlow<()>,
        ) -> Result<StreamEnd> {
            self.opened.borrow_mut().push(url.to_string());
            let Some(events) = self.connections.borrow_mut().pop_front() else {
                return Ok(StreamEnd::Deadline);
            };
            for event in events {
                if sink(event).is_break() {
                    return Ok(StreamEnd::Stopped);
                }
            }
            Ok(StreamEnd::Closed)
        }

        fn pause(&self, _delay: Duration) -> ControlFlow<()> {
            ControlFlow::Continue(())
        }
    }

    #[test]
    fn reconnects_until_lines_arrive() {
        let log = ScriptedLog {
            log_info: json!({"url": ["/logviewer/stream/job_7/"]}),
            connections: RefCell::new(VecDeque::from(vec![
                vec![],
                vec![r#"{"content": "line one\nline two"}"#],
            ])),
            opened: RefCell::new(Vec::new()),
        };

        let capture = stream_script_log(&log, 7, &StreamOptions::default()).unwrap();
        assert_eq!(capture.lines, ["line one", "line two"]);
        assert!(!capture.end_marker_found);
        assert!(capture.warnings.is_empty());
        assert_eq!(
            *log.opened.borrow(),
            vec!["/logviewer/stream/job_7/?tail=0", "/logviewer/stream/job_7/?tail=0"]
        );
    }

    #[test]
    fn deadline_without_marker_warns() {
        let log = ScriptedLog {
            log_info: json!({"url": ["/s/"]}),
            connections: RefCell::new(VecDeque::new()),
            opened: RefCell::new(Vec::new()),
        };
        let options = StreamOptions::default().with_timeout(Duration::from_secs(5));
        let capture = stream_script_log(&log, 1, &options).unwrap();
        assert!(capture.timeout_reached);
        assert_eq!(
            capture.warnings,
            ["WARNING: Timeout (5s) reached without end marker"]
        );
    }

    #[test]
    fn missing_log_url_is_not_found() {
        let log = ScriptedLog {
            log_info: json!({"url": []}),
            connections: RefCell::new(VecDeque::new()),
            opened: RefCell::new(Vec::new()),
        };
        let err = stream_script_log(&log, 3, &StreamOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Script 3 has no log available");
    }
}
