//! Mapping of raw HTTP responses to API results.
//!
//! Kept free of any transport so the mapping can be tested without a server.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{GimsError, Result};

/// Maximum length of a plain-text error body kept in error details
pub const MAX_ERROR_BODY_CHARS: usize = 500;

static HTML_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("valid title pattern"));

/// Interpret a response already received from the server.
///
/// `401` is reported as-is here; token refresh happens one level up.
pub fn interpret_response(
    status: u16,
    content_type: Option<&str>,
    body: &str,
) -> Result<Option<Value>> {
    match status {
        401 => return Err(GimsError::api(401, "Authentication failed", "Token expired")),
        403 => {
            return Err(GimsError::api(
                403,
                "Permission denied",
                "Insufficient permissions",
            ));
        }
        404 => return Err(GimsError::api(404, "Not found", "Resource not found")),
        s if s >= 400 => {
            let detail = match serde_json::from_str::<Value>(body) {
                Ok(data) => json_error_detail(&data),
                Err(_) => sanitize_error_body(content_type, body),
            };
            return Err(GimsError::api(status, "API error", detail));
        }
        204 => return Ok(None),
        _ => {}
    }

    let content_type = content_type.unwrap_or("");
    if !content_type.contains("application/json") {
        return Err(GimsError::Protocol {
            status,
            detail: format!("Expected JSON, got '{content_type}'"),
        });
    }

    serde_json::from_str(body)
        .map(Some)
        .map_err(|e| GimsError::Protocol {
            status,
            detail: format!("Malformed JSON body: {e}"),
        })
}

/// `detail` field of a JSON error body, or the whole body rendered.
fn json_error_detail(data: &Value) -> String {
    match data.get("detail") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => data.to_string(),
    }
}

/// Reduce a non-JSON error body to something printable.
pub fn sanitize_error_body(content_type: Option<&str>, body: &str) -> String {
    let trimmed = body.trim_start();
    let is_html = content_type.is_some_and(|ct| ct.contains("text/html"))
        || trimmed.starts_with("<!DOCTYPE")
        || trimmed.starts_with("<html");

    if is_html {
        return match HTML_TITLE.captures(body) {
            Some(caps) => format!("Server returned HTML error: {}", caps[1].trim()),
            None => "Server returned HTML error page".to_string(),
        };
    }

    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        let head: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        return format!("{head}... (truncated)");
    }

    body.to_string()
}
