//! Rendering of results and failures.
//!
//! Results always go to stdout as pretty JSON (or raw code); diagnostics go
//! to stderr so stdout stays machine-parseable.

use std::process::ExitCode;

use anyhow::Result;
use serde::Serialize;
use serde_json::{Value, json};

use gims_core::GimsError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INTERRUPTED: u8 = 130;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `Error: <message>` plus a `Detail:` line when the error carries one.
pub fn print_error(err: &anyhow::Error) {
    match err.downcast_ref::<GimsError>() {
        Some(gims) => match gims.detail() {
            Some(detail) => eprintln!("Error: {}\nDetail: {detail}", gims.message()),
            None => eprintln!("Error: {}", gims.message()),
        },
        None => eprintln!("Error: {err:#}"),
    }
}

/// `{"status": "error", "message", "detail"}` for any failure.
pub fn error_envelope(err: &anyhow::Error) -> Value {
    match err.downcast_ref::<GimsError>() {
        Some(gims) => gims.envelope(),
        None => json!({
            "status": "error",
            "message": format!("{err:#}"),
            "detail": Value::Null,
        }),
    }
}

pub fn failure() -> ExitCode {
    ExitCode::from(EXIT_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_unwraps_core_errors() {
        let err = anyhow::Error::new(GimsError::Config("GIMS_URL not set".into()));
        let envelope = error_envelope(&err);
        assert_eq!(envelope["message"], "Configuration error");
        assert_eq!(envelope["detail"], "GIMS_URL not set");
    }

    #[test]
    fn envelope_for_foreign_errors_has_no_detail() {
        let err = anyhow::anyhow!("boom");
        let envelope = error_envelope(&err);
        assert_eq!(envelope["status"], "error");
        assert_eq!(envelope["message"], "boom");
        assert!(envelope["detail"].is_null());
    }
}
