//! Interpretation of the `status` object every response body carries.
//!
//! This is the single place where success is decided. The facade never calls
//! it on its own: a caller that skips it will treat failed calls as
//! successful.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Normalized result descriptor: `{code, error, help}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: u16,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Self {
            code: 200,
            error: None,
            help: None,
        }
    }

    pub fn failure(code: u16, error: &str, help: &str) -> Self {
        Self {
            code,
            error: Some(error.to_string()),
            help: Some(help.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 200
    }

    /// `Ok(())` for 200, otherwise `ApiError::Status` carrying error and help.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_ok() {
            return Ok(());
        }
        Err(ApiError::Status {
            code: self.code,
            error: self.error,
            help: self.help,
        })
    }

    /// Append the diagnostics of a failed status to `message`; a 200 leaves
    /// it untouched.
    pub(crate) fn annotate(&self, message: String) -> String {
        if self.is_ok() {
            return message;
        }
        format!(
            "{message} (service returned {}: {}; help: {})",
            self.code,
            self.error.as_deref().unwrap_or("no error message"),
            self.help.as_deref().unwrap_or("none"),
        )
    }
}

/// Receives the diagnostics of a failed status.
pub trait StatusReporter {
    fn report(&self, status: &Status);
}

/// Emits failures as `warn` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn report(&self, status: &Status) {
        tracing::warn!(
            code = status.code,
            error = status.error.as_deref().unwrap_or(""),
            help = status.help.as_deref().unwrap_or(""),
            "aEi request failed"
        );
    }
}

/// `true` iff `status.code == 200`. Failures go to the tracing reporter.
pub fn is_success(status: &Status) -> bool {
    is_success_with(status, &TracingReporter)
}

pub fn is_success_with(status: &Status, reporter: &impl StatusReporter) -> bool {
    if status.is_ok() {
        return true;
    }
    reporter.report(status);
    false
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<(Option<String>, Option<String>)>>);

    impl StatusReporter for Recorder {
        fn report(&self, status: &Status) {
            self.0
                .borrow_mut()
                .push((status.error.clone(), status.help.clone()));
        }
    }

    #[test]
    fn code_200_is_success_and_reports_nothing() {
        let recorder = Recorder::default();
        assert!(is_success_with(&Status::ok(), &recorder));
        assert!(recorder.0.borrow().is_empty());
    }

    #[test]
    fn failure_exposes_error_and_help() {
        let recorder = Recorder::default();
        let status = Status::failure(404, "not found", "check id");
        assert!(!is_success_with(&status, &recorder));
        assert_eq!(
            recorder.0.borrow().as_slice(),
            &[(Some("not found".to_string()), Some("check id".to_string()))]
        );
    }

    #[test]
    fn default_reporter_returns_false_on_failure() {
        assert!(!is_success(&Status::failure(500, "boom", "retry later")));
        assert!(is_success(&Status::ok()));
    }

    #[test]
    fn other_2xx_codes_are_not_success() {
        let status = Status {
            code: 201,
            error: None,
            help: None,
        };
        assert!(!is_success_with(&status, &Recorder::default()));
    }

    #[test]
    fn decodes_status_with_null_fields() {
        let status: Status =
            serde_json::from_str(r#"{"code":200,"error":null,"help":null}"#).unwrap();
        assert_eq!(status, Status::ok());
    }

    #[test]
    fn into_result_carries_diagnostics() {
        let err = Status::failure(401, "unauthorized", "log in again")
            .into_result()
            .unwrap_err();
        match err {
            ApiError::Status { code, error, help } => {
                assert_eq!(code, 401);
                assert_eq!(error.as_deref(), Some("unauthorized"));
                assert_eq!(help.as_deref(), Some("log in again"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
