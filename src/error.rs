//! Error taxonomy for the playability check.
//!
//! Every failure kind terminates the run; there is no category-specific
//! recovery. The `Ui` variant can carry the location of a diagnostic
//! screenshot so the reporter can surface it without the capture logic
//! knowing about reporting.

use std::path::{Path, PathBuf};

/// Result type for check operations
pub type CheckResult<T> = Result<T, CheckError>;

/// Errors that can occur during a playability check run
#[derive(Debug)]
pub enum CheckError {
    /// Required configuration absent or unusable (raised before any side effect)
    Config(String),
    /// Wallet balance read failed; `label` marks which of the two reads
    Balance {
        label: &'static str,
        message: String,
    },
    /// Browser scenario failed; may carry a diagnostic screenshot location
    Ui {
        message: String,
        screenshot_path: Option<PathBuf>,
    },
    /// Observed ledger delta outside tolerance of the expected value
    DeltaMismatch { actual: f64, expected: f64 },
}

impl CheckError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        CheckError::Config(message.into())
    }

    /// Create a UI-stage error with no screenshot attached yet
    pub fn ui(message: impl Into<String>) -> Self {
        CheckError::Ui {
            message: message.into(),
            screenshot_path: None,
        }
    }

    /// Attach a diagnostic screenshot location.
    ///
    /// Only the `Ui` variant carries an artifact; other kinds are returned
    /// unchanged so the original error is never replaced.
    pub fn with_screenshot(self, path: PathBuf) -> Self {
        match self {
            CheckError::Ui { message, .. } => CheckError::Ui {
                message,
                screenshot_path: Some(path),
            },
            other => other,
        }
    }

    /// Diagnostic screenshot location, if one was captured
    pub fn screenshot_path(&self) -> Option<&Path> {
        match self {
            CheckError::Ui {
                screenshot_path, ..
            } => screenshot_path.as_deref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckError::Config(message) => write!(f, "{}", message),
            CheckError::Balance { message, .. } => write!(f, "{}", message),
            CheckError::Ui { message, .. } => write!(f, "{}", message),
            CheckError::DeltaMismatch { actual, expected } => {
                write!(
                    f,
                    "balance_delta_mismatch actual={} expected={}",
                    actual, expected
                )
            }
        }
    }
}

impl std::error::Error for CheckError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_mismatch_display_embeds_both_values() {
        let err = CheckError::DeltaMismatch {
            actual: -1.98,
            expected: -2.0,
        };
        assert_eq!(
            err.to_string(),
            "balance_delta_mismatch actual=-1.98 expected=-2"
        );
    }

    #[test]
    fn test_with_screenshot_enriches_ui_errors() {
        let err = CheckError::ui("chat_reply_empty").with_screenshot(PathBuf::from("shot.png"));
        assert_eq!(err.screenshot_path(), Some(Path::new("shot.png")));
        assert_eq!(err.to_string(), "chat_reply_empty");
    }

    #[test]
    fn test_with_screenshot_leaves_other_kinds_unchanged() {
        let err = CheckError::Balance {
            label: "before",
            message: "wallet_balance_before_invalid_payload".to_string(),
        }
        .with_screenshot(PathBuf::from("shot.png"));
        assert!(err.screenshot_path().is_none());
    }
}
