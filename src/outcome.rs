//! The check outcome record, delta reconciliation and structured reporting.
//!
//! One JSON record per run is the sole externally observable artifact: the
//! success path goes to stdout with exit code 0, the failure path to stderr
//! with exit code 1. Stage fields are optional and omitted from the JSON when
//! a stage never ran, which also yields the reduced record for pre-flight
//! configuration failures.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{CheckError, CheckResult};

/// Event tag the log pipeline keys on
pub const EVENT_NAME: &str = "daily_test_user";

/// Allowed divergence between observed and expected delta
pub const DELTA_TOLERANCE: f64 = 0.01;

const STATUS_SUCCESS: &str = "success";
const STATUS_FAILURE: &str = "failure";

/// Structured result of one playability check run.
///
/// Assembled incrementally as stages complete; no stage mutates a field
/// written by an earlier one. Emitted exactly once at the reporting boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub event: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_before: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_status: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_delta: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<PathBuf>,
}

impl CheckOutcome {
    /// Outcome skeleton for a run that passed configuration
    pub fn started(prompt: &str) -> Self {
        Self {
            event: EVENT_NAME.to_string(),
            timestamp: now_rfc3339(),
            prompt: Some(prompt.to_string()),
            status: STATUS_SUCCESS.to_string(),
            balance_before: None,
            reply: None,
            transport_status: None,
            balance_after: None,
            delta: None,
            expected_delta: None,
            response_time_ms: None,
            error: None,
            screenshot_path: None,
        }
    }

    /// Reduced record for failures before any stage ran (missing configuration)
    pub fn config_failure(message: &str) -> Self {
        Self {
            event: EVENT_NAME.to_string(),
            timestamp: now_rfc3339(),
            prompt: None,
            status: STATUS_FAILURE.to_string(),
            balance_before: None,
            reply: None,
            transport_status: None,
            balance_after: None,
            delta: None,
            expected_delta: None,
            response_time_ms: None,
            error: Some(message.to_string()),
            screenshot_path: None,
        }
    }

    /// Mark the run failed, recording the message and any diagnostic artifact
    pub fn fail(&mut self, err: &CheckError) {
        self.status = STATUS_FAILURE.to_string();
        self.error = Some(err.to_string());
        self.screenshot_path = err.screenshot_path().map(PathBuf::from);
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Serialize to the single-line JSON record the log pipeline ingests
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                "{{\"event\":\"{}\",\"status\":\"failure\",\"error\":\"outcome_serialization_failed\"}}",
                EVENT_NAME
            )
        })
    }

    /// Emit the record to exactly one of stdout/stderr and return the
    /// process exit code.
    pub fn emit(&self) -> i32 {
        let line = self.to_json_line();
        if self.is_success() {
            println!("{}", line);
            0
        } else {
            eprintln!("{}", line);
            1
        }
    }
}

/// Balance movement across the chat turn, rounded to 4 decimal places
pub fn round_delta(before: f64, after: f64) -> f64 {
    ((after - before) * 10_000.0).round() / 10_000.0
}

/// Compare the observed delta against the expected one.
///
/// `expected_delta` already carries the sign inversion: a configured positive
/// points change means the balance should have *decreased* by that amount.
pub fn verify_delta(delta: f64, expected_delta: f64) -> CheckResult<()> {
    if (delta - expected_delta).abs() > DELTA_TOLERANCE {
        return Err(CheckError::DeltaMismatch {
            actual: delta,
            expected: expected_delta,
        });
    }
    Ok(())
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
