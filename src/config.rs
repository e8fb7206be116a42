//! Run configuration resolved from environment variables or CLI flags.
//!
//! This is the single gate before any cost is incurred: required parameters
//! are validated before the first network call or browser launch, and every
//! missing name is reported in one message.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FE_URL` | Frontend base URL the browser loads | required |
//! | `BFF_BASE_URL` | BFF base URL for wallet reads | required |
//! | `TEST_USER_ID` | Synthetic test identity | required |
//! | `LLM_ASSISTED_CHAT_MESSAGE` | Chat message to send | `テスト：稼働確認` |
//! | `EXPECTED_POINTS_CHANGE` | Expected points spent per chat turn | `0` |
//! | `TIMEOUT_SECONDS` | Per-step timeout for browser waits | `45` |
//! | `CHECK_HEADLESS` | Set to `false` or `0` for a headed browser | headless |

use std::env;
use std::time::Duration;

use crate::error::{CheckError, CheckResult};

// ============================================================================
// Default Values
// ============================================================================

/// Default chat message sent through the UI
pub const DEFAULT_CHAT_MESSAGE: &str = "テスト：稼働確認";

/// Default expected points change per chat turn
pub const DEFAULT_EXPECTED_POINTS_CHANGE: f64 = 0.0;

/// Default per-step timeout (seconds)
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 45;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the frontend base URL
pub const ENV_FRONTEND_URL: &str = "FE_URL";

/// Environment variable for the BFF base URL
pub const ENV_BACKEND_URL: &str = "BFF_BASE_URL";

/// Environment variable for the synthetic test identity
pub const ENV_TEST_USER_ID: &str = "TEST_USER_ID";

/// Environment variable for the chat message text
pub const ENV_CHAT_MESSAGE: &str = "LLM_ASSISTED_CHAT_MESSAGE";

/// Environment variable for the expected points change
pub const ENV_EXPECTED_POINTS_CHANGE: &str = "EXPECTED_POINTS_CHANGE";

/// Environment variable for the per-step timeout
pub const ENV_TIMEOUT_SECONDS: &str = "TIMEOUT_SECONDS";

/// Environment variable for the headless flag
pub const ENV_HEADLESS: &str = "CHECK_HEADLESS";

// ============================================================================
// Configuration Types
// ============================================================================

/// Raw, unvalidated configuration inputs.
///
/// All fields are optional; `RunConfig::resolve` decides which are required
/// and which fall back to defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigSource {
    pub frontend_url: Option<String>,
    pub backend_url: Option<String>,
    pub test_user_id: Option<String>,
    pub chat_message: Option<String>,
    pub expected_points_change: Option<String>,
    pub timeout_seconds: Option<String>,
    pub headless: Option<String>,
}

impl ConfigSource {
    /// Read all configuration inputs from the environment
    pub fn from_env() -> Self {
        Self {
            frontend_url: env::var(ENV_FRONTEND_URL).ok(),
            backend_url: env::var(ENV_BACKEND_URL).ok(),
            test_user_id: env::var(ENV_TEST_USER_ID).ok(),
            chat_message: env::var(ENV_CHAT_MESSAGE).ok(),
            expected_points_change: env::var(ENV_EXPECTED_POINTS_CHANGE).ok(),
            timeout_seconds: env::var(ENV_TIMEOUT_SECONDS).ok(),
            headless: env::var(ENV_HEADLESS).ok(),
        }
    }
}

/// Immutable per-invocation configuration.
///
/// Base URLs never end in a path separator; the identity is a trimmed,
/// non-empty string.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Frontend base URL the browser navigates to
    pub frontend_url: String,
    /// BFF base URL for the wallet balance reads
    pub backend_url: String,
    /// Synthetic test identity
    pub test_user_id: String,
    /// Chat message submitted through the UI
    pub chat_message: String,
    /// Expected points spent per chat turn (the observed balance delta is
    /// expected to equal the *negation* of this value)
    pub expected_points_change: f64,
    /// Bound for each blocking browser wait
    pub timeout: Duration,
    /// Whether the browser runs headless
    pub headless: bool,
}

impl RunConfig {
    /// Validate and normalize raw inputs into a run configuration.
    ///
    /// Fails with the full list of missing required names; an empty or
    /// all-whitespace value counts as missing. Optional numeric inputs that
    /// do not parse fall back to their defaults.
    pub fn resolve(source: &ConfigSource) -> CheckResult<Self> {
        let mut missing = Vec::new();
        let frontend_url = require(&source.frontend_url, ENV_FRONTEND_URL, &mut missing);
        let backend_url = require(&source.backend_url, ENV_BACKEND_URL, &mut missing);
        let test_user_id = require(&source.test_user_id, ENV_TEST_USER_ID, &mut missing);

        if !missing.is_empty() {
            return Err(CheckError::config(format!(
                "Missing environment variables: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            frontend_url: trim_trailing_slashes(&frontend_url),
            backend_url: trim_trailing_slashes(&backend_url),
            test_user_id,
            chat_message: optional_string(&source.chat_message)
                .unwrap_or_else(|| DEFAULT_CHAT_MESSAGE.to_string()),
            expected_points_change: parse_finite_or(
                &source.expected_points_change,
                DEFAULT_EXPECTED_POINTS_CHANGE,
            ),
            timeout: Duration::from_secs(parse_or(
                &source.timeout_seconds,
                DEFAULT_TIMEOUT_SECONDS,
            )),
            headless: parse_headless(&source.headless),
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Strip all trailing path separators so downstream concatenation never
/// produces a double slash
pub fn trim_trailing_slashes(value: &str) -> String {
    value.trim_end_matches('/').to_string()
}

fn require(value: &Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match optional_string(value) {
        Some(v) => v,
        None => {
            missing.push(name);
            String::new()
        }
    }
}

/// Treat absent, empty and all-whitespace values alike
fn optional_string(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn parse_or<T: std::str::FromStr>(value: &Option<String>, default: T) -> T {
    optional_string(value)
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// A non-finite expected change would make the tolerance comparison pass
/// vacuously, so it falls back to the default like any other bad input
fn parse_finite_or(value: &Option<String>, default: f64) -> f64 {
    optional_string(value)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn parse_headless(value: &Option<String>) -> bool {
    !matches!(value.as_deref().map(str::trim), Some("false") | Some("0"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn full_source() -> ConfigSource {
        ConfigSource {
            frontend_url: Some("https://fe.example.test/".to_string()),
            backend_url: Some("https://bff.example.test///".to_string()),
            test_user_id: Some("  smoke-user-1  ".to_string()),
            chat_message: None,
            expected_points_change: None,
            timeout_seconds: None,
            headless: None,
        }
    }

    #[test]
    fn test_resolve_reports_all_missing_names() {
        let err = RunConfig::resolve(&ConfigSource::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variables: FE_URL, BFF_BASE_URL, TEST_USER_ID"
        );
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let source = ConfigSource {
            frontend_url: Some("https://fe.example.test".to_string()),
            backend_url: Some("".to_string()),
            test_user_id: Some("   ".to_string()),
            ..ConfigSource::default()
        };
        let err = RunConfig::resolve(&source).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing environment variables: BFF_BASE_URL, TEST_USER_ID"
        );
    }

    #[test]
    fn test_trailing_slashes_are_stripped() {
        let config = RunConfig::resolve(&full_source()).unwrap();
        assert_eq!(config.frontend_url, "https://fe.example.test");
        assert_eq!(config.backend_url, "https://bff.example.test");
    }

    #[test]
    fn test_identity_is_trimmed() {
        let config = RunConfig::resolve(&full_source()).unwrap();
        assert_eq!(config.test_user_id, "smoke-user-1");
    }

    #[test]
    fn test_optional_defaults() {
        let config = RunConfig::resolve(&full_source()).unwrap();
        assert_eq!(config.chat_message, DEFAULT_CHAT_MESSAGE);
        assert_eq!(config.expected_points_change, 0.0);
        assert_eq!(config.timeout, Duration::from_secs(45));
        assert!(config.headless);
    }

    #[test]
    fn test_optional_overrides() {
        let source = ConfigSource {
            chat_message: Some("hello".to_string()),
            expected_points_change: Some("2.5".to_string()),
            timeout_seconds: Some("10".to_string()),
            headless: Some("false".to_string()),
            ..full_source()
        };
        let config = RunConfig::resolve(&source).unwrap();
        assert_eq!(config.chat_message, "hello");
        assert_eq!(config.expected_points_change, 2.5);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert!(!config.headless);
    }

    #[test]
    fn test_unparsable_numerics_fall_back_to_defaults() {
        let source = ConfigSource {
            expected_points_change: Some("NaN".to_string()),
            timeout_seconds: Some("soon".to_string()),
            ..full_source()
        };
        let config = RunConfig::resolve(&source).unwrap();
        assert_eq!(config.expected_points_change, DEFAULT_EXPECTED_POINTS_CHANGE);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECONDS));
    }

    #[test]
    fn test_trim_trailing_slashes() {
        assert_eq!(trim_trailing_slashes("https://x.test/"), "https://x.test");
        assert_eq!(trim_trailing_slashes("https://x.test///"), "https://x.test");
        assert_eq!(trim_trailing_slashes("https://x.test"), "https://x.test");
    }

    #[test]
    fn test_parse_headless() {
        assert!(parse_headless(&None));
        assert!(parse_headless(&Some("true".to_string())));
        assert!(!parse_headless(&Some("false".to_string())));
        assert!(!parse_headless(&Some("0".to_string())));
    }
}
