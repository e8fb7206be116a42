//! Authenticated reads of the wallet balance from the BFF.
//!
//! The probe identifies itself with the synthetic-user headers so the backend
//! can tell monitoring traffic apart from real users. It is called exactly
//! twice per run, and a single failed read aborts the whole check.

use crate::config::RunConfig;
use crate::error::{CheckError, CheckResult};

/// Wallet balance endpoint path on the BFF
pub const BALANCE_PATH: &str = "/wallet/balance";

/// Header carrying the synthetic identity
pub const HEADER_USER_ID: &str = "X-IZK-UID";

/// Header marking the request as synthetic test traffic
pub const HEADER_TEST_USER: &str = "X-IZK-TEST-USER";

/// Longest body slice embedded in HTTP error messages
const ERROR_BODY_LIMIT: usize = 120;

/// Client for the BFF wallet endpoint
#[derive(Debug, Clone)]
pub struct WalletProbe {
    client: reqwest::Client,
    base_url: String,
    user_id: String,
}

impl WalletProbe {
    pub fn new(config: &RunConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.backend_url.clone(),
            user_id: config.test_user_id.clone(),
        }
    }

    /// Construct a probe against an explicit base URL (no trailing slash)
    pub fn with_base_url(base_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            user_id: user_id.into(),
        }
    }

    /// Read the current wallet balance.
    ///
    /// `label` tags the call site (`before`/`after`) so error messages
    /// disambiguate which of the two reads failed. Any non-success status or
    /// non-numeric balance field is a hard failure, never a default.
    pub async fn read_balance(&self, label: &'static str) -> CheckResult<f64> {
        let url = format!("{}{}", self.base_url, BALANCE_PATH);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(HEADER_USER_ID, &self.user_id)
            .header(HEADER_TEST_USER, "1")
            .send()
            .await
            .map_err(|e| CheckError::Balance {
                label,
                message: format!("wallet_balance_{}_request_failed: {}", label, e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(CheckError::Balance {
                label,
                message: format!(
                    "wallet_balance_{}_http_{}:{}",
                    label,
                    status.as_u16(),
                    snippet
                ),
            });
        }

        let payload: serde_json::Value =
            response
                .json()
                .await
                .map_err(|_| CheckError::Balance {
                    label,
                    message: format!("wallet_balance_{}_invalid_payload", label),
                })?;

        payload
            .get("balance")
            .and_then(serde_json::Value::as_f64)
            .filter(|balance| balance.is_finite())
            .ok_or_else(|| CheckError::Balance {
                label,
                message: format!("wallet_balance_{}_invalid_payload", label),
            })
    }
}
