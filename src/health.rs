//! Health-URL resolution with an explicit, invalidatable cache.
//!
//! The BFF advertises its health endpoint via `/admin/info`; consumers fall
//! back to `/health/ping` when that lookup fails or advertises nothing. The
//! resolved URL is memoized per base URL until `invalidate` is called or the
//! base changes — the cache is an owned object, not ambient module state,
//! so its lifetime and invalidation are part of the caller's interface.

use std::time::Duration;

use crate::config::trim_trailing_slashes;

/// Fallback health endpoint path
pub const DEFAULT_HEALTH_PATH: &str = "/health/ping";

/// Discovery endpoint advertising the health path
pub const ADMIN_INFO_PATH: &str = "/admin/info";

/// Budget for the discovery request; the fallback is always available
const ADMIN_INFO_TIMEOUT: Duration = Duration::from_secs(2);

/// Lazily-resolved health URL, keyed by normalized base URL
#[derive(Debug, Clone, Default)]
pub struct HealthUrlCache {
    cached_base: Option<String>,
    cached_url: Option<String>,
}

impl HealthUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the memoized URL; the next `resolve` refetches
    pub fn invalidate(&mut self) {
        self.cached_base = None;
        self.cached_url = None;
    }

    /// Resolve the health URL for `base_url`, consulting `/admin/info` on a
    /// cache miss and falling back to `/health/ping`. Never fails: discovery
    /// errors only select the fallback.
    pub async fn resolve(&mut self, client: &reqwest::Client, base_url: &str) -> String {
        let base = trim_trailing_slashes(base_url);
        if let (Some(cached_base), Some(cached_url)) = (&self.cached_base, &self.cached_url) {
            if *cached_base == base {
                return cached_url.clone();
            }
        }

        let url = match fetch_advertised_path(client, &base).await {
            Some(path) => format!("{}{}", base, path),
            None => format!("{}{}", base, DEFAULT_HEALTH_PATH),
        };

        self.cached_base = Some(base);
        self.cached_url = Some(url.clone());
        url
    }
}

async fn fetch_advertised_path(client: &reqwest::Client, base: &str) -> Option<String> {
    let response = client
        .get(format!("{}{}", base, ADMIN_INFO_PATH))
        .timeout(ADMIN_INFO_TIMEOUT)
        .send()
        .await
        .ok()?;
    if !response.status().is_success() {
        return None;
    }
    let info: serde_json::Value = response.json().await.ok()?;
    info.get("health_url")
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(String::from)
}
