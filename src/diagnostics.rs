//! Best-effort screenshot capture for UI-stage failures.
//!
//! The capture must never mask the failure that triggered it: the artifact
//! path is attached to the propagated error whether or not the PNG write
//! succeeded, matching what the log consumers already expect.

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::{Page, ScreenshotParams};
use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::error::CheckError;

/// Filename prefix for failure screenshots
pub const ARTIFACT_PREFIX: &str = "playability-failure";

/// Build the artifact location for a failure at `timestamp_ms`.
///
/// The millisecond component keeps concurrent invocations from colliding.
pub fn artifact_path(dir: &Path, timestamp_ms: i64) -> PathBuf {
    dir.join(format!("{}-{}.png", ARTIFACT_PREFIX, timestamp_ms))
}

/// Capture a full-page screenshot and attach its location to `err`.
///
/// Returns the enriched error; the original failure is preserved even when
/// the capture itself fails.
pub async fn attach_failure_screenshot(page: &Page, err: CheckError) -> CheckError {
    let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let path = artifact_path(&dir, Utc::now().timestamp_millis());
    if let Err(capture_err) = capture_full_page(page, &path).await {
        eprintln!(
            "Warning: failure screenshot could not be captured: {}",
            capture_err
        );
    }
    err.with_screenshot(path)
}

async fn capture_full_page(page: &Page, path: &Path) -> Result<(), String> {
    let params = ScreenshotParams::builder()
        .format(CaptureScreenshotFormat::Png)
        .full_page(true)
        .build();
    let bytes = page
        .screenshot(params)
        .await
        .map_err(|e| e.to_string())?;
    std::fs::write(path, bytes).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_path_uses_prefix_and_millis() {
        let path = artifact_path(Path::new("/var/run/checks"), 1700000000123);
        assert_eq!(
            path,
            PathBuf::from("/var/run/checks/playability-failure-1700000000123.png")
        );
    }

    #[test]
    fn test_artifact_paths_distinct_per_timestamp() {
        let a = artifact_path(Path::new("."), 1);
        let b = artifact_path(Path::new("."), 2);
        assert_ne!(a, b);
    }
}
