//! Integration tests for the wallet probe and health-URL cache against a
//! mocked BFF.

use httpmock::prelude::*;
use serde_json::json;

use playcheck::health::HealthUrlCache;
use playcheck::wallet::WalletProbe;
use playcheck::{CheckError, ConfigSource, RunConfig};

fn config_source(backend_url: &str) -> ConfigSource {
    ConfigSource {
        frontend_url: Some("https://fe.example.test".to_string()),
        backend_url: Some(backend_url.to_string()),
        test_user_id: Some("smoke-user".to_string()),
        ..ConfigSource::default()
    }
}

#[tokio::test]
async fn test_read_balance_sends_identity_headers() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/wallet/balance")
                .header("content-type", "application/json")
                .header("X-IZK-UID", "smoke-user")
                .header("X-IZK-TEST-USER", "1");
            then.status(200).json_body(json!({ "balance": 100.5 }));
        })
        .await;

    let probe = WalletProbe::with_base_url(server.base_url(), "smoke-user");
    let balance = probe.read_balance("before").await.unwrap();

    assert_eq!(balance, 100.5);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_trailing_slash_base_never_double_slashes() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/wallet/balance");
            then.status(200).json_body(json!({ "balance": 42.0 }));
        })
        .await;

    let source = config_source(&format!("{}/", server.base_url()));
    let config = RunConfig::resolve(&source).unwrap();
    let probe = WalletProbe::new(&config);

    let balance = probe.read_balance("before").await.unwrap();
    assert_eq!(balance, 42.0);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_numeric_balance_fails_with_call_site_label() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/wallet/balance");
            then.status(200).json_body(json!({ "balance": "plenty" }));
        })
        .await;

    let probe = WalletProbe::with_base_url(server.base_url(), "smoke-user");
    let err = probe.read_balance("before").await.unwrap_err();

    assert_eq!(err.to_string(), "wallet_balance_before_invalid_payload");
    assert!(matches!(err, CheckError::Balance { label: "before", .. }));
}

#[tokio::test]
async fn test_http_error_embeds_status_and_body_snippet() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/wallet/balance");
            then.status(503).body("upstream down");
        })
        .await;

    let probe = WalletProbe::with_base_url(server.base_url(), "smoke-user");
    let err = probe.read_balance("after").await.unwrap_err();

    assert_eq!(err.to_string(), "wallet_balance_after_http_503:upstream down");
    assert!(matches!(err, CheckError::Balance { label: "after", .. }));
}

#[tokio::test]
async fn test_missing_balance_field_is_invalid_payload() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/wallet/balance");
            then.status(200).json_body(json!({ "points": 10 }));
        })
        .await;

    let probe = WalletProbe::with_base_url(server.base_url(), "smoke-user");
    let err = probe.read_balance("after").await.unwrap_err();
    assert_eq!(err.to_string(), "wallet_balance_after_invalid_payload");
}

#[test]
fn test_missing_config_fails_before_any_collaborator_exists() {
    // No mock server at all: validation must fail before anything could be
    // contacted, listing every missing name.
    let err = RunConfig::resolve(&ConfigSource::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing environment variables: FE_URL, BFF_BASE_URL, TEST_USER_ID"
    );
}

#[tokio::test]
async fn test_health_cache_honors_advertised_path_and_memoizes() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/info");
            then.status(200).json_body(json!({ "health_url": "/internal/health" }));
        })
        .await;

    let client = reqwest::Client::new();
    let mut cache = HealthUrlCache::new();

    let resolved = cache.resolve(&client, &server.base_url()).await;
    assert_eq!(resolved, format!("{}/internal/health", server.base_url()));

    // Swap the advertised path; the cached URL must survive until invalidated.
    first.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/info");
            then.status(200).json_body(json!({ "health_url": "/internal/health2" }));
        })
        .await;

    let cached = cache.resolve(&client, &server.base_url()).await;
    assert_eq!(cached, format!("{}/internal/health", server.base_url()));

    cache.invalidate();
    let refreshed = cache.resolve(&client, &server.base_url()).await;
    assert_eq!(refreshed, format!("{}/internal/health2", server.base_url()));
}

#[tokio::test]
async fn test_health_cache_falls_back_on_discovery_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/admin/info");
            then.status(500);
        })
        .await;

    let client = reqwest::Client::new();
    let mut cache = HealthUrlCache::new();

    let resolved = cache.resolve(&client, &server.base_url()).await;
    assert_eq!(resolved, format!("{}/health/ping", server.base_url()));
}

#[tokio::test]
async fn test_health_cache_refetches_on_base_change() {
    let server_a = MockServer::start_async().await;
    let server_b = MockServer::start_async().await;
    server_a
        .mock_async(|when, then| {
            when.method(GET).path("/admin/info");
            then.status(200).json_body(json!({ "health_url": "/a" }));
        })
        .await;
    server_b
        .mock_async(|when, then| {
            when.method(GET).path("/admin/info");
            then.status(200).json_body(json!({ "health_url": "/b" }));
        })
        .await;

    let client = reqwest::Client::new();
    let mut cache = HealthUrlCache::new();

    assert_eq!(
        cache.resolve(&client, &server_a.base_url()).await,
        format!("{}/a", server_a.base_url())
    );
    assert_eq!(
        cache.resolve(&client, &server_b.base_url()).await,
        format!("{}/b", server_b.base_url())
    );
}
