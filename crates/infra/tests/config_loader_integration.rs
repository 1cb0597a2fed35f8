//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! building a `ForceLink` from it.

use std::io::Write;
use std::path::PathBuf;

use forcelink_domain::{ForceLinkError, TenantId};
use forcelink_infra::{config, ForceLink};
use tempfile::TempDir;

fn write_config(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("Failed to create config file");
    file.write_all(contents.as_bytes()).expect("Failed to write config file");
    path
}

#[test]
fn test_load_toml_with_tenants() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "forcelink.toml",
        r#"
            [http]
            timeout_seconds = 10
            max_attempts = 4

            [logging]
            level = "forcelink_core=debug"
            json = true

            [[tenants]]
            tenant_id = "acme"
            auth_url = "https://login.example.com"
            client_id = "3MVG9-acme"
            client_secret = "s3cret"
            redirect_uri = "https://app.example.com/oauth/callback"
            code = "aPrx.acme"

            [[tenants]]
            tenant_id = "globex"
            auth_url = "https://test.example.com"
            client_id = "3MVG9-globex"
            refresh_token = "5Aep-globex"
        "#,
    );

    let config = config::load_from_file(Some(path)).expect("config should load");

    assert_eq!(config.http.timeout_seconds, 10);
    assert_eq!(config.http.max_attempts, 4);
    assert_eq!(config.http.base_backoff_ms, 200);
    assert_eq!(config.logging.level, "forcelink_core=debug");
    assert!(config.logging.json);

    assert_eq!(config.tenants.len(), 2);
    assert_eq!(config.tenants[0].tenant_id.as_str(), "acme");
    assert_eq!(config.tenants[0].code.as_deref(), Some("aPrx.acme"));
    assert!(config.tenants[1].client_secret.is_empty());
    assert_eq!(config.tenants[1].refresh_token.as_deref(), Some("5Aep-globex"));
}

#[test]
fn test_load_json_and_build_forcelink() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "forcelink.json",
        r#"{
            "http": {"user_agent": "acme-sync/2.1"},
            "tenants": [{
                "tenant_id": "acme",
                "auth_url": "https://login.example.com",
                "client_id": "3MVG9-acme",
                "code": "aPrx.acme"
            }]
        }"#,
    );

    let config = config::load_from_file(Some(path)).expect("config should load");
    assert_eq!(config.http.user_agent, "acme-sync/2.1");

    let app = ForceLink::new(config).expect("forcelink should build");
    assert_eq!(app.config().tenants.len(), 1);
    assert!(app.manager().is_empty());
}

#[test]
fn test_integer_tenant_ids_are_accepted() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "forcelink.toml",
        r#"
            [[tenants]]
            tenant_id = 42
            auth_url = "https://login.example.com"
            client_id = "3MVG9-tenant42"
            code = "aPrx.42"
        "#,
    );

    let config = config::load_from_file(Some(path)).expect("config should load");
    assert_eq!(config.tenants[0].tenant_id, TenantId::from(42_u64));
    assert_eq!(config.tenants[0].tenant_id.as_str(), "42");
}

#[test]
fn test_invalid_tenant_is_rejected() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(
        &dir,
        "forcelink.toml",
        r#"
            [[tenants]]
            tenant_id = "acme"
            auth_url = "ftp://login.example.com"
            client_id = "3MVG9-acme"
        "#,
    );

    let err = config::load_from_file(Some(path)).unwrap_err();
    match err {
        ForceLinkError::Config(message) => {
            assert!(message.contains("acme"), "message should name the tenant: {message}");
        }
        other => panic!("expected config error, got {other:?}"),
    }
}

#[test]
fn test_malformed_toml_is_a_config_error() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "forcelink.toml", "[http\ntimeout_seconds = 10");

    let err = config::load_from_file(Some(path)).unwrap_err();
    assert!(matches!(err, ForceLinkError::Config(_)));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_config(&dir, "forcelink.yaml", "http: {}");

    let err = config::load_from_file(Some(path)).unwrap_err();
    assert!(matches!(err, ForceLinkError::Config(ref m) if m.contains("yaml")));
}

#[test]
fn test_missing_file() {
    let err = config::load_from_file(Some(PathBuf::from("/nonexistent/forcelink.toml")))
        .unwrap_err();
    assert!(matches!(err, ForceLinkError::Config(ref m) if m.contains("not found")));
}
