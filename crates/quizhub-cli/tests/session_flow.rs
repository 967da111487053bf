//! End-to-end session flow through the CLI handlers

use quizhub_cli::cli::handlers::{auth, build_client, request, status};
use quizhub_cli::config::{CliConfig, TokenStoreKind};
use quizhub_sdk::{FileTokenStore, TokenStore};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, credentials: &std::path::Path) -> CliConfig {
    let mut config = CliConfig::default();
    config.api.base_url = server.uri();
    config.auth.token_store = TokenStoreKind::File;
    config.auth.credentials_path = Some(credentials.to_path_buf());
    config.retry.base_delay_ms = 1;
    config.retry.max_jitter_ms = 0;
    config
}

#[tokio::test]
async fn test_login_request_logout() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let credentials = dir.path().join("credentials.json");

    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "token": "cli-access",
                "refreshToken": "cli-refresh",
                "user": { "id": "u1", "name": "Ana" }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/quizzes"))
        .and(header("Authorization", "Bearer cli-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server, &credentials);

    auth::handle_login(&config, "ana", Some("secret".to_string()), false)
        .await
        .unwrap();

    // A fresh store instance sees the persisted tokens
    let store = FileTokenStore::new(&credentials);
    assert_eq!(store.access_token().as_deref(), Some("cli-access"));
    assert_eq!(store.refresh_token().as_deref(), Some("cli-refresh"));

    status::handle_status(&config, true).unwrap();
    request::handle_request(&config, "get", "/quizzes", None, false)
        .await
        .unwrap();

    auth::handle_logout(&config).unwrap();
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
}

#[tokio::test]
async fn test_expired_session_is_cleared_on_disk() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let credentials = dir.path().join("credentials.json");

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server, &credentials);
    let client = build_client(&config).unwrap();
    client.set_tokens("stale", Some("revoked"));

    let result = request::handle_request(&config, "GET", "/me", None, false).await;
    assert!(result.is_err());

    let store = FileTokenStore::new(&credentials);
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
}
