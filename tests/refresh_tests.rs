mod auth_support;

use chrono::Utc;
use copilot_auth::{AccessTokenRefresher, AuthError};
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{expired_credential, InMemoryCredentialStore};

fn refresher(server: &MockServer) -> AccessTokenRefresher {
    AccessTokenRefresher::new()
        .with_token_mint_url(format!("{}/copilot_internal/v2/token", server.uri()))
}

#[tokio::test]
async fn refresh_success_saves_and_returns_token() {
    let server = MockServer::start().await;
    let expires_at = Utc::now().timestamp() + 1800;
    Mock::given(method("GET"))
        .and(path("/copilot_internal/v2/token"))
        .and(header("authorization", "token gho_identity"))
        .and(header("accept", "application/json"))
        .and(header_exists("user-agent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "copilot-fresh",
            "expires_at": expires_at
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryCredentialStore::new();
    let token = refresher(&server)
        .refresh("gho_identity", &store)
        .await
        .expect("refresh");

    assert_eq!(token, "copilot-fresh");
    let saved = store.get().expect("saved credential");
    assert_eq!(saved.identity_token, "gho_identity");
    assert_eq!(saved.access_token, "copilot-fresh");
    assert_eq!(saved.access_token_expires_at, expires_at);
}

#[tokio::test]
async fn refresh_preserves_identity_token_on_update() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/copilot_internal/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "copilot-renewed",
            "expires_at": Utc::now().timestamp() + 1800
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryCredentialStore::new();
    store.seed(expired_credential("gho_identity", "copilot-stale"));

    refresher(&server)
        .refresh("gho_identity", &store)
        .await
        .expect("refresh");

    let saved = store.get().expect("saved credential");
    assert_eq!(saved.identity_token, "gho_identity");
    assert_eq!(saved.access_token, "copilot-renewed");
}

#[tokio::test]
async fn refresh_unauthorized_means_identity_token_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/copilot_internal/v2/token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryCredentialStore::new();
    let result = refresher(&server).refresh("gho_stale", &store).await;

    assert!(matches!(result, Err(AuthError::IdentityTokenInvalid)));
    assert!(store.get().is_none());
}

#[tokio::test]
async fn refresh_forbidden_means_access_forbidden() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/copilot_internal/v2/token"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryCredentialStore::new();
    let result = refresher(&server).refresh("gho_identity", &store).await;

    assert!(matches!(result, Err(AuthError::AccessForbidden)));
}

#[tokio::test]
async fn refresh_other_status_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/copilot_internal/v2/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryCredentialStore::new();
    let result = refresher(&server).refresh("gho_identity", &store).await;

    assert!(matches!(result, Err(AuthError::Protocol(msg)) if msg.contains("500")));
}

#[tokio::test]
async fn refresh_malformed_body_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/copilot_internal/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryCredentialStore::new();
    let result = refresher(&server).refresh("gho_identity", &store).await;

    assert!(matches!(result, Err(AuthError::Protocol(msg)) if msg.contains("malformed")));
    assert!(store.get().is_none());
}
