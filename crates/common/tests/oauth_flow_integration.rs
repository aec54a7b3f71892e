//! End-to-end auth flow tests against a mock token endpoint.

use std::sync::Arc;

use ledgersync_common::auth::{
    AuthError, CredentialStore, OAuthClient, OAuthClientTrait, TokenManager,
};
use ledgersync_common::crypto::EncryptionService;
use ledgersync_common::storage::MemorySettingsStore;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_manager(server_uri: &str) -> TokenManager<OAuthClient> {
    let settings = Arc::new(MemorySettingsStore::new());
    let crypto = EncryptionService::new(&EncryptionService::generate_key()).expect("crypto");
    let store = Arc::new(CredentialStore::new(settings, crypto));
    TokenManager::new(OAuthClient::new(server_uri), store)
}

#[tokio::test]
async fn refresh_flow_returns_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OAuthClient::new(&server.uri());
    let response = client.refresh_access_token("id", "secret", "refresh-1").await.expect("tokens");

    assert_eq!(response.access_token, "access-1");
    assert_eq!(response.expires_in, 3600);
    assert!(response.refresh_token.is_none());
}

#[tokio::test]
async fn denied_refresh_is_distinguished_from_other_rejections() {
    let server = MockServer::start().await;
    // The provider reports application errors inside a 200 body.
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "error": "invalid_grant" })),
        )
        .mount(&server)
        .await;

    let client = OAuthClient::new(&server.uri());

    let refresh = client.refresh_access_token("id", "secret", "stale").await;
    assert!(matches!(refresh, Err(AuthError::RefreshDenied(code)) if code == "invalid_grant"));

    // The same rejection on the exchange flow is not a refresh denial.
    let exchange = client.exchange_grant_code("id", "secret", "stale").await;
    assert!(matches!(exchange, Err(AuthError::Provider(_))));
}

#[tokio::test]
async fn non_success_status_without_error_body_is_a_provider_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = OAuthClient::new(&server.uri());
    let result = client.refresh_access_token("id", "secret", "refresh-1").await;
    assert!(matches!(result, Err(AuthError::Provider(_))));
}

#[tokio::test]
async fn connect_falls_back_to_grant_code_exchange() {
    let server = MockServer::start().await;

    // The pasted value is rejected as a refresh token...
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    // ...then accepted as a grant code, yielding a rotated refresh token.
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-2",
            "refresh_token": "refresh-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = token_manager(&server.uri());
    manager.save_credentials("id", "secret", "pasted-grant-code", "us").await.expect("connected");

    assert!(manager.has_credentials().expect("store readable"));
    assert_eq!(manager.get_access_token().await.expect("token"), "access-2");
}

#[tokio::test]
async fn expired_token_is_refreshed_through_the_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-fresh",
            "expires_in": 3600
        })))
        .mount(&server)
        .await;

    let manager = token_manager(&server.uri());
    manager.save_credentials("id", "secret", "refresh-1", "us").await.expect("connected");

    // Expire the cached token; the next read must hit the endpoint.
    manager.save_access_token("expired", 0).await.expect("saved");
    assert_eq!(manager.get_access_token().await.expect("token"), "access-fresh");
}
