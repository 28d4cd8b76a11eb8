//! Tests for the authentication module

use super::*;
use crate::error::Error;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_login_fetches_and_caches_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth.json"))
        .and(body_json(json!({"username": "alice", "password": "s3cret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "jwt-abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = Arc::new(StaticCredentials::login("alice", "s3cret"));
    let auth = Authenticator::new(
        format!("{}/api/auth.json", server.uri()),
        provider,
        reqwest::Client::new(),
    );

    assert_eq!(auth.token().await.unwrap(), "jwt-abc");
    // Second call is served from the cache; the mock expects exactly one hit.
    assert_eq!(auth.token().await.unwrap(), "jwt-abc");
}

#[tokio::test]
async fn test_login_rejected_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let provider = Arc::new(StaticCredentials::login("alice", "wrong"));
    let auth = Authenticator::new(
        format!("{}/api/auth.json", server.uri()),
        provider,
        reqwest::Client::new(),
    );

    let err = auth.token().await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }), "got: {err}");
}

#[tokio::test]
async fn test_pre_issued_token_skips_login() {
    // No mock server at all: a token provider must not touch the network.
    let provider = Arc::new(StaticCredentials::token("issued-token"));
    let auth = Authenticator::new(
        "http://127.0.0.1:1/api/auth.json",
        provider,
        reqwest::Client::new(),
    );

    assert_eq!(auth.token().await.unwrap(), "issued-token");
}

#[tokio::test]
async fn test_invalidate_forces_new_login() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "jwt-abc"})))
        .expect(2)
        .mount(&server)
        .await;

    let provider = Arc::new(StaticCredentials::login("alice", "s3cret"));
    let auth = Authenticator::new(
        format!("{}/api/auth.json", server.uri()),
        provider,
        reqwest::Client::new(),
    );

    auth.token().await.unwrap();
    auth.invalidate().await;
    auth.token().await.unwrap();
}

#[derive(Debug)]
struct FailingProvider;

#[async_trait::async_trait]
impl CredentialProvider for FailingProvider {
    async fn credentials(&self) -> crate::error::Result<Credentials> {
        Err(Error::auth("no credentials configured"))
    }
}

#[tokio::test]
async fn test_provider_failure_surfaces_as_auth_error() {
    let auth = Authenticator::new(
        "http://127.0.0.1:1/api/auth.json",
        Arc::new(FailingProvider),
        reqwest::Client::new(),
    );

    let err = auth.token().await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
}
