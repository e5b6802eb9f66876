//! Shared test utilities and fixtures
//!
//! Mock sign-in service plus a coordinator wired to the real HTTP client.

#![allow(dead_code)]

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use signin_config::DEFAULT_SIGNIN_PATH;
use signin_engine::{FormEvent, MessageCenter, SigninCoordinator};
use signin_providers::{HttpAuthClient, HttpAuthConfig};

pub type HttpCoordinator = SigninCoordinator<HttpAuthClient, MessageCenter>;

/// Start a mock server that simulates the sign-in service
pub async fn start_auth_mock() -> MockServer {
    MockServer::start().await
}

/// Accept exactly these credentials with 200
pub async fn mount_accept(server: &MockServer, email: &str, password: &str) {
    Mock::given(method("POST"))
        .and(path(DEFAULT_SIGNIN_PATH))
        .and(body_json(json!({ "email": email, "password": password })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(server)
        .await;
}

/// Reject every request with `status` and a `{"message": ..}` body
pub async fn mount_reject(server: &MockServer, status: u16, message: &str) {
    Mock::given(method("POST"))
        .and(path(DEFAULT_SIGNIN_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "message": message })))
        .mount(server)
        .await;
}

/// Reject only the first request, ahead of anything else mounted
pub async fn mount_reject_once(server: &MockServer, status: u16, message: &str) {
    Mock::given(method("POST"))
        .and(path(DEFAULT_SIGNIN_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "message": message })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;
}

pub fn http_client(base_url: &str) -> HttpAuthClient {
    HttpAuthClient::new(&HttpAuthConfig {
        base_url: base_url.to_string(),
        signin_path: DEFAULT_SIGNIN_PATH.to_string(),
        connect_timeout: Duration::from_secs(5),
        allow_http: true,
    })
    .expect("mock server url is valid")
}

pub fn coordinator(server: &MockServer) -> HttpCoordinator {
    SigninCoordinator::new(http_client(&server.uri()), MessageCenter::new())
}

pub fn fill(coordinator: &mut HttpCoordinator, email: &str, password: &str) {
    coordinator.apply(FormEvent::EmailChanged(email.to_string()));
    coordinator.apply(FormEvent::PasswordChanged(password.to_string()));
}

pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map_or(0, |requests| requests.len())
}
