//! End-to-end sign-in flows: coordinator, HTTP client and mock service.

use std::net::TcpListener;

use signin_engine::{
    Field, FlowPhase, MessageCenter, SigninCoordinator, SigninOutcome, ValidatorKey,
};
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

use crate::common::{
    coordinator, fill, http_client, mount_accept, mount_reject, mount_reject_once,
    request_count, start_auth_mock,
};

#[tokio::test]
async fn valid_credentials_authenticate() {
    let server = start_auth_mock().await;
    mount_accept(&server, "a@b.com", "correct").await;

    let mut coordinator = coordinator(&server);
    fill(&mut coordinator, "a@b.com", "correct");

    assert_eq!(coordinator.signin().await, SigninOutcome::Authenticated);
    assert_eq!(coordinator.phase(), FlowPhase::Idle);
    assert_eq!(coordinator.server_error(), None);
    assert!(!coordinator.form().is_invalid());
    assert!(coordinator.sink().is_empty());
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn rejection_becomes_server_error_and_notification() {
    let server = start_auth_mock().await;
    mount_reject(&server, 401, "Invalid credentials").await;

    let mut coordinator = coordinator(&server);
    fill(&mut coordinator, "a@b.com", "wrong");

    let outcome = coordinator.signin().await;
    assert!(matches!(
        &outcome,
        SigninOutcome::Rejected { message } if message.as_str() == "Invalid credentials"
    ));
    assert_eq!(coordinator.phase(), FlowPhase::ErrorDisplayed);
    assert_eq!(coordinator.server_error(), Some("Invalid credentials"));
    assert_eq!(
        coordinator.form().fields_failing(ValidatorKey::Server),
        vec![Field::Email, Field::Password]
    );
    assert_eq!(
        coordinator.sink().latest().map(|n| n.message()),
        Some("Invalid credentials")
    );
    // A stale rejection never blocks the next attempt.
    assert!(coordinator.can_submit());
}

#[tokio::test]
async fn malformed_email_never_reaches_the_service() {
    let server = start_auth_mock().await;
    mount_accept(&server, "not-an-email", "x").await;

    let mut coordinator = coordinator(&server);
    fill(&mut coordinator, "not-an-email", "x");

    assert_eq!(coordinator.signin().await, SigninOutcome::Aborted);
    assert_eq!(request_count(&server).await, 0);
    assert!(coordinator.form().field(Field::Email).has_error(ValidatorKey::Email));
    assert!(coordinator.form().field(Field::Email).touched());
    assert!(coordinator.sink().is_empty());
}

#[tokio::test]
async fn resubmit_after_rejection_clears_server_error() {
    let server = start_auth_mock().await;
    mount_reject_once(&server, 401, "Invalid credentials").await;
    mount_accept(&server, "a@b.com", "right").await;

    let mut coordinator = coordinator(&server);
    fill(&mut coordinator, "a@b.com", "wrong");
    assert!(matches!(
        coordinator.signin().await,
        SigninOutcome::Rejected { .. }
    ));

    fill(&mut coordinator, "a@b.com", "right");
    assert_eq!(coordinator.signin().await, SigninOutcome::Authenticated);
    assert_eq!(coordinator.server_error(), None);
    assert!(!coordinator.form().has_error(ValidatorKey::Server));
    assert_eq!(coordinator.sink().len(), 1);
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn plain_text_error_body_is_shown() {
    let server = start_auth_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service unavailable\n"))
        .mount(&server)
        .await;

    let mut coordinator = coordinator(&server);
    fill(&mut coordinator, "a@b.com", "pw");
    coordinator.signin().await;

    assert_eq!(coordinator.server_error(), Some("Service unavailable"));
}

#[tokio::test]
async fn empty_error_body_falls_back_to_status() {
    let server = start_auth_mock().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let mut coordinator = coordinator(&server);
    fill(&mut coordinator, "a@b.com", "pw");
    coordinator.signin().await;

    let message = coordinator.server_error().unwrap_or_default();
    assert!(message.starts_with("Sign in failed"), "{message}");
    assert!(message.contains("403"), "{message}");
}

#[tokio::test]
async fn unreachable_service_is_a_rejection() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut coordinator = SigninCoordinator::new(
        http_client(&format!("http://127.0.0.1:{port}")),
        MessageCenter::new(),
    );
    fill(&mut coordinator, "a@b.com", "pw");

    let outcome = coordinator.signin().await;
    assert!(matches!(outcome, SigninOutcome::Rejected { .. }));
    assert_eq!(coordinator.phase(), FlowPhase::ErrorDisplayed);
    assert!(
        coordinator
            .server_error()
            .is_some_and(|m| m.starts_with("Unable to reach sign-in service"))
    );
}
