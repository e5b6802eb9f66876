//! Config file driving the HTTP client and the app host.

use std::time::Duration;

use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use signin_config::SigninConfig;
use signin_engine::{App, AppSettings, Field, FlowPhase, SigninOutcome};
use signin_providers::{ClientBuildError, HttpAuthClient, HttpAuthConfig};

use crate::common::start_auth_mock;

fn write_config(contents: &str) -> (tempfile::TempDir, SigninConfig) {
    let dir = tempdir().unwrap();
    let file = dir.path().join("config.toml");
    std::fs::write(&file, contents).unwrap();
    let config = SigninConfig::load_from(&file).unwrap();
    (dir, config)
}

fn client_from(config: &SigninConfig, base_url: &str) -> Result<HttpAuthClient, ClientBuildError> {
    HttpAuthClient::new(&HttpAuthConfig {
        base_url: base_url.to_string(),
        signin_path: config.signin_path(),
        connect_timeout: config.connect_timeout(),
        allow_http: config.allow_http(),
    })
}

#[test]
fn https_only_unless_config_allows_http() {
    let (_dir, config) = write_config("[auth]\nsignin_path = \"/login\"\n");
    assert!(matches!(
        client_from(&config, "http://127.0.0.1:9"),
        Err(ClientBuildError::InsecureScheme(_))
    ));

    let client = client_from(&config, "https://console.example.com").unwrap();
    assert_eq!(
        client.endpoint().as_str(),
        "https://console.example.com/login"
    );
}

#[tokio::test]
async fn configured_path_and_title_reach_the_app() {
    let server = start_auth_mock().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(423).set_body_json(json!({ "error": { "message": "Account locked" } })),
        )
        .mount(&server)
        .await;

    let (_dir, config) = write_config(
        r#"
[auth]
signin_path = "auth/login"
allow_http = true

[app]
notification_title = "Console"
ascii_only = true
"#,
    );

    let mut app = App::new(
        client_from(&config, &server.uri()).unwrap(),
        AppSettings {
            prefill_email: Some("a@b.com".to_string()),
            notification_title: config.notification_title().map(ToString::to_string),
            ui_options: config.ui_options(),
        },
    );
    assert!(app.ui_options().ascii_only);
    assert_eq!(app.focus(), Field::Password);
    for c in "pw".chars() {
        app.insert_char(c);
    }

    app.submit().expect("prefilled form submits");
    tokio::time::timeout(Duration::from_secs(5), async {
        while app.process_results() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("attempt finished");

    assert!(matches!(
        app.last_outcome(),
        Some(SigninOutcome::Rejected { .. })
    ));
    assert_eq!(app.phase(), FlowPhase::ErrorDisplayed);
    let notification = app.notification().expect("rejection is shown");
    assert_eq!(notification.title(), Some("Console"));
    assert_eq!(notification.message(), "Account locked");
    assert_eq!(notification.format(), "Console: Account locked");
    assert!(app.signed_in().is_none());
}
