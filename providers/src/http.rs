//! HTTP authentication client.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Url;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{AuthClient, AuthRejection, extract_rejection_message};

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;
const POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// Settings for [`HttpAuthClient`].
#[derive(Debug, Clone)]
pub struct HttpAuthConfig {
    pub base_url: String,
    pub signin_path: String,
    pub connect_timeout: Duration,
    /// Permit `http://` endpoints; otherwise the client is https-only.
    pub allow_http: bool,
}

#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid sign-in endpoint {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("sign-in endpoint must use https: {0}")]
    InsecureScheme(String),
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Serialize)]
struct SigninRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Posts `{"email", "password"}` to `{base_url}{signin_path}`; any 2xx is success.
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpAuthClient {
    pub fn new(config: &HttpAuthConfig) -> Result<Self, ClientBuildError> {
        let raw = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            config.signin_path
        );
        let endpoint = Url::parse(&raw).map_err(|source| ClientBuildError::InvalidUrl {
            url: raw.clone(),
            source,
        })?;
        if endpoint.scheme() != "https" && !config.allow_http {
            return Err(ClientBuildError::InsecureScheme(raw));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
            .redirect(reqwest::redirect::Policy::none())
            .https_only(!config.allow_http)
            .build()?;

        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl AuthClient for HttpAuthClient {
    async fn signin(&self, email: &str, password: &str) -> Result<(), AuthRejection> {
        debug!(endpoint = %self.endpoint, email, "Posting sign-in request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&SigninRequest { email, password })
            .send()
            .await
            .map_err(|err| {
                warn!(endpoint = %self.endpoint, "Sign-in request failed: {err}");
                AuthRejection::new(format!("Unable to reach sign-in service: {err}"))
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(%status, "Sign-in accepted");
            return Ok(());
        }

        let body = read_capped_error_body(response).await;
        let message = extract_rejection_message(&body)
            .unwrap_or_else(|| format!("Sign in failed ({status})"));
        debug!(%status, "Sign-in rejected");
        Err(AuthRejection::new(message))
    }
}

/// Read at most `MAX_ERROR_BODY_BYTES` of an error response as lossy UTF-8.
async fn read_capped_error_body(response: reqwest::Response) -> String {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let Ok(chunk) = chunk else { break };
        body.extend_from_slice(&chunk);
        if body.len() > MAX_ERROR_BODY_BYTES {
            body.truncate(MAX_ERROR_BODY_BYTES);
            let text = String::from_utf8_lossy(&body);
            return format!("{text}...(truncated)");
        }
    }
    String::from_utf8_lossy(&body).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: &str) -> HttpAuthConfig {
        HttpAuthConfig {
            base_url: base_url.to_string(),
            signin_path: "/api/v1/signin".to_string(),
            connect_timeout: Duration::from_secs(5),
            allow_http: true,
        }
    }

    #[test]
    fn endpoint_joins_base_and_path() {
        let client = HttpAuthClient::new(&config("https://console.example.com/")).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://console.example.com/api/v1/signin"
        );
    }

    #[test]
    fn rejects_plain_http_unless_allowed() {
        let mut cfg = config("http://console.example.com");
        cfg.allow_http = false;
        assert!(matches!(
            HttpAuthClient::new(&cfg),
            Err(ClientBuildError::InsecureScheme(_))
        ));
    }

    #[test]
    fn rejects_unparsable_url() {
        assert!(matches!(
            HttpAuthClient::new(&config("not a url")),
            Err(ClientBuildError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn success_on_2xx() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/signin"))
            .and(body_json(serde_json::json!({
                "email": "a@b.com",
                "password": "x"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpAuthClient::new(&config(&server.uri())).unwrap();
        assert_eq!(client.signin("a@b.com", "x").await, Ok(()));
    }

    #[tokio::test]
    async fn rejection_carries_body_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/signin"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
            .mount(&server)
            .await;

        let client = HttpAuthClient::new(&config(&server.uri())).unwrap();
        let err = client.signin("a@b.com", "wrong").await.unwrap_err();
        assert_eq!(err.data(), "Invalid credentials");
    }

    #[tokio::test]
    async fn empty_error_body_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HttpAuthClient::new(&config(&server.uri())).unwrap();
        let err = client.signin("a@b.com", "x").await.unwrap_err();
        assert!(err.data().starts_with("Sign in failed (500"), "{}", err.data());
    }

    #[tokio::test]
    async fn oversized_error_body_is_capped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("x".repeat(100 * 1024)))
            .mount(&server)
            .await;

        let client = HttpAuthClient::new(&config(&server.uri())).unwrap();
        let err = client.signin("a@b.com", "x").await.unwrap_err();
        assert!(err.data().ends_with("...(truncated)"));
        assert_eq!(
            err.data().len(),
            MAX_ERROR_BODY_BYTES + "...(truncated)".len()
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_rejection() {
        // Bind then drop to get a port nothing listens on.
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let client = HttpAuthClient::new(&config(&format!("http://{addr}"))).unwrap();
        let err = client.signin("a@b.com", "x").await.unwrap_err();
        assert!(
            err.data().starts_with("Unable to reach sign-in service"),
            "{}",
            err.data()
        );
    }
}
