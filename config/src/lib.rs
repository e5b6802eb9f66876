//! Configuration loading for the sign-in client.
//!
//! Reads `~/.signin/config.toml`. Every section and key is optional; a missing
//! file means defaults. String values that name endpoints support `${VAR}`
//! expansion, and `SIGNIN_BASE_URL` / `SIGNIN_EMAIL` override the file.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use signin_types::ui::UiOptions;

pub const DEFAULT_SIGNIN_PATH: &str = "/api/v1/signin";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

const BASE_URL_ENV: &str = "SIGNIN_BASE_URL";
const EMAIL_ENV: &str = "SIGNIN_EMAIL";

#[derive(Debug, Default, Deserialize)]
pub struct SigninConfig {
    pub auth: Option<AuthConfig>,
    pub app: Option<AppConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthConfig {
    /// Origin of the console, e.g. `https://console.example.com`.
    pub base_url: Option<String>,
    /// Path of the sign-in endpoint. Default: `/api/v1/signin`.
    pub signin_path: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    /// Permit plain `http://` endpoints (local development).
    #[serde(default)]
    pub allow_http: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Email to pre-fill in the form.
    pub email: Option<String>,
    /// Use ASCII-only glyphs.
    #[serde(default)]
    pub ascii_only: bool,
    /// Enable a high-contrast color palette.
    #[serde(default)]
    pub high_contrast: bool,
    /// Title passed along with rejection notifications.
    pub notification_title: Option<String>,
}

/// Replace every `${VAR}` with the variable's value (empty when unset).
///
/// Unterminated `${` and empty `${}` are kept literally.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(0) => {
                out.push_str("${}");
                rest = &after[1..];
            }
            Some(end) => {
                out.push_str(&env::var(&after[..end]).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

impl SigninConfig {
    /// Load the user config. `Ok(None)` when there is no home dir or no file.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {:?}: {}", path, source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map_err(|source| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, source);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    /// Base URL after env override and `${VAR}` expansion, trailing `/` removed.
    #[must_use]
    pub fn base_url(&self) -> Option<String> {
        self.base_url_with(env::var(BASE_URL_ENV).ok())
    }

    fn base_url_with(&self, env_override: Option<String>) -> Option<String> {
        let raw = env_override
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.auth.as_ref().and_then(|a| a.base_url.clone()))?;
        let expanded = expand_env_vars(raw.trim());
        let trimmed = expanded.trim_end_matches('/');
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Endpoint path, always starting with `/`.
    #[must_use]
    pub fn signin_path(&self) -> String {
        let raw = self
            .auth
            .as_ref()
            .and_then(|a| a.signin_path.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_SIGNIN_PATH);
        if raw.starts_with('/') {
            raw.to_string()
        } else {
            format!("/{raw}")
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        let secs = self
            .auth
            .as_ref()
            .and_then(|a| a.connect_timeout_secs)
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    #[must_use]
    pub fn allow_http(&self) -> bool {
        self.auth.as_ref().is_some_and(|a| a.allow_http)
    }

    /// Email to pre-fill: `SIGNIN_EMAIL`, then `[app] email`.
    #[must_use]
    pub fn prefill_email(&self) -> Option<String> {
        self.prefill_email_with(env::var(EMAIL_ENV).ok())
    }

    fn prefill_email_with(&self, env_override: Option<String>) -> Option<String> {
        env_override
            .or_else(|| self.app.as_ref().and_then(|a| a.email.clone()))
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty())
    }

    #[must_use]
    pub fn notification_title(&self) -> Option<&str> {
        self.app
            .as_ref()
            .and_then(|a| a.notification_title.as_deref())
            .filter(|t| !t.trim().is_empty())
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.app
            .as_ref()
            .map(|app| UiOptions {
                ascii_only: app.ascii_only,
                high_contrast: app.high_contrast,
            })
            .unwrap_or_default()
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".signin").join("config.toml"))
}
