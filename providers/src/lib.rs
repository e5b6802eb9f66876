//! Authentication clients for the sign-in form.
//!
//! # Architecture
//!
//! The coordinator only sees the [`AuthClient`] trait. [`HttpAuthClient`] is the
//! production implementation: it posts the credentials as JSON to the console's
//! sign-in endpoint.
//!
//! # Error Handling
//!
//! Every failure, whether the server said no or the request never reached it,
//! arrives as one [`AuthRejection`] carrying a user-displayable message. Callers
//! do not (and cannot) distinguish network failure from credential failure.

mod errors;
mod http;

pub use errors::extract_rejection_message;
pub use http::{ClientBuildError, HttpAuthClient, HttpAuthConfig};

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use signin_types::NonEmptyString;

/// Message used when a rejection carries no usable text.
pub const DEFAULT_REJECTION_MESSAGE: &str = "Sign in failed";

/// The single failure shape of an authentication call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{data}")]
pub struct AuthRejection {
    data: NonEmptyString,
}

impl AuthRejection {
    /// Blank messages fall back to [`DEFAULT_REJECTION_MESSAGE`].
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        let data = NonEmptyString::new(message).unwrap_or_else(|_| {
            NonEmptyString::new(DEFAULT_REJECTION_MESSAGE)
                .expect("DEFAULT_REJECTION_MESSAGE must be non-empty")
        });
        Self { data }
    }

    /// The user-displayable error payload.
    #[must_use]
    pub fn data(&self) -> &str {
        self.data.as_str()
    }

    #[must_use]
    pub fn into_data(self) -> NonEmptyString {
        self.data
    }
}

/// Performs the credential exchange.
///
/// Resolves `Ok(())` on success. Implementations own their own transport
/// concerns (connection reuse, timeouts); callers impose none.
pub trait AuthClient: Send + Sync {
    fn signin(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), AuthRejection>> + Send;
}

impl<T: AuthClient> AuthClient for Arc<T> {
    fn signin(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), AuthRejection>> + Send {
        (**self).signin(email, password)
    }
}
