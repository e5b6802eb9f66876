//! Sign-in form coordinator.
//!
//! Mediates between the form model, the authentication client and the
//! notification sink. A rejected attempt is absorbed here: it becomes a
//! notification plus a failing `server` validator on both fields, and nothing
//! propagates to the caller.

use std::collections::BTreeSet;
use std::fmt;
use std::mem::take;

use tracing::{debug, info, warn};

use signin_providers::{AuthClient, AuthRejection, DEFAULT_REJECTION_MESSAGE};
use signin_types::{
    AttemptId, FlowPhase, FormEvent, NonEmptyString, SigninForm, ValidatorKey, display_message,
    trigger_validation,
};

use crate::NotificationSink;

/// What a single call to [`SigninCoordinator::signin`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigninOutcome {
    /// Local validation failed; the client was not called.
    Aborted,
    Authenticated,
    Rejected { message: NonEmptyString },
}

/// Credentials snapshot for one attempt that passed local validation.
///
/// Existence proves `begin_signin` cleared the server error and the form was
/// submittable at that moment.
pub struct SigninAttempt {
    id: AttemptId,
    email: String,
    password: String,
}

impl SigninAttempt {
    #[must_use]
    pub fn id(&self) -> AttemptId {
        self.id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

// Manual Debug impl to prevent leaking the password in logs.
impl fmt::Debug for SigninAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigninAttempt")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Submittable when a `server` failure is present, otherwise when the form
/// is valid.
///
/// A stale server rejection never blocks a fresh attempt. [`SigninCoordinator::signin`]
/// clears the server error before gating, so required and format failures
/// still abort a submission.
#[must_use]
pub fn can_submit(form: &SigninForm) -> bool {
    form.has_error(ValidatorKey::Server) || !form.is_invalid()
}

pub struct SigninCoordinator<A, N> {
    client: A,
    sink: N,
    form: SigninForm,
    phase: FlowPhase,
    notification_title: Option<String>,
    next_attempt: AttemptId,
    in_flight: BTreeSet<AttemptId>,
}

impl<A, N: NotificationSink> SigninCoordinator<A, N> {
    pub fn new(client: A, sink: N) -> Self {
        let mut coordinator = Self {
            client,
            sink,
            form: SigninForm::new(),
            phase: FlowPhase::Idle,
            notification_title: None,
            next_attempt: AttemptId::new(1),
            in_flight: BTreeSet::new(),
        };
        coordinator.install_validators();
        coordinator
    }

    /// Bind a form (e.g. pre-filled) and install validators against it.
    #[must_use]
    pub fn with_form(mut self, form: SigninForm) -> Self {
        self.form = form;
        self.install_validators();
        self
    }

    /// Title passed to the sink with every rejection.
    #[must_use]
    pub fn with_notification_title(mut self, title: Option<String>) -> Self {
        self.notification_title = title;
        self
    }

    /// Evaluate the validator table once against the current server error slot.
    ///
    /// The `server` validator is a static table entry on both fields, so this
    /// only brings field validity in line with coordinator state. Idempotent.
    pub fn install_validators(&mut self) {
        let current = self.form.server_error().cloned();
        self.apply(FormEvent::ServerErrorChanged(current));
    }

    #[must_use]
    pub fn form(&self) -> &SigninForm {
        &self.form
    }

    #[must_use]
    pub fn phase(&self) -> FlowPhase {
        self.phase
    }

    #[must_use]
    pub fn server_error(&self) -> Option<&str> {
        self.form.server_error().map(NonEmptyString::as_str)
    }

    #[must_use]
    pub fn client(&self) -> &A {
        &self.client
    }

    #[must_use]
    pub fn sink(&self) -> &N {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut N {
        &mut self.sink
    }

    /// Attempts started but not yet completed.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        can_submit(&self.form)
    }

    /// Apply a user event to the form.
    pub fn apply(&mut self, event: FormEvent) {
        self.form = take(&mut self.form).update(event);
    }

    /// Replace the server error and re-validate both fields immediately.
    /// Blank messages count as no error.
    pub fn set_server_error(&mut self, message: Option<&str>) {
        self.apply(FormEvent::ServerErrorChanged(NonEmptyString::from_optional(
            message,
        )));
    }

    /// Steps 1-3 of a submission: validate everything, clear the server error,
    /// gate on [`can_submit`]. Returns `None` (silently) when the gate fails.
    pub fn begin_signin(&mut self) -> Option<SigninAttempt> {
        self.phase = FlowPhase::Validating;
        self.form = trigger_validation(take(&mut self.form));
        self.set_server_error(None);

        if !self.can_submit() {
            debug!(
                failures = ?self.form.failures().collect::<Vec<_>>(),
                "Sign-in blocked by local validation"
            );
            self.settle(FlowPhase::Idle);
            return None;
        }

        let id = self.next_attempt;
        self.next_attempt = id.next();
        self.in_flight.insert(id);
        self.phase = FlowPhase::Authenticating { attempt: id };

        let credentials = self.form.credentials();
        let attempt = SigninAttempt {
            id,
            email: credentials.email().unwrap_or_default().to_string(),
            password: credentials.password().unwrap_or_default().to_string(),
        };
        info!(attempt = %id, email = attempt.email(), "Submitting sign-in");
        Some(attempt)
    }

    /// Steps 5-6: absorb the client's result for `attempt`.
    ///
    /// Completions apply in delivery order; a later-delivered rejection
    /// overwrites the server error of an earlier one.
    pub fn complete_signin(
        &mut self,
        attempt: AttemptId,
        result: Result<(), AuthRejection>,
    ) -> SigninOutcome {
        if !self.in_flight.remove(&attempt) {
            warn!(attempt = %attempt, "Completion for unknown sign-in attempt");
        }

        match result {
            Ok(()) => {
                info!(attempt = %attempt, "Sign-in succeeded");
                self.settle(FlowPhase::Idle);
                SigninOutcome::Authenticated
            }
            Err(rejection) => {
                let message = NonEmptyString::new(display_message(rejection.data()))
                    .unwrap_or_else(|_| {
                        NonEmptyString::new(DEFAULT_REJECTION_MESSAGE)
                            .expect("DEFAULT_REJECTION_MESSAGE must be non-empty")
                    });
                warn!(attempt = %attempt, "Sign-in rejected: {message}");

                self.sink
                    .show_error(self.notification_title.as_deref(), message.as_str());
                self.set_server_error(Some(message.as_str()));
                self.settle(FlowPhase::ErrorDisplayed);
                SigninOutcome::Rejected { message }
            }
        }
    }

    /// Land in `resting` unless another attempt is still outstanding.
    fn settle(&mut self, resting: FlowPhase) {
        self.phase = match self.in_flight.last() {
            Some(&attempt) => FlowPhase::Authenticating { attempt },
            None => resting,
        };
    }
}

impl<A: AuthClient, N: NotificationSink> SigninCoordinator<A, N> {
    /// Run one full submission: validate, call the client, absorb the result.
    ///
    /// Never fails; rejections become form state and a notification.
    pub async fn signin(&mut self) -> SigninOutcome {
        let Some(attempt) = self.begin_signin() else {
            return SigninOutcome::Aborted;
        };
        let result = self
            .client
            .signin(attempt.email(), attempt.password())
            .await;
        self.complete_signin(attempt.id(), result)
    }
}
