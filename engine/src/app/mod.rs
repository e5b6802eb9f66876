//! Event-loop host for the sign-in form.
//!
//! Wraps a [`SigninCoordinator`] for a frame-driven UI. Submissions spawn the
//! authentication call on the tokio runtime and deliver the result over a
//! channel, so the form stays editable while a call is outstanding. The UI
//! drains results once per frame with [`App::process_results`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use signin_providers::{AuthClient, AuthRejection};
use signin_types::ui::UiOptions;
use signin_types::{AttemptId, Credentials, Field, FlowPhase, FormEvent, SigninForm};

use crate::{MessageCenter, Notification, SigninCoordinator, SigninOutcome};

/// Attempt id, the email it was submitted with, and the client's answer.
type AttemptResult = (AttemptId, String, Result<(), AuthRejection>);

/// Startup settings for [`App`].
#[derive(Debug, Clone, Default)]
pub struct AppSettings {
    pub prefill_email: Option<String>,
    pub notification_title: Option<String>,
    pub ui_options: UiOptions,
}

pub struct App<A> {
    coordinator: SigninCoordinator<Arc<A>, MessageCenter>,
    focus: Field,
    results_tx: mpsc::UnboundedSender<AttemptResult>,
    results_rx: mpsc::UnboundedReceiver<AttemptResult>,
    tasks: Vec<JoinHandle<()>>,
    last_outcome: Option<SigninOutcome>,
    signed_in: Option<String>,
    should_quit: bool,
    ui_options: UiOptions,
}

impl<A: AuthClient + 'static> App<A> {
    pub fn new(client: A, settings: AppSettings) -> Self {
        let focus = if settings.prefill_email.is_some() {
            Field::Password
        } else {
            Field::Email
        };
        let form = SigninForm::from_credentials(Credentials::new(settings.prefill_email, None));
        let coordinator = SigninCoordinator::new(Arc::new(client), MessageCenter::new())
            .with_form(form)
            .with_notification_title(settings.notification_title);
        let (results_tx, results_rx) = mpsc::unbounded_channel();

        Self {
            coordinator,
            focus,
            results_tx,
            results_rx,
            tasks: Vec::new(),
            last_outcome: None,
            signed_in: None,
            should_quit: false,
            ui_options: settings.ui_options,
        }
    }

    #[must_use]
    pub fn form(&self) -> &SigninForm {
        self.coordinator.form()
    }

    #[must_use]
    pub fn phase(&self) -> FlowPhase {
        self.coordinator.phase()
    }

    #[must_use]
    pub fn can_submit(&self) -> bool {
        self.coordinator.can_submit()
    }

    #[must_use]
    pub fn focus(&self) -> Field {
        self.focus
    }

    #[must_use]
    pub fn notification(&self) -> Option<&Notification> {
        self.coordinator.sink().visible()
    }

    #[must_use]
    pub fn last_outcome(&self) -> Option<&SigninOutcome> {
        self.last_outcome.as_ref()
    }

    /// Email of the account that signed in, once authentication succeeded.
    #[must_use]
    pub fn signed_in(&self) -> Option<&str> {
        self.signed_in.as_deref()
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[must_use]
    pub fn ui_options(&self) -> UiOptions {
        self.ui_options
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.coordinator.in_flight()
    }

    pub fn request_quit(&mut self) {
        self.should_quit = true;
    }

    /// Move focus to `field`, marking the field being left as touched.
    pub fn set_focus(&mut self, field: Field) {
        if field != self.focus {
            self.coordinator.apply(FormEvent::Blur(self.focus));
            self.focus = field;
        }
    }

    pub fn focus_next(&mut self) {
        self.set_focus(self.focus.next());
    }

    pub fn focus_prev(&mut self) {
        self.set_focus(self.focus.prev());
    }

    pub fn insert_char(&mut self, c: char) {
        let mut value = self.focused_value();
        value.push(c);
        self.set_focused_value(value);
    }

    pub fn backspace(&mut self) {
        let mut value = self.focused_value();
        if value.pop().is_some() {
            self.set_focused_value(value);
        }
    }

    pub fn clear_field(&mut self) {
        self.set_focused_value(String::new());
    }

    /// Start a submission. Returns the attempt id when the form passed local
    /// validation and the call was spawned.
    pub fn submit(&mut self) -> Option<AttemptId> {
        self.coordinator.sink_mut().dismiss();
        let Some(attempt) = self.coordinator.begin_signin() else {
            self.last_outcome = Some(SigninOutcome::Aborted);
            return None;
        };
        let id = attempt.id();
        let client = Arc::clone(self.coordinator.client());
        let tx = self.results_tx.clone();

        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(tokio::spawn(async move {
            let result = client.signin(attempt.email(), attempt.password()).await;
            // Receiver gone means the app shut down; nothing to report to.
            let _ = tx.send((attempt.id(), attempt.email().to_string(), result));
        }));
        debug!(attempt = %id, "Spawned sign-in call");
        Some(id)
    }

    /// Drain finished attempts into the coordinator. Returns how many were applied.
    pub fn process_results(&mut self) -> usize {
        let mut applied = 0;
        while let Ok((attempt, email, result)) = self.results_rx.try_recv() {
            let outcome = self.coordinator.complete_signin(attempt, result);
            if outcome == SigninOutcome::Authenticated {
                // The form may have been edited while the call was out.
                self.signed_in = Some(email);
                self.should_quit = true;
            }
            self.last_outcome = Some(outcome);
            applied += 1;
        }
        applied
    }

    /// Abort outstanding calls.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    fn focused_value(&self) -> String {
        self.coordinator
            .form()
            .credentials()
            .value(self.focus)
            .unwrap_or_default()
            .to_string()
    }

    fn set_focused_value(&mut self, value: String) {
        let event = match self.focus {
            Field::Email => FormEvent::EmailChanged(value),
            Field::Password => FormEvent::PasswordChanged(value),
        };
        self.coordinator.apply(event);
    }
}

impl<A> Drop for App<A> {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}
