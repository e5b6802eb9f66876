//! Line-oriented sign-in for scripts and non-interactive terminals.
//!
//! Reads the email (unless already known) and the password as lines, runs a
//! single submission and reports through a writer-backed notification sink.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use signin_engine::signin_types::display_message;
use signin_engine::{
    AuthClient, Credentials, Field, NotificationSink, SigninCoordinator, SigninForm,
    SigninOutcome, ValidatorKey,
};

/// Writes every notification as one line.
pub struct WriterSink<W> {
    out: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn line(&mut self, text: &str) {
        // Nowhere left to report a broken stderr.
        let _ = writeln!(self.out, "{text}");
    }
}

impl<W: Write> NotificationSink for WriterSink<W> {
    fn show_error(&mut self, title: Option<&str>, message: &str) {
        let message = display_message(message);
        if message.is_empty() {
            return;
        }
        let title = title.unwrap_or("error");
        self.line(&format!("{title}: {message}"));
    }
}

/// Input and output wiring for [`run`].
pub struct PlainIo<R, O, E> {
    pub input: R,
    pub out: O,
    pub err: E,
}

pub async fn run<A, R, O, E>(
    client: A,
    email: Option<String>,
    notification_title: Option<String>,
    io: PlainIo<R, O, E>,
) -> Result<SigninOutcome>
where
    A: AuthClient,
    R: BufRead,
    O: Write,
    E: Write,
{
    let PlainIo {
        mut input,
        mut out,
        err,
    } = io;

    let email = match email {
        Some(email) => Some(email),
        None => read_line(&mut input).context("failed to read email")?,
    };
    let password = read_line(&mut input).context("failed to read password")?;

    let form = SigninForm::from_credentials(Credentials::new(email, password));
    let mut coordinator = SigninCoordinator::new(client, WriterSink::new(err))
        .with_form(form)
        .with_notification_title(notification_title);

    let outcome = coordinator.signin().await;
    match &outcome {
        SigninOutcome::Authenticated => {
            let email = coordinator.form().credentials().email().unwrap_or_default();
            writeln!(out, "Signed in as {email}")?;
        }
        SigninOutcome::Aborted => {
            let failures: Vec<(Field, ValidatorKey)> = coordinator
                .form()
                .failures()
                .filter(|(_, key)| *key != ValidatorKey::Server)
                .collect();
            for (field, key) in failures {
                coordinator.sink_mut().line(&describe_failure(field, key));
            }
        }
        // Already reported through the sink.
        SigninOutcome::Rejected { .. } => {}
    }
    Ok(outcome)
}

fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']);
    Ok(Some(trimmed.to_string()))
}

fn describe_failure(field: Field, key: ValidatorKey) -> String {
    match key {
        ValidatorKey::Required => format!("{} is required", field.label()),
        ValidatorKey::Email => format!("{} is not a valid email address", field.label()),
        ValidatorKey::Server => format!("{} was rejected", field.label()),
    }
}
