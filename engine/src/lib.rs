//! Sign-in engine - coordinator and event-loop host.
//!
//! This crate contains the form coordination logic without TUI dependencies.
//!
//! - [`SigninCoordinator`] owns the form, drives validation and absorbs
//!   authentication rejections into form state plus a notification.
//! - [`App`] hosts a coordinator inside a frame-driven UI loop, spawning
//!   authentication calls so the form stays editable while they run.

mod app;
mod coordinator;
mod notifications;

pub use app::{App, AppSettings};
pub use coordinator::{SigninAttempt, SigninCoordinator, SigninOutcome, can_submit};
pub use notifications::{MessageCenter, Notification, NotificationSink};

pub use signin_providers::{self, AuthClient, AuthRejection};
pub use signin_types::{
    self, AttemptId, Credentials, Field, FieldState, FlowPhase, FormEvent, NonEmptyString,
    SigninForm, ValidatorKey,
};
