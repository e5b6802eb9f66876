//! Sign-in form model with a unidirectional update function.
//!
//! The view never mutates the form directly. Every change is a [`FormEvent`]
//! fed through [`SigninForm::update`], which returns the next state with all
//! affected validators re-evaluated from the static table.

use std::collections::BTreeSet;
use std::fmt;

use crate::NonEmptyString;
use crate::validation::{Field, FieldInput, ValidatorKey, validators};

/// User-entered credentials. `None` means the field was never filled in.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    email: Option<String>,
    password: Option<String>,
}

impl Credentials {
    #[must_use]
    pub fn new(email: Option<String>, password: Option<String>) -> Self {
        Self { email, password }
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    #[must_use]
    pub fn value(&self, field: Field) -> Option<&str> {
        match field {
            Field::Email => self.email(),
            Field::Password => self.password(),
        }
    }
}

// Manual Debug impl to prevent leaking the password in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_some() {
            "[REDACTED]"
        } else {
            "None"
        };
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &password)
            .finish()
    }
}

/// Validation state for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldState {
    errors: BTreeSet<ValidatorKey>,
    touched: bool,
}

impl FieldState {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }

    #[must_use]
    pub fn has_error(&self, key: ValidatorKey) -> bool {
        self.errors.contains(&key)
    }

    /// Failing validators in table order.
    pub fn errors(&self) -> impl Iterator<Item = ValidatorKey> + '_ {
        self.errors.iter().copied()
    }

    /// Whether the user has left the field or a submit forced validation.
    /// Views only surface errors for touched fields.
    #[must_use]
    pub fn touched(&self) -> bool {
        self.touched
    }
}

/// Discrete inputs to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    EmailChanged(String),
    PasswordChanged(String),
    /// Focus left the field.
    Blur(Field),
    /// Touch and re-validate every field regardless of prior interaction.
    TriggerValidation,
    /// Replace the server error slot and re-validate both fields.
    ServerErrorChanged(Option<NonEmptyString>),
    /// Clear input and validation state, keeping nothing.
    Reset,
}

/// The form model: credentials, per-field validation and the server error slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigninForm {
    credentials: Credentials,
    email: FieldState,
    password: FieldState,
    server_error: Option<NonEmptyString>,
}

impl Default for SigninForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SigninForm {
    /// Empty form with validators already evaluated.
    #[must_use]
    pub fn new() -> Self {
        Self::from_credentials(Credentials::default())
    }

    /// Form pre-filled with `credentials`, validators evaluated, nothing touched.
    #[must_use]
    pub fn from_credentials(credentials: Credentials) -> Self {
        let mut form = Self {
            credentials,
            email: FieldState::default(),
            password: FieldState::default(),
            server_error: None,
        };
        form.validate_all();
        form
    }

    /// Apply one event and return the resulting state.
    #[must_use]
    pub fn update(mut self, event: FormEvent) -> Self {
        match event {
            FormEvent::EmailChanged(value) => {
                self.credentials.email = Some(value);
                self.validate(Field::Email);
            }
            FormEvent::PasswordChanged(value) => {
                self.credentials.password = Some(value);
                self.validate(Field::Password);
            }
            FormEvent::Blur(field) => {
                self.field_mut(field).touched = true;
            }
            FormEvent::TriggerValidation => {
                for field in Field::ALL {
                    self.field_mut(field).touched = true;
                }
                self.validate_all();
            }
            FormEvent::ServerErrorChanged(error) => {
                self.server_error = error;
                self.validate_all();
            }
            FormEvent::Reset => return Self::new(),
        }
        self
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn field(&self, field: Field) -> &FieldState {
        match field {
            Field::Email => &self.email,
            Field::Password => &self.password,
        }
    }

    #[must_use]
    pub fn server_error(&self) -> Option<&NonEmptyString> {
        self.server_error.as_ref()
    }

    /// Aggregate invalid flag: any validator failing on any field.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        Field::ALL.iter().any(|f| self.field(*f).is_invalid())
    }

    /// Aggregate error lookup: does `key` fail on at least one field.
    #[must_use]
    pub fn has_error(&self, key: ValidatorKey) -> bool {
        Field::ALL.iter().any(|f| self.field(*f).has_error(key))
    }

    /// Fields currently failing `key`, in focus order.
    #[must_use]
    pub fn fields_failing(&self, key: ValidatorKey) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.field(*f).has_error(key))
            .collect()
    }

    /// Every `(field, validator)` pair currently failing.
    pub fn failures(&self) -> impl Iterator<Item = (Field, ValidatorKey)> + '_ {
        Field::ALL
            .into_iter()
            .flat_map(move |f| self.field(f).errors().map(move |key| (f, key)))
    }

    fn field_mut(&mut self, field: Field) -> &mut FieldState {
        match field {
            Field::Email => &mut self.email,
            Field::Password => &mut self.password,
        }
    }

    fn validate_all(&mut self) {
        for field in Field::ALL {
            self.validate(field);
        }
    }

    fn validate(&mut self, field: Field) {
        let input = FieldInput {
            value: self.credentials.value(field),
            server_error: self.server_error.as_ref(),
        };
        let errors: BTreeSet<ValidatorKey> = validators(field)
            .iter()
            .filter(|validator| !validator.is_valid(&input))
            .map(|validator| validator.key())
            .collect();
        self.field_mut(field).errors = errors;
    }
}

/// Force re-validation of every field regardless of touched state.
#[must_use]
pub fn trigger_validation(form: SigninForm) -> SigninForm {
    form.update(FormEvent::TriggerValidation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(email: &str, password: &str) -> SigninForm {
        SigninForm::new()
            .update(FormEvent::EmailChanged(email.to_string()))
            .update(FormEvent::PasswordChanged(password.to_string()))
    }

    fn server(msg: &str) -> FormEvent {
        FormEvent::ServerErrorChanged(Some(NonEmptyString::new(msg).unwrap()))
    }

    #[test]
    fn new_form_is_invalid_but_untouched() {
        let form = SigninForm::new();
        assert!(form.is_invalid());
        assert_eq!(
            form.fields_failing(ValidatorKey::Required),
            [Field::Email, Field::Password]
        );
        assert!(!form.field(Field::Email).touched());
        assert!(!form.field(Field::Password).touched());
    }

    #[test]
    fn editing_revalidates_only_that_field() {
        let form = SigninForm::new().update(FormEvent::EmailChanged("a@b.com".into()));
        assert!(form.field(Field::Email).is_valid());
        assert!(form.field(Field::Password).has_error(ValidatorKey::Required));
    }

    #[test]
    fn blur_marks_touched_without_changing_errors() {
        let before = SigninForm::new();
        let after = before.clone().update(FormEvent::Blur(Field::Email));
        assert!(after.field(Field::Email).touched());
        assert_eq!(
            after.field(Field::Email).errors().collect::<Vec<_>>(),
            before.field(Field::Email).errors().collect::<Vec<_>>()
        );
    }

    #[test]
    fn trigger_validation_touches_every_field() {
        let form = trigger_validation(SigninForm::new());
        for field in Field::ALL {
            assert!(form.field(field).touched());
            assert!(form.field(field).has_error(ValidatorKey::Required));
        }
    }

    #[test]
    fn server_error_fails_both_fields() {
        let form = filled("a@b.com", "wrong").update(server("Invalid credentials"));
        assert_eq!(
            form.fields_failing(ValidatorKey::Server),
            [Field::Email, Field::Password]
        );
        assert_eq!(
            form.server_error().map(NonEmptyString::as_str),
            Some("Invalid credentials")
        );
    }

    #[test]
    fn clearing_server_error_restores_validity() {
        let form = filled("a@b.com", "wrong")
            .update(server("Invalid credentials"))
            .update(FormEvent::ServerErrorChanged(None));
        assert!(!form.has_error(ValidatorKey::Server));
        assert!(!form.is_invalid());
    }

    #[test]
    fn server_error_persists_across_edits() {
        let form = filled("a@b.com", "wrong")
            .update(server("Invalid credentials"))
            .update(FormEvent::PasswordChanged("right".into()));
        assert!(form.field(Field::Password).has_error(ValidatorKey::Server));
    }

    #[test]
    fn failures_lists_field_validator_pairs() {
        let form = filled("nope", "").update(server("x"));
        let failures: Vec<_> = form.failures().collect();
        assert_eq!(
            failures,
            [
                (Field::Email, ValidatorKey::Email),
                (Field::Email, ValidatorKey::Server),
                (Field::Password, ValidatorKey::Required),
                (Field::Password, ValidatorKey::Server),
            ]
        );
    }

    #[test]
    fn reset_returns_pristine_form() {
        let form = filled("a@b.com", "pw")
            .update(server("x"))
            .update(FormEvent::Reset);
        assert_eq!(form, SigninForm::new());
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials::new(Some("a@b.com".into()), Some("hunter2".into()));
        let debug = format!("{creds:?}");
        assert!(debug.contains("a@b.com"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
