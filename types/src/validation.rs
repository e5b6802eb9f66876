//! Static validator table for the sign-in form.
//!
//! Each field owns an ordered list of named predicates. The table is fixed at
//! compile time; the `server` entry reads the form-owned server error slot
//! through [`FieldInput`], so no validator is ever attached at runtime.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::NonEmptyString;

/// Maximum total length of an email address.
const MAX_EMAIL_CHARS: usize = 254;
/// Maximum length of the part before `@`.
const MAX_LOCAL_PART_CHARS: usize = 64;

/// Form fields, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Email,
    Password,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Email, Field::Password];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Password => "password",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Field::Email => "Email",
            Field::Password => "Password",
        }
    }

    /// Next field in focus order, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Field::Email => Field::Password,
            Field::Password => Field::Email,
        }
    }

    /// Previous field in focus order, wrapping around.
    #[must_use]
    pub const fn prev(self) -> Self {
        // Two fields: previous and next coincide.
        self.next()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validator names. Ordering follows evaluation order in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValidatorKey {
    Required,
    Email,
    Server,
}

impl ValidatorKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ValidatorKey::Required => "required",
            ValidatorKey::Email => "email",
            ValidatorKey::Server => "server",
        }
    }
}

impl fmt::Display for ValidatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a predicate may look at when validating one field.
#[derive(Debug, Clone, Copy)]
pub struct FieldInput<'a> {
    pub value: Option<&'a str>,
    pub server_error: Option<&'a NonEmptyString>,
}

pub type Predicate = fn(&FieldInput<'_>) -> bool;

/// A named predicate. `is_valid` returning `false` marks the field as failing `key`.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    key: ValidatorKey,
    predicate: Predicate,
}

impl Validator {
    #[must_use]
    pub const fn new(key: ValidatorKey, predicate: Predicate) -> Self {
        Self { key, predicate }
    }

    #[must_use]
    pub const fn key(&self) -> ValidatorKey {
        self.key
    }

    #[must_use]
    pub fn is_valid(&self, input: &FieldInput<'_>) -> bool {
        (self.predicate)(input)
    }
}

const EMAIL_VALIDATORS: [Validator; 3] = [
    Validator::new(ValidatorKey::Required, required),
    Validator::new(ValidatorKey::Email, email_format),
    Validator::new(ValidatorKey::Server, server),
];

const PASSWORD_VALIDATORS: [Validator; 2] = [
    Validator::new(ValidatorKey::Required, required),
    Validator::new(ValidatorKey::Server, server),
];

/// Ordered validators for `field`.
#[must_use]
pub fn validators(field: Field) -> &'static [Validator] {
    match field {
        Field::Email => &EMAIL_VALIDATORS,
        Field::Password => &PASSWORD_VALIDATORS,
    }
}

fn required(input: &FieldInput<'_>) -> bool {
    input.value.is_some_and(|value| !value.is_empty())
}

/// Empty values pass; `required` owns that failure.
fn email_format(input: &FieldInput<'_>) -> bool {
    match input.value {
        None | Some("") => true,
        Some(value) => is_email(value),
    }
}

fn server(input: &FieldInput<'_>) -> bool {
    input.server_error.is_none()
}

static EMAIL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn email_pattern() -> &'static Regex {
    EMAIL_PATTERN.get_or_init(|| {
        Regex::new(
            r"^[-!#$%&'*+/0-9=?A-Z^_`a-z{|}~]+(\.[-!#$%&'*+/0-9=?A-Z^_`a-z{|}~]+)*@[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
        )
        .expect("valid email regex")
    })
}

fn is_email(value: &str) -> bool {
    let Some((local, _)) = value.split_once('@') else {
        return false;
    };
    value.len() <= MAX_EMAIL_CHARS
        && local.len() <= MAX_LOCAL_PART_CHARS
        && email_pattern().is_match(value)
}
