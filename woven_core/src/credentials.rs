use crate::form::{FormValues, Rule, Schema};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::LazyLock;

/// Minimum number of characters in a password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Something, an `@`, and a dotted domain, with no whitespace anywhere.
static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// What the user types into the sign-in form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Email to log in with.
    pub email: String,

    /// Password to log in with. Only revealed when serialized for the request.
    #[serde(serialize_with = "reveal", deserialize_with = "conceal")]
    pub password: SecretString,
}

impl Credentials {
    /// Credentials from plain values
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl PartialEq for Credentials {
    fn eq(&self, other: &Self) -> bool {
        self.email == other.email && self.password.expose_secret() == other.password.expose_secret()
    }
}

impl Eq for Credentials {}

fn reveal<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn conceal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Fields in the sign-in form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub enum Field {
    /// The email input
    Email,

    /// The (masked) password input
    Password,
}

impl Field {
    /// A label for the field, suitable for display.
    pub fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Password => "Password",
        }
    }
}

impl FormValues for Credentials {
    type Field = Field;

    fn value(&self, field: Field) -> &str {
        match field {
            Field::Email => &self.email,
            Field::Password => self.password.expose_secret(),
        }
    }

    fn set_value(&mut self, field: Field, value: String) {
        match field {
            Field::Email => self.email = value,
            Field::Password => self.password = SecretString::from(value),
        }
    }

    fn fields() -> &'static [Field] {
        &[Field::Email, Field::Password]
    }
}

/// Basic email address grammar.
pub fn valid_email(email: &str) -> bool {
    EMAIL.as_ref().is_some_and(|regex| regex.is_match(email))
}

/// Password length counts characters, not bytes.
pub fn valid_password_length(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

/// The rules for the sign-in form. Emptiness is checked first so an empty
/// field reports that it is required rather than malformed.
pub fn login_schema() -> Schema<Field> {
    Schema::new(vec![
        Rule {
            field: Field::Email,
            test: |value| !value.is_empty(),
            message: "Email is required",
        },
        Rule {
            field: Field::Email,
            test: valid_email,
            message: "Invalid email address",
        },
        Rule {
            field: Field::Password,
            test: |value| !value.is_empty(),
            message: "Password is required",
        },
        Rule {
            field: Field::Password,
            test: valid_password_length,
            message: "Password must be at least 8 characters",
        },
    ])
}
