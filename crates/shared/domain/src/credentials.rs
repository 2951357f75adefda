//! Credential value objects and the rules that produce them.
//!
//! Every constructor either returns a normalized value or the first rule
//! that failed. Form-level validators check fields in the order the form
//! shows them and stop at the first failure.

use std::fmt;

use validator::ValidateEmail;

use crate::constants::{MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::error::{Field, ValidationError};

/// Trimmed, syntactically valid email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    /// Validate and normalize an email address.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();

        if trimmed.chars().count() > MAX_EMAIL_LENGTH {
            return Err(ValidationError::TooLong {
                field: Field::Email,
                max: MAX_EMAIL_LENGTH,
            });
        }

        let candidate = trimmed.to_string();
        if !candidate.validate_email() {
            return Err(ValidationError::InvalidFormat(Field::Email));
        }

        Ok(Self(candidate))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Password within the accepted length range. Never trimmed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Validate a password against the length rules.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let length = raw.chars().count();

        if length < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::TooShort {
                field: Field::Password,
                min: MIN_PASSWORD_LENGTH,
            });
        }
        if length > MAX_PASSWORD_LENGTH {
            return Err(ValidationError::TooLong {
                field: Field::Password,
                max: MAX_PASSWORD_LENGTH,
            });
        }

        Ok(Self(raw.to_string()))
    }

    /// Expose the secret for the outgoing request
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Trimmed, non-blank display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    /// Validate and normalize a display name.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty(Field::FullName));
        }
        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::TooLong {
                field: Field::FullName,
                max: MAX_NAME_LENGTH,
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated sign-in form.
#[derive(Debug, Clone)]
pub struct SignInCredentials {
    pub email: Email,
    pub password: Password,
}

impl SignInCredentials {
    pub fn validate(email: &str, password: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            email: Email::parse(email)?,
            password: Password::parse(password)?,
        })
    }
}

/// Validated sign-up form.
#[derive(Debug, Clone)]
pub struct SignUpCredentials {
    pub email: Email,
    pub password: Password,
    pub full_name: FullName,
}

impl SignUpCredentials {
    pub fn validate(email: &str, password: &str, full_name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            email: Email::parse(email)?,
            password: Password::parse(password)?,
            full_name: FullName::parse(full_name)?,
        })
    }
}
