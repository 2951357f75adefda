//! Domain-level errors.
//!
//! Validation failures are detected client-side and block submission.
//! They are independent of infrastructure concerns (HTTP, database).

use std::fmt;

use thiserror::Error;

/// Form field a validation rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Email,
    Password,
    FullName,
    Gallons,
}

impl Field {
    /// Human-readable label used in messages
    pub fn label(&self) -> &'static str {
        match self {
            Field::Email => "Email",
            Field::Password => "Password",
            Field::FullName => "Name",
            Field::Gallons => "Gallons",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Typed validation failure, carrying the offending field.
///
/// The `Display` output is the message surfaced to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Value is not syntactically valid for the field
    #[error("{}", invalid_format_message(.0))]
    InvalidFormat(Field),

    /// Value is shorter than the minimum length
    #[error("{field} must be at least {min} characters")]
    TooShort { field: Field, min: usize },

    /// Value is longer than the maximum length
    #[error("{field} must be at most {max} characters")]
    TooLong { field: Field, max: usize },

    /// Value is blank after trimming
    #[error("{0} is required")]
    Empty(Field),
}

impl ValidationError {
    /// Field that failed validation
    pub fn field(&self) -> Field {
        match self {
            ValidationError::InvalidFormat(field) | ValidationError::Empty(field) => *field,
            ValidationError::TooShort { field, .. } | ValidationError::TooLong { field, .. } => {
                *field
            }
        }
    }
}

fn invalid_format_message(field: &Field) -> &'static str {
    match field {
        Field::Email => "Invalid email address",
        Field::Gallons => "Please enter a valid amount of gallons",
        Field::Password => "Invalid password",
        Field::FullName => "Invalid name",
    }
}
