//! Unified error handling.
//!
//! Provides a single error type for every fallible operation, with a stable
//! code and a user-facing message suitable for a notification.

use domain::ValidationError;
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Client-side validation (never reaches the network)
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // Identity service outcomes
    #[error("Account already registered")]
    DuplicateAccount,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Identity service error: {0}")]
    Service(String),

    /// Transport or decoding failure; the detail is not for end users
    #[error("Identity service unavailable: {0}")]
    Unavailable(String),

    // Profile store
    #[error("Profile store error: {0}")]
    Persistence(String),

    // Wallet / ledger
    #[error("Wallet not connected")]
    WalletRequired,

    #[error("Operation cancelled")]
    Cancelled,
}

impl AppError {
    /// Get error code for logs and callers
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::DuplicateAccount => "DUPLICATE_ACCOUNT",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::Service(_) => "SERVICE_ERROR",
            AppError::Unavailable(_) => "SERVICE_UNAVAILABLE",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::WalletRequired => "WALLET_REQUIRED",
            AppError::Cancelled => "CANCELLED",
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(err) => err.to_string(),
            AppError::DuplicateAccount => {
                "This email is already registered. Please sign in instead.".to_string()
            }
            AppError::InvalidCredentials => {
                "Invalid email or password. Please try again.".to_string()
            }
            AppError::Unauthenticated => "Please sign in to continue.".to_string(),
            // The identity service's own message is meant for end users
            AppError::Service(msg) if !msg.is_empty() => msg.clone(),
            AppError::Service(_) => "An error occurred. Please try again.".to_string(),
            AppError::Unavailable(msg) => {
                tracing::warn!("Identity service unavailable: {}", msg);
                "An error occurred. Please try again.".to_string()
            }
            AppError::Persistence(msg) => {
                tracing::error!("Profile store error: {}", msg);
                "Failed to save profile information".to_string()
            }
            AppError::WalletRequired => "Please connect your wallet first".to_string(),
            AppError::Cancelled => "The operation was cancelled".to_string(),
        }
    }
}

// =============================================================================
// External Error Conversion
// =============================================================================

#[cfg(feature = "database")]
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::Persistence(err.to_string())
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::debug!("Identity transport error: {:?}", err);
        AppError::Unavailable(err.to_string())
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_unauthenticated(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_unauthenticated(self) -> AppResult<T> {
        self.ok_or(AppError::Unauthenticated)
    }
}

/// Convenience constructors
impl AppError {
    pub fn service(msg: impl Into<String>) -> Self {
        AppError::Service(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        AppError::Unavailable(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        AppError::Persistence(msg.into())
    }
}
