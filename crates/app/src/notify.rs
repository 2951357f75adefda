//! User-facing notifications.
//!
//! Every failure that leaves the validator becomes exactly one
//! notification; rendering is up to the `Notifier` implementation.

use std::fmt;

use tracing::{error, info};

use common::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub description: Option<String>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    /// Error notification carrying the error's user-facing message
    pub fn from_error(err: &AppError) -> Self {
        Self::error(err.user_message())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            description: None,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NotificationLevel::Info => "info",
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.message)?;
        if let Some(description) = &self.description {
            write!(f, " ({})", description)?;
        }
        Ok(())
    }
}

/// Sink for notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => error!(target: "notify", "{}", notification),
            _ => info!(target: "notify", "{}", notification),
        }
    }
}

/// Prints notifications for a terminal user; errors go to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Error => eprintln!("{}", notification),
            _ => println!("{}", notification),
        }
    }
}
