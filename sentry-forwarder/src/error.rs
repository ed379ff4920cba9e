use sentry_core::types::ParseDsnError;
use thiserror::Error;

/// Raised when a log call could not be forwarded to Sentry.
///
/// The forwarder never propagates these; they are logged and handed back as
/// the warning of a [`ForwardOutcome`](crate::ForwardOutcome).
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The log data did not have the expected shape.
    #[error("malformed log data: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The tracking client panicked while the scope was being updated or the
    /// error was being captured.
    #[error("tracking client panicked: {0}")]
    ClientPanicked(String),
}

/// Raised when the Sentry client cannot be initialized.
#[derive(Debug, Error)]
pub enum InitError {
    /// The DSN could not be parsed.
    #[error("invalid dsn: {0}")]
    InvalidDsn(#[from] ParseDsnError),
}
