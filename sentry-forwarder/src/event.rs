use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Message used for errors synthesized when a capturing log call carries none.
pub const MISSING_ERROR_MESSAGE: &str = "Missing error object!";

/// An error used when parsing a [`LogLevel`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown log level `{0}`")]
pub struct ParseLogLevelError(pub String);

/// The severity of a forwarded log call, as named by the host application.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    /// Verbose diagnostics.
    Debug,
    /// Informational messages.
    Info,
    /// A warning. Sentry calls this level `warning`.
    Warn,
    /// An error.
    Error,
    /// An error that usually ends the process.
    Fatal,
}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(string: &str) -> Result<LogLevel, Self::Err> {
        Ok(match string {
            "debug" => LogLevel::Debug,
            "info" => LogLevel::Info,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            "fatal" => LogLevel::Fatal,
            other => return Err(ParseLogLevelError(other.to_owned())),
        })
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        })
    }
}

impl Serialize for LogLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Which leg of a request a log call belongs to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// A request received by this service.
    Inbound,
    /// A request this service makes to another one.
    ///
    /// Failures on this leg are expected to be reported by the inbound leg
    /// as well, so they are never captured.
    Outbound,
}

/// Request correlation data attached to every forwarded log call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogContext {
    /// The client that called into this service.
    pub calling_client: String,
    /// The id correlating all log calls of one request chain.
    pub correlation_id: String,
}

impl LogContext {
    /// Creates a new context.
    pub fn new(calling_client: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        LogContext {
            calling_client: calling_client.into(),
            correlation_id: correlation_id.into(),
        }
    }
}

fn default_error_name() -> String {
    "Error".into()
}

/// The error object carried by a log call.
///
/// Fields beyond `name`, `message` and `originalMessage` are kept in
/// [`extra`](Self::extra) so they survive being attached to the scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogError {
    /// The exception type reported to Sentry.
    #[serde(default = "default_error_name")]
    pub name: String,
    /// The error message.
    pub message: String,
    /// The message the error had before it was forwarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_message: Option<String>,
    /// Any additional fields of the error.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogError {
    /// Creates an error with the default `Error` name.
    pub fn new(message: impl Into<String>) -> Self {
        LogError {
            name: default_error_name(),
            message: message.into(),
            original_message: None,
            extra: Map::new(),
        }
    }

    /// The placeholder captured when a log call has no error object.
    pub fn missing() -> Self {
        LogError::new(MISSING_ERROR_MESSAGE)
    }

    /// Creates an error from a Rust error, keeping its source as `source`.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let mut error = LogError::new(err.to_string());
        if let Some(source) = err.source() {
            error.extra.insert("source".into(), source.to_string().into());
        }
        error
    }

    /// Sets the exception type.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds an extra field.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Replaces the message, keeping the previous one as `original_message`.
    pub fn rewrite_message(&mut self, message: &str) {
        let original = std::mem::replace(&mut self.message, message.to_owned());
        self.original_message = Some(original);
    }

    /// Serializes the error the way it is attached to the scope.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::String(self.message.clone()))
    }
}

/// One log call of the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogData {
    /// The severity of the call.
    pub level: LogLevel,
    /// The request leg, if the call belongs to one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    /// Correlation data, set as tags on every call.
    pub context: LogContext,
    /// The error to capture for `error` and `fatal` calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<LogError>,
}

impl LogData {
    /// Creates log data without direction or error.
    pub fn new(level: LogLevel, context: LogContext) -> Self {
        LogData {
            level,
            direction: None,
            context,
            error: None,
        }
    }

    /// Sets the request leg.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Sets the error object.
    pub fn with_error(mut self, error: LogError) -> Self {
        self.error = Some(error);
        self
    }

    /// Whether this call may be captured, which is never the case for
    /// outbound calls.
    pub fn captures_errors(&self) -> bool {
        self.direction != Some(Direction::Outbound)
    }
}
