use sentry_core::protocol::{Event, Exception, Mechanism};
use sentry_core::{Breadcrumb, Level};

use crate::event::{LogError, LogLevel};

/// Key of the extra holding the message an error had before forwarding.
pub const ORIGINAL_MESSAGE_EXTRA: &str = "originalMessage";

/// Converts a [`LogLevel`] to a Sentry [`Level`].
pub fn convert_log_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Debug => Level::Debug,
        LogLevel::Info => Level::Info,
        LogLevel::Warn => Level::Warning,
        LogLevel::Error => Level::Error,
        LogLevel::Fatal => Level::Fatal,
    }
}

/// Whether a log call at this level is captured as an error.
pub fn is_capture_level(level: Level) -> bool {
    matches!(level, Level::Error | Level::Fatal)
}

/// Creates the [`Breadcrumb`] recorded for every forwarded log call.
pub fn breadcrumb_from_log(level: Level, message: &str) -> Breadcrumb {
    Breadcrumb {
        level,
        category: Some("log".into()),
        message: Some(message.to_owned()),
        ..Default::default()
    }
}

/// Creates an exception [`Event`] from a forwarded [`LogError`].
pub fn event_from_log_error(
    error: &LogError,
    level: Level,
    attach_stacktrace: bool,
) -> Event<'static> {
    let exception = Exception {
        ty: error.name.clone(),
        value: Some(error.message.clone()),
        stacktrace: if attach_stacktrace {
            current_stacktrace()
        } else {
            None
        },
        mechanism: Some(Mechanism {
            ty: "log".into(),
            handled: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let mut event = Event {
        level,
        exception: vec![exception].into(),
        ..Default::default()
    };
    if let Some(original) = &error.original_message {
        event
            .extra
            .insert(ORIGINAL_MESSAGE_EXTRA.into(), original.clone().into());
    }
    event
}

#[cfg(feature = "backtrace")]
fn current_stacktrace() -> Option<sentry_core::protocol::Stacktrace> {
    sentry_backtrace::current_stacktrace()
}

#[cfg(not(feature = "backtrace"))]
fn current_stacktrace() -> Option<sentry_core::protocol::Stacktrace> {
    None
}
