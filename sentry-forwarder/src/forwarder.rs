use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use sentry_core::protocol::Value;
use sentry_core::types::Uuid;
use serde::Deserialize;

use crate::client::{CurrentHub, TrackingClient};
use crate::converters::{breadcrumb_from_log, convert_log_level, is_capture_level};
use crate::error::ForwardError;
use crate::event::{LogData, LogError};

/// Tag holding the client that called into this service.
pub const CALLING_CLIENT_TAG: &str = "callingClient";
/// Tag holding the correlation id of the request chain.
pub const CORRELATION_ID_TAG: &str = "correlationId";
/// Key of the scope extra holding the captured error object.
pub const ERROR_EXTRA: &str = "error";

/// The result of a guarded [`LogForwarder::forward`] call.
#[derive(Debug, Default)]
pub struct ForwardOutcome {
    /// The id of the captured event, if the call was captured and the client
    /// accepted the event.
    pub event_id: Option<Uuid>,
    /// The failure that was swallowed, if forwarding failed.
    pub warning: Option<ForwardError>,
}

impl ForwardOutcome {
    /// Whether the call was captured as an error event.
    pub fn is_captured(&self) -> bool {
        self.event_id.is_some()
    }

    /// Whether forwarding failed.
    pub fn is_failed(&self) -> bool {
        self.warning.is_some()
    }
}

/// Translates log calls into scope updates and error captures.
///
/// Every call tags the scope with the calling client and the correlation id
/// and leaves a breadcrumb.  `error` and `fatal` calls are additionally
/// captured, unless they belong to an outbound request: those are reported
/// by the service on the inbound end, and capturing them here would alert
/// twice.
///
/// # Examples
///
/// ```
/// use sentry_forwarder::{LogContext, LogData, LogError, LogForwarder, LogLevel};
///
/// let forwarder = LogForwarder::current();
/// let data = LogData::new(LogLevel::Error, LogContext::new("svc-a", "abc-1"))
///     .with_error(LogError::new("DB timeout"));
///
/// let outcome = forwarder.forward("Payment failed", data);
/// assert!(!outcome.is_failed());
/// ```
#[derive(Clone, Debug, Default)]
pub struct LogForwarder<C = CurrentHub> {
    client: C,
}

impl LogForwarder<CurrentHub> {
    /// Creates a forwarder writing to the hub active on the calling thread.
    pub fn current() -> Self {
        LogForwarder { client: CurrentHub }
    }
}

impl<C: TrackingClient> LogForwarder<C> {
    /// Creates a forwarder writing to the given client.
    pub fn new(client: C) -> Self {
        LogForwarder { client }
    }

    /// Returns the client this forwarder writes to.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Forwards a log call, swallowing any failure.
    ///
    /// This never panics.  A failure is logged and returned as the warning of
    /// the outcome.
    pub fn forward(&self, message: &str, log_data: LogData) -> ForwardOutcome {
        self.guarded(message, || Ok(self.try_forward(message, log_data)))
    }

    /// Forwards untyped log data, swallowing any failure.
    ///
    /// Data that does not deserialize into [`LogData`] is a failure and issues
    /// no calls to the client.
    pub fn forward_value(&self, message: &str, log_data: &Value) -> ForwardOutcome {
        self.guarded(message, || self.try_forward_value(message, log_data))
    }

    /// Forwards untyped log data, returning deserialization failures.
    pub fn try_forward_value(
        &self,
        message: &str,
        log_data: &Value,
    ) -> Result<Option<Uuid>, ForwardError> {
        let log_data = LogData::deserialize(log_data)?;
        Ok(self.try_forward(message, log_data))
    }

    /// Forwards a log call without any guard.
    ///
    /// Returns the id of the captured event if the call was captured and the
    /// client accepted it.  Panics raised by the client propagate.
    pub fn try_forward(&self, message: &str, log_data: LogData) -> Option<Uuid> {
        let capture_errors = log_data.captures_errors();
        let level = convert_log_level(log_data.level);

        self.client
            .set_tag(CALLING_CLIENT_TAG, &log_data.context.calling_client);
        self.client
            .set_tag(CORRELATION_ID_TAG, &log_data.context.correlation_id);
        self.client.add_breadcrumb(breadcrumb_from_log(level, message));

        if !is_capture_level(level) || !capture_errors {
            return None;
        }

        let mut error = log_data.error.unwrap_or_else(LogError::missing);
        error.rewrite_message(message);
        self.client.set_extra(ERROR_EXTRA, error.to_value());
        self.client.set_level(level);
        let event_id = self.client.capture_error(&error, level);
        if event_id.is_nil() {
            // the client discarded the event or none is bound
            log::debug!(target: "sentry_forwarder", "{} event was not sent", level);
            return None;
        }
        log::debug!(target: "sentry_forwarder", "captured {} event {}", level, event_id);
        Some(event_id)
    }

    fn guarded<F>(&self, message: &str, f: F) -> ForwardOutcome
    where
        F: FnOnce() -> Result<Option<Uuid>, ForwardError>,
    {
        let result = panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
            Err(ForwardError::ClientPanicked(panic_message(&*payload)))
        });

        match result {
            Ok(event_id) => ForwardOutcome {
                event_id,
                warning: None,
            },
            Err(err) => {
                log::error!(
                    target: "sentry_forwarder",
                    "unexpected error while forwarding log {:?} to sentry: {}",
                    message,
                    err
                );
                ForwardOutcome {
                    event_id: None,
                    warning: Some(err),
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    match payload.downcast_ref::<&'static str>() {
        Some(s) => (*s).to_owned(),
        None => match payload.downcast_ref::<String>() {
            Some(s) => s.clone(),
            None => "Box<Any>".to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload = panic::catch_unwind(|| panic!("scope poisoned")).unwrap_err();
        assert_eq!(panic_message(&*payload), "scope poisoned");

        let payload = panic::catch_unwind(|| panic!("{} failed", "capture")).unwrap_err();
        assert_eq!(panic_message(&*payload), "capture failed");
    }

    #[test]
    fn test_outcome_flags() {
        let outcome = ForwardOutcome::default();
        assert!(!outcome.is_captured());
        assert!(!outcome.is_failed());

        let outcome = ForwardOutcome {
            event_id: Some(Uuid::nil()),
            warning: None,
        };
        assert!(outcome.is_captured());
    }
}
