#![allow(dead_code)]

use std::sync::Mutex;

use sentry::protocol::Value;
use sentry::types::Uuid;
use sentry::{Breadcrumb, Level};
use sentry_forwarder::{LogContext, LogError, TrackingClient};

/// A call received by [`RecordingClient`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    SetTag(String, String),
    AddBreadcrumb(Level, Option<String>),
    SetExtra(String, Value),
    SetLevel(Level),
    Capture(LogError, Level),
}

/// Records every call instead of talking to Sentry.
#[derive(Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<Call>>,
    panic_on_tag: bool,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A client that panics as soon as the first tag is set.
    pub fn panicking() -> Self {
        RecordingClient {
            panic_on_tag: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn captures(&self) -> Vec<(LogError, Level)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Capture(error, level) => Some((error, level)),
                _ => None,
            })
            .collect()
    }

    pub fn breadcrumbs(&self) -> Vec<(Level, Option<String>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::AddBreadcrumb(level, message) => Some((level, message)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl TrackingClient for RecordingClient {
    fn set_tag(&self, key: &str, value: &str) {
        if self.panic_on_tag {
            panic!("scope is not configurable");
        }
        self.record(Call::SetTag(key.into(), value.into()));
    }

    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        self.record(Call::AddBreadcrumb(breadcrumb.level, breadcrumb.message));
    }

    fn set_extra(&self, key: &str, value: Value) {
        self.record(Call::SetExtra(key.into(), value));
    }

    fn set_level(&self, level: Level) {
        self.record(Call::SetLevel(level));
    }

    fn capture_error(&self, error: &LogError, level: Level) -> Uuid {
        self.record(Call::Capture(error.clone(), level));
        Uuid::from_u128(1)
    }
}

pub fn context() -> LogContext {
    LogContext::new("svc-a", "abc-1")
}
