use std::sync::Arc;

use sentry_core::protocol::Value;
use sentry_core::types::Uuid;
use sentry_core::{Breadcrumb, Hub, Level};

use crate::converters::event_from_log_error;
use crate::event::LogError;

/// The write-only surface of Sentry the forwarder talks to.
///
/// Every method either mutates the scope that subsequent captures inherit or
/// captures an error.  Implementations exist for [`Hub`], `Arc<Hub>` and
/// [`CurrentHub`]; tests substitute a recording fake.
pub trait TrackingClient {
    /// Sets a tag on the scope.
    fn set_tag(&self, key: &str, value: &str);

    /// Appends a breadcrumb to the scope's trail.
    fn add_breadcrumb(&self, breadcrumb: Breadcrumb);

    /// Sets an extra value on the scope.
    fn set_extra(&self, key: &str, value: Value);

    /// Overrides the level of subsequent captures.
    fn set_level(&self, level: Level);

    /// Captures an error and returns the id of the resulting event.
    fn capture_error(&self, error: &LogError, level: Level) -> Uuid;
}

impl TrackingClient for Hub {
    fn set_tag(&self, key: &str, value: &str) {
        self.configure_scope(|scope| scope.set_tag(key, value));
    }

    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        Hub::add_breadcrumb(self, breadcrumb);
    }

    fn set_extra(&self, key: &str, value: Value) {
        self.configure_scope(|scope| scope.set_extra(key, value));
    }

    fn set_level(&self, level: Level) {
        self.configure_scope(|scope| scope.set_level(Some(level)));
    }

    fn capture_error(&self, error: &LogError, level: Level) -> Uuid {
        let attach_stacktrace = self
            .client()
            .map_or(false, |client| client.options().attach_stacktrace);
        self.capture_event(event_from_log_error(error, level, attach_stacktrace))
    }
}

impl<T: TrackingClient + ?Sized> TrackingClient for Arc<T> {
    fn set_tag(&self, key: &str, value: &str) {
        (**self).set_tag(key, value)
    }

    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        (**self).add_breadcrumb(breadcrumb)
    }

    fn set_extra(&self, key: &str, value: Value) {
        (**self).set_extra(key, value)
    }

    fn set_level(&self, level: Level) {
        (**self).set_level(level)
    }

    fn capture_error(&self, error: &LogError, level: Level) -> Uuid {
        (**self).capture_error(error, level)
    }
}

/// Routes every call to the hub active on the calling thread.
///
/// Under the request middleware this is the hub bound to the request being
/// handled.  Calls are no-ops while no client is bound.
#[derive(Clone, Copy, Debug, Default)]
pub struct CurrentHub;

impl TrackingClient for CurrentHub {
    fn set_tag(&self, key: &str, value: &str) {
        Hub::with_active(|hub| TrackingClient::set_tag(&**hub, key, value))
    }

    fn add_breadcrumb(&self, breadcrumb: Breadcrumb) {
        Hub::with_active(|hub| TrackingClient::add_breadcrumb(&**hub, breadcrumb))
    }

    fn set_extra(&self, key: &str, value: Value) {
        Hub::with_active(|hub| TrackingClient::set_extra(&**hub, key, value))
    }

    fn set_level(&self, level: Level) {
        Hub::with_active(|hub| TrackingClient::set_level(&**hub, level))
    }

    fn capture_error(&self, error: &LogError, level: Level) -> Uuid {
        Hub::with_active(|hub| TrackingClient::capture_error(&**hub, error, level))
    }
}
