//! Forwards application log calls to Sentry.
//!
//! Each log call tags the current scope with the calling client and the
//! correlation id of the request and leaves a breadcrumb, so that errors
//! captured later carry the trail that led up to them.  Calls at `error` or
//! `fatal` level are captured as error events, except for calls on the
//! outbound leg of a request: the service on the other end reports those.
//!
//! Forwarding never fails the caller.  Any failure is logged through the
//! [`log`] facade and handed back as the warning of a [`ForwardOutcome`].
//! The crate installs no logger of its own: without a `log` implementation
//! such as `env_logger` or `pretty_env_logger` installed by the host, those
//! diagnostic lines are discarded, and only the outcome reports the failure.
//!
//! # Examples
//!
//! ```
//! use sentry_forwarder::{Direction, LogContext, LogData, LogError, LogForwarder, LogLevel};
//!
//! let _sentry = sentry_forwarder::init("https://public@sentry.invalid/1", "staging").unwrap();
//! let forwarder = LogForwarder::current();
//!
//! let data = LogData::new(LogLevel::Error, LogContext::new("svc-a", "abc-1"))
//!     .with_direction(Direction::Inbound)
//!     .with_error(LogError::new("DB timeout"));
//! forwarder.forward("Payment failed", data);
//! ```
//!
//! # Request middleware
//!
//! [`create_middleware`] wraps a tower service so that every request is
//! handled in its own hub, starts a transaction, and events captured while
//! handling it carry the request fields selected by [`RequestOptions`].
//!
//! ```
//! # type Request = http::Request<String>;
//! use sentry_forwarder::{create_middleware, RequestOptions};
//!
//! let service = create_middleware(
//!     tower::service_fn(|_req: Request| async {
//!         Ok::<_, std::convert::Infallible>(http::Response::new(String::new()))
//!     }),
//!     RequestOptions::default(),
//! );
//! ```
//!
//! # Testing
//!
//! [`LogForwarder`] writes to any [`TrackingClient`].  Production code uses
//! [`CurrentHub`]; tests can pass a specific [`Hub`](sentry_core::Hub) or a
//! recording fake.

#![doc(html_favicon_url = "https://sentry-brand.storage.googleapis.com/favicon.ico")]
#![doc(html_logo_url = "https://sentry-brand.storage.googleapis.com/sentry-glyph-black.png")]
#![warn(missing_docs)]
#![deny(unsafe_code)]

mod client;
mod converters;
mod error;
mod event;
mod forwarder;
mod http;
mod init;
mod options;

pub use crate::client::{CurrentHub, TrackingClient};
pub use crate::converters::{
    breadcrumb_from_log, convert_log_level, event_from_log_error, is_capture_level,
    ORIGINAL_MESSAGE_EXTRA,
};
pub use crate::error::{ForwardError, InitError};
pub use crate::event::{
    Direction, LogContext, LogData, LogError, LogLevel, ParseLogLevelError, MISSING_ERROR_MESSAGE,
};
pub use crate::forwarder::{
    ForwardOutcome, LogForwarder, CALLING_CLIENT_TAG, CORRELATION_ID_TAG, ERROR_EXTRA,
};
pub use crate::http::{
    create_middleware, middleware_layer, ForwarderHttpFuture, ForwarderHttpLayer,
    ForwarderHttpService, ForwarderMiddleware, ForwarderMiddlewareLayer, RequestBody,
    RequestField, RequestOptions,
};
pub use crate::init::{init, init_with_options};
pub use crate::options::ForwarderOptions;
