use std::env;

use sentry_core::types::Dsn;
use sentry_core::ClientOptions;
use serde::{Deserialize, Serialize};

use crate::error::InitError;
use crate::http::RequestOptions;

/// Configuration of the forwarder and the Sentry client it initializes.
///
/// Deserializes from a config section where every key is optional:
///
/// ```
/// let options: sentry_forwarder::ForwarderOptions = serde_json::from_str(
///     r#"{"dsn": "https://public@sentry.invalid/1", "environment": "staging"}"#,
/// )
/// .unwrap();
/// assert_eq!(options.environment.as_deref(), Some("staging"));
/// assert_eq!(options.traces_sample_rate, 1.0);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForwarderOptions {
    /// The DSN to send events to.  Unset or empty disables the client.
    pub dsn: Option<String>,
    /// The environment tag of all events.
    pub environment: Option<String>,
    /// The release tag of all events.
    pub release: Option<String>,
    /// Enables the SDK's own debug output.
    pub debug: bool,
    /// The share of error events that are sent.
    pub sample_rate: f32,
    /// The share of request transactions that are sent.
    pub traces_sample_rate: f32,
    /// Attaches the forwarding stacktrace to captured errors.
    pub attach_stacktrace: bool,
    /// Request fields the middleware attaches to events.
    pub request: RequestOptions,
}

impl Default for ForwarderOptions {
    fn default() -> Self {
        ForwarderOptions {
            dsn: None,
            environment: None,
            release: None,
            debug: false,
            sample_rate: 1.0,
            traces_sample_rate: 1.0,
            attach_stacktrace: true,
            request: RequestOptions::default(),
        }
    }
}

impl ForwarderOptions {
    /// Creates options for a DSN and an environment.
    pub fn new(dsn: impl Into<String>, environment: impl Into<String>) -> Self {
        ForwarderOptions {
            dsn: Some(dsn.into()),
            environment: Some(environment.into()),
            ..Default::default()
        }
    }

    /// Reads options from the `SENTRY_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads options through a lookup function keyed by environment
    /// variable name.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = ForwarderOptions {
            dsn: lookup("SENTRY_DSN"),
            environment: lookup("SENTRY_ENVIRONMENT"),
            release: lookup("SENTRY_RELEASE"),
            debug: lookup("SENTRY_DEBUG").map_or(false, |v| is_truthy(&v)),
            ..Default::default()
        };
        if let Some(rate) = lookup("SENTRY_TRACES_SAMPLE_RATE") {
            match rate.parse() {
                Ok(rate) => options.traces_sample_rate = rate,
                Err(_) => log::warn!(
                    target: "sentry_forwarder",
                    "ignoring invalid SENTRY_TRACES_SAMPLE_RATE {:?}",
                    rate
                ),
            }
        }
        options
    }

    /// Builds the Sentry client options.
    ///
    /// Default integrations are always disabled so that only forwarded log
    /// calls and the request middleware produce telemetry.
    pub fn to_client_options(&self) -> Result<ClientOptions, InitError> {
        let dsn = match self.dsn.as_deref() {
            Some(dsn) if !dsn.is_empty() => Some(dsn.parse::<Dsn>()?),
            _ => None,
        };
        Ok(ClientOptions {
            dsn,
            environment: self.environment.clone().map(Into::into),
            release: self.release.clone().map(Into::into),
            debug: self.debug,
            sample_rate: self.sample_rate,
            traces_sample_rate: self.traces_sample_rate,
            attach_stacktrace: self.attach_stacktrace,
            default_integrations: false,
            ..Default::default()
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
