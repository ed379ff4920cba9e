use sentry::ClientInitGuard;

use crate::error::InitError;
use crate::options::ForwarderOptions;

/// Creates the Sentry client for a DSN and an environment and binds it.
///
/// Default integrations are disabled, so only forwarded log calls and the
/// request middleware produce telemetry.  The returned guard must be kept
/// alive for as long as events should be sent; dropping it drains and shuts
/// down the transport.
///
/// # Examples
///
/// ```
/// let _sentry = sentry_forwarder::init("https://public@sentry.invalid/1", "staging").unwrap();
/// ```
pub fn init(dsn: &str, environment: &str) -> Result<ClientInitGuard, InitError> {
    init_with_options(&ForwarderOptions::new(dsn, environment))
}

/// Creates the Sentry client from forwarder options and binds it.
///
/// Fails only if the DSN cannot be parsed.  An unset or empty DSN creates a
/// disabled client, unless `SENTRY_DSN` is set.
pub fn init_with_options(options: &ForwarderOptions) -> Result<ClientInitGuard, InitError> {
    let guard = sentry::init(options.to_client_options()?);
    if guard.is_enabled() {
        log::debug!(
            target: "sentry_forwarder",
            "enabled sentry forwarding for environment {:?}",
            options.environment
        );
    } else {
        log::debug!(target: "sentry_forwarder", "sentry forwarding is disabled");
    }
    Ok(guard)
}
