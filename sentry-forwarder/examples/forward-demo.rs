use sentry_forwarder::{
    Direction, ForwarderOptions, LogContext, LogData, LogError, LogForwarder, LogLevel,
};
use serde_json::json;

fn main() {
    let mut log_builder = pretty_env_logger::formatted_builder();
    log_builder.parse_filters("debug");
    log_builder.init();

    let mut options = ForwarderOptions::from_env();
    if options.environment.is_none() {
        options.environment = Some("demo".into());
    }
    let _sentry = match sentry_forwarder::init_with_options(&options) {
        Ok(guard) => guard,
        Err(err) => {
            log::error!("cannot start sentry: {}", err);
            return;
        }
    };

    let forwarder = LogForwarder::current();
    let context = LogContext::new("demo-client", "demo-correlation-id");

    forwarder.forward(
        "Loading cart",
        LogData::new(LogLevel::Info, context.clone()).with_direction(Direction::Inbound),
    );
    forwarder.forward(
        "Payment provider is slow",
        LogData::new(LogLevel::Warn, context.clone()).with_direction(Direction::Outbound),
    );
    let outcome = forwarder.forward(
        "Payment failed",
        LogData::new(LogLevel::Error, context)
            .with_direction(Direction::Inbound)
            .with_error(LogError::new("DB timeout").with_extra("timeoutMs", 3000)),
    );
    log::info!("captured event {:?}", outcome.event_id);

    // untyped data as it arrives from a JSON log pipeline
    let outcome = forwarder.forward_value("Broken log line", &json!({"level": "loud"}));
    log::info!("forwarding failed: {}", outcome.is_failed());
}
