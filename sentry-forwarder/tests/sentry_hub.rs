use std::sync::Arc;

use sentry::protocol::Value;
use sentry::{ClientOptions, Hub, Level};
use sentry_forwarder::{Direction, LogContext, LogData, LogError, LogForwarder, LogLevel};
use serde_json::json;

fn context() -> LogContext {
    LogContext::new("svc-a", "abc-1")
}

#[test]
fn test_captured_event() {
    let events = sentry::test::with_captured_events(|| {
        let forwarder = LogForwarder::current();
        forwarder.forward("charging card", LogData::new(LogLevel::Info, context()));
        forwarder.forward(
            "Payment failed",
            LogData::new(LogLevel::Error, context())
                .with_direction(Direction::Inbound)
                .with_error(LogError::new("DB timeout").with_extra("code", 504)),
        );
    });

    assert_eq!(events.len(), 1);
    let event = events.into_iter().next().unwrap();

    assert_eq!(event.level, Level::Error);
    assert_eq!(event.tags["callingClient"], "svc-a");
    assert_eq!(event.tags["correlationId"], "abc-1");

    assert_eq!(event.breadcrumbs.len(), 2);
    assert_eq!(event.breadcrumbs[0].level, Level::Info);
    assert_eq!(event.breadcrumbs[0].message, Some("charging card".into()));
    assert_eq!(event.breadcrumbs[0].category.as_deref(), Some("log"));
    assert_eq!(event.breadcrumbs[1].level, Level::Error);
    assert_eq!(event.breadcrumbs[1].message, Some("Payment failed".into()));

    assert_eq!(event.exception.len(), 1);
    assert_eq!(event.exception[0].ty, "Error");
    assert_eq!(event.exception[0].value, Some("Payment failed".into()));

    assert_eq!(event.extra["originalMessage"], "DB timeout");
    assert_eq!(
        event.extra["error"],
        json!({
            "name": "Error",
            "message": "Payment failed",
            "originalMessage": "DB timeout",
            "code": 504
        })
    );
}

#[test]
fn test_outbound_sends_nothing() {
    let events = sentry::test::with_captured_events(|| {
        LogForwarder::current().forward(
            "Payment failed",
            LogData::new(LogLevel::Fatal, context())
                .with_direction(Direction::Outbound)
                .with_error(LogError::new("DB timeout")),
        );
    });

    assert!(events.is_empty());
}

#[test]
fn test_breadcrumbs_precede_later_capture() {
    let events = sentry::test::with_captured_events(|| {
        let forwarder = LogForwarder::current();
        forwarder.forward(
            "call to svc-b failed",
            LogData::new(LogLevel::Error, LogContext::new("svc-a", "abc-1"))
                .with_direction(Direction::Outbound),
        );
        forwarder.forward(
            "retry budget low",
            LogData::new(LogLevel::Warn, LogContext::new("svc-a", "abc-2")),
        );
        forwarder.forward(
            "Payment failed",
            LogData::new(LogLevel::Fatal, LogContext::new("svc-a", "abc-2")),
        );
    });

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.level, Level::Fatal);
    assert_eq!(event.tags["correlationId"], "abc-2");
    let levels: Vec<Level> = event.breadcrumbs.iter().map(|b| b.level).collect();
    assert_eq!(levels, vec![Level::Error, Level::Warning, Level::Fatal]);
    assert_eq!(event.extra["originalMessage"], "Missing error object!");
}

#[test]
fn test_explicit_hub() {
    let events = sentry::test::with_captured_events(|| {
        let hub = Arc::new(Hub::new_from_top(Hub::current()));
        let forwarder = LogForwarder::new(hub);
        forwarder.forward(
            "Payment failed",
            LogData::new(LogLevel::Error, context()).with_error(LogError::new("DB timeout")),
        );
    });

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tags["callingClient"], "svc-a");
    assert_eq!(events[0].exception[0].value, Some("Payment failed".into()));
}

#[test]
fn test_attached_stacktrace() {
    let options = ClientOptions {
        attach_stacktrace: true,
        ..Default::default()
    };
    let events = sentry::test::with_captured_events_options(
        || {
            LogForwarder::current().forward(
                "Payment failed",
                LogData::new(LogLevel::Error, context()),
            );
        },
        options,
    );

    assert_eq!(events.len(), 1);
    assert!(events[0].exception[0].stacktrace.is_some());
}

#[test]
fn test_error_extra_is_json() {
    let events = sentry::test::with_captured_events(|| {
        LogForwarder::current().forward(
            "Payment failed",
            LogData::new(LogLevel::Error, context()),
        );
    });

    assert!(matches!(events[0].extra["error"], Value::Object(_)));
}

#[test]
fn test_no_client_is_not_captured() {
    // a fresh thread inherits the process hub, which has no client bound
    let outcome = std::thread::spawn(|| {
        LogForwarder::current().forward(
            "Payment failed",
            LogData::new(LogLevel::Error, context()).with_error(LogError::new("DB timeout")),
        )
    })
    .join()
    .unwrap();

    assert!(!outcome.is_captured());
    assert_eq!(outcome.event_id, None);
    assert!(!outcome.is_failed());
}

#[test]
fn test_sampled_out_event_is_not_captured() {
    let options = ClientOptions {
        sample_rate: 0.0,
        ..Default::default()
    };
    let mut outcome = None;
    let events = sentry::test::with_captured_events_options(
        || {
            outcome = Some(LogForwarder::current().forward(
                "Payment failed",
                LogData::new(LogLevel::Fatal, context()),
            ));
        },
        options,
    );

    assert!(events.is_empty());
    let outcome = outcome.unwrap();
    assert!(!outcome.is_captured());
    assert!(!outcome.is_failed());
}

#[test]
fn test_sent_event_is_captured() {
    let mut outcome = None;
    let events = sentry::test::with_captured_events(|| {
        outcome = Some(LogForwarder::current().forward(
            "Payment failed",
            LogData::new(LogLevel::Error, context()),
        ));
    });

    assert_eq!(events.len(), 1);
    assert_eq!(outcome.unwrap().event_id, Some(events[0].event_id));
}
