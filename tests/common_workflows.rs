//! Integration tests for common Medi workflows.
//!
//! These tests verify that the most common use cases work correctly.

use medi::prelude::*;
use medi::serde_json::{Value, json};
use medi_testing::*;
use std::time::Duration;

// =============================================================================
// Dispatch Tests
// =============================================================================

#[test]
fn test_every_unfiltered_handler_called_once_in_order() {
    let bus: Mediator<String, usize> = Mediator::new();
    let spies: Vec<HandlerSpy<String, usize>> =
        (0..4).map(HandlerSpy::returning).collect();

    for spy in &spies {
        bus.when("c", spy.handler());
    }

    let emission = bus.emit("c", "msg".to_string());
    assert_eq!(emission.invoked(), 4);

    for spy in &spies {
        assert_call_count(spy, 1);
        assert_called_with(spy, &"msg".to_string());
    }

    // Replies come back in registration order
    let values = tokio_test::block_on(emission.into_future()).unwrap();
    assert_eq!(values, vec![0, 1, 2, 3]);
}

#[test]
fn test_two_handlers_receive_message() {
    let bus: Mediator<String, ()> = Mediator::new();
    let h1 = HandlerSpy::new();
    let h2 = HandlerSpy::new();

    bus.when("c", h1.handler()).when("c", h2.handler());
    let _ = bus.emit("c", "msg".to_string());

    assert_called_with(&h1, &"msg".to_string());
    assert_called_with(&h2, &"msg".to_string());
}

#[test]
fn test_filter_routes_to_matching_handler() {
    let bus: Mediator<String, ()> = Mediator::new();
    let h1 = HandlerSpy::new();
    let h2 = HandlerSpy::new();

    bus.when_filtered("c", Filter::new().with("p", "x"), h1.handler())
        .when_filtered("c", Filter::new().with("p", "y"), h2.handler());
    let _ = bus.emit_filtered("c", Filter::new().with("p", "y"), "msg".to_string());

    assert_not_called(&h1);
    assert_called_with(&h2, &"msg".to_string());
}

#[test]
fn test_subset_filter_matching() {
    let logger = MemoryLogger::new();
    let bus: Mediator<String, ()> = MediatorBuilder::new()
        .log(true)
        .logger(logger.clone())
        .build();
    let spy = HandlerSpy::new();

    bus.when_filtered("c", Filter::new().with("a", 1), spy.handler());

    let _ = bus.emit_filtered("c", Filter::new().with("a", 1).with("b", 2), "hit".to_string());
    let _ = bus.emit_filtered("c", Filter::new().with("a", 2), "miss".to_string());
    let _ = bus.emit("c", "bare".to_string());

    assert_eq!(spy.calls(), vec!["hit".to_string()]);
    assert_warned(&logger, "did not match");
    assert_warned(&logger, "requires filter");
}

#[test]
fn test_unfiltered_handler_ignores_filtered_emit() {
    let bus: Mediator<String, ()> = Mediator::new();
    let plain = HandlerSpy::new();
    let filtered = HandlerSpy::new();

    bus.when("c", plain.handler())
        .when_filtered("c", Filter::new().with("kind", "audit"), filtered.handler());
    let _ = bus.emit_filtered("c", Filter::new().with("kind", "audit"), "m".to_string());

    assert_not_called(&plain);
    assert_call_count(&filtered, 1);
}

// =============================================================================
// Result Aggregation Tests
// =============================================================================

#[tokio::test]
async fn test_aggregate_skips_silent_replies() {
    let bus: Mediator = Mediator::new();

    bus.when("c", Handler::from_fn(|_: &Value| json!(1)))
        .when(
            "c",
            Handler::from_async(|_: &Value| async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok::<_, HandlerError>(json!(2))
            }),
        )
        .when("c", Handler::observer(|_: &Value| {}))
        .when("c", Handler::new(|_: &Value| Ok(Reply::from(None))))
        .when("c", Handler::from_fn(|_: &Value| json!(false)))
        .when("c", Handler::from_fn(|_: &Value| json!(1)));

    let values = bus.emit("c", json!("payload")).await.unwrap();
    assert_eq!(values, vec![json!(1), json!(2), json!(1)]);
}

#[tokio::test]
async fn test_aggregate_reports_failures() {
    let bus: Mediator<String, i32> = Mediator::new();
    let after = HandlerSpy::returning(3);

    bus.when("c", HandlerSpy::failing("broken").handler())
        .when("c", after.handler());

    let err = bus.emit("c", "m".to_string()).await.unwrap_err();

    assert_call_count(&after, 1);
    match err {
        EmitError::HandlersFailed { channel, failures } => {
            assert_eq!(channel, "c");
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].error, HandlerError::failed("broken"));
        }
    }
}

#[tokio::test]
async fn test_emit_without_subscribers_resolves_empty() {
    let bus: Mediator<String, i32> = Mediator::new();

    let emission = bus.emit("unknown", "msg".to_string());
    assert!(!emission.is_dispatched());
    assert_eq!(emission.await, Ok(vec![]));
}

// =============================================================================
// Removal Tests
// =============================================================================

#[test]
fn test_delete_channel_then_emit() {
    let bus: Mediator<String, ()> = Mediator::new();
    let spy = HandlerSpy::new();
    bus.when("c", spy.handler());

    bus.delete("c").unwrap();

    assert!(!bus.emit("c", "m".to_string()).is_dispatched());
    assert_not_called(&spy);
}

#[test]
fn test_delete_handler_leaves_duplicate_registrations() {
    let bus: Mediator<String, ()> = Mediator::new();
    let spy = HandlerSpy::new();

    bus.when("c", spy.handler()).when("c", spy.handler());
    bus.delete_handler("c", &spy.handler()).unwrap();

    let _ = bus.emit("c", "m".to_string());
    assert_call_count(&spy, 1);
}

#[test]
fn test_delete_unknown_returns_error() {
    let bus: Mediator<String, ()> = Mediator::new();

    assert_eq!(
        bus.delete("unknown").unwrap_err(),
        DeleteError::NoSuchChannel("unknown".to_string())
    );
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_filters_from_json() {
    let bus: Mediator = Mediator::new();
    let spy = HandlerSpy::new();

    let required = Filter::from_json(&json!({"tenant": "acme"})).unwrap();
    bus.when_filtered("events", required, spy.handler());

    let offered = Filter::from_json(&json!({"tenant": "acme", "user": 7})).unwrap();
    let _ = bus.emit_filtered("events", offered, json!({"type": "login"}));

    assert_called_with(&spy, &json!({"type": "login"}));
}

#[test]
fn test_builder_applies_config() {
    let bus: Mediator = MediatorBuilder::new()
        .config(MediatorConfig {
            log: false,
            continue_on_error: false,
        })
        .build();

    assert!(!bus.config().log);
    assert!(!bus.config().continue_on_error);
}
