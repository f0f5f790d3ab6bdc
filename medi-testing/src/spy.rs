// Spy handlers for testing

use medi_bus::{Handler, HandlerError, Reply};
use std::sync::{Arc, Mutex};

/// What a spy replies with when called
#[derive(Debug, Clone)]
enum Behavior<R> {
    Silent,
    Return(R),
    Fail(String),
}

/// Handler spy that records every payload it receives.
///
/// The spy owns a single [`Handler`]; every call to [`HandlerSpy::handler`]
/// returns a clone of it, so the spy can also be used to delete the
/// registration it made.
pub struct HandlerSpy<P, R = serde_json::Value> {
    calls: Arc<Mutex<Vec<P>>>,
    handler: Handler<P, R>,
}

impl<P, R> HandlerSpy<P, R>
where
    P: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Create a spy that replies with nothing
    pub fn new() -> Self {
        Self::with_behavior(Behavior::Silent)
    }

    /// Create a spy that replies with `value` on every call
    pub fn returning(value: R) -> Self {
        Self::with_behavior(Behavior::Return(value))
    }

    /// Create a spy that fails on every call
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Fail(message.into()))
    }

    fn with_behavior(behavior: Behavior<R>) -> Self {
        let calls: Arc<Mutex<Vec<P>>> = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);

        let handler = Handler::new(move |payload: &P| {
            recorded.lock().unwrap().push(payload.clone());
            match &behavior {
                Behavior::Silent => Ok(Reply::Silent),
                Behavior::Return(value) => Ok(Reply::Value(value.clone())),
                Behavior::Fail(message) => Err(HandlerError::failed(message.clone())),
            }
        });

        Self { calls, handler }
    }
}

impl<P: Clone, R> HandlerSpy<P, R> {
    /// The handler to register on a mediator
    pub fn handler(&self) -> Handler<P, R> {
        self.handler.clone()
    }

    /// Get the number of calls
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Check if the spy was called at all
    pub fn was_called(&self) -> bool {
        self.call_count() > 0
    }

    /// Check if the spy was called with `payload`
    pub fn was_called_with(&self, payload: &P) -> bool
    where
        P: PartialEq,
    {
        self.calls.lock().unwrap().contains(payload)
    }

    /// Get all recorded payloads
    pub fn calls(&self) -> Vec<P> {
        self.calls.lock().unwrap().clone()
    }

    /// Get the most recent payload
    pub fn last_call(&self) -> Option<P> {
        self.calls.lock().unwrap().last().cloned()
    }

    /// Clear all recorded calls
    pub fn reset(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl<P, R> Clone for HandlerSpy<P, R> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
            handler: self.handler.clone(),
        }
    }
}

impl<P, R> Default for HandlerSpy<P, R>
where
    P: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spy_records_calls() {
        let spy: HandlerSpy<String, ()> = HandlerSpy::new();
        let handler = spy.handler();

        assert!(handler.call(&"one".to_string()).unwrap().is_silent());
        let _ = handler.call(&"two".to_string());

        assert_eq!(spy.call_count(), 2);
        assert!(spy.was_called_with(&"one".to_string()));
        assert_eq!(spy.last_call(), Some("two".to_string()));

        spy.reset();
        assert!(!spy.was_called());
    }

    #[test]
    fn test_spy_replies() {
        let spy: HandlerSpy<i32, i32> = HandlerSpy::returning(9);
        assert!(matches!(spy.handler().call(&1), Ok(Reply::Value(9))));

        let spy: HandlerSpy<i32, i32> = HandlerSpy::failing("nope");
        assert_eq!(
            spy.handler().call(&1).unwrap_err(),
            HandlerError::failed("nope")
        );
        assert_eq!(spy.calls(), vec![1]);
    }

    #[tokio::test]
    async fn test_spy_on_mediator() {
        let bus: medi_bus::Mediator<String, i32> = medi_bus::Mediator::new();
        let spy = HandlerSpy::returning(4);

        bus.when("c", spy.handler());
        let values = bus.emit("c", "m".to_string()).await.unwrap();

        assert_eq!(values, vec![4]);
        assert_eq!(spy.last_call(), Some("m".to_string()));
    }

    #[test]
    fn test_spy_handler_identity() {
        let spy: HandlerSpy<i32, ()> = HandlerSpy::new();
        assert_eq!(spy.handler(), spy.clone().handler());
    }
}
