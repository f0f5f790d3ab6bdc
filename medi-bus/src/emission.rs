//! Aggregate result of one emit

use crate::handler::{is_false, HandlerError, Reply};
use futures::future::{join_all, BoxFuture};
use std::fmt;
use std::future::IntoFuture;

/// A handler failure and the position of that handler in the dispatch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Zero-based index among the handlers invoked by the emit
    pub index: usize,
    pub error: HandlerError,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler #{}: {}", self.index, self.error)
    }
}

/// Emit errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    #[error("{} handler(s) failed on channel \"{}\"", .failures.len(), .channel)]
    HandlersFailed {
        channel: String,
        failures: Vec<HandlerFailure>,
    },
}

impl EmitError {
    /// Failures in dispatch order
    pub fn failures(&self) -> &[HandlerFailure] {
        match self {
            EmitError::HandlersFailed { failures, .. } => failures,
        }
    }
}

enum Pending<R> {
    Ready(R),
    Deferred(BoxFuture<'static, Result<R, HandlerError>>),
    Failed(HandlerError),
}

/// The aggregate returned by [`Mediator::emit`](crate::Mediator::emit).
///
/// Every matching handler has already run by the time an `Emission` exists.
/// Awaiting it waits for the deferred replies and yields the collected values
/// in dispatch order:
///
/// ```
/// use medi_bus::{Handler, HandlerError, Mediator};
///
/// # tokio_test::block_on(async {
/// let bus: Mediator<String, i32> = Mediator::new();
/// bus.when("sum", Handler::from_fn(|_: &String| 1))
///     .when("sum", Handler::from_async(|_: &String| async { Ok::<_, HandlerError>(2) }));
///
/// let values = bus.emit("sum", "go".to_string()).await.unwrap();
/// assert_eq!(values, vec![1, 2]);
/// # });
/// ```
///
/// Awaiting fails with [`EmitError::HandlersFailed`] if any collected reply
/// failed. A deferred reply that never settles keeps the emission pending.
#[must_use = "handler failures are only reported when the emission is awaited"]
pub struct Emission<R = serde_json::Value> {
    channel: String,
    dispatched: bool,
    invoked: usize,
    pending: Vec<(usize, Pending<R>)>,
    aborted: Option<HandlerFailure>,
}

impl<R> Emission<R> {
    /// Emission for a channel without subscriptions.
    pub(crate) fn idle(channel: &str) -> Self {
        Self {
            dispatched: false,
            ..Self::new(channel)
        }
    }

    pub(crate) fn new(channel: &str) -> Self {
        Self {
            channel: channel.to_string(),
            dispatched: true,
            invoked: 0,
            pending: Vec::new(),
            aborted: None,
        }
    }

    /// Reserve the dispatch index of the next handler.
    pub(crate) fn begin(&mut self) -> usize {
        self.invoked += 1;
        self.invoked - 1
    }

    pub(crate) fn fail(&mut self, index: usize, error: HandlerError) {
        self.pending.push((index, Pending::Failed(error)));
    }

    /// Stop the aggregate at a synchronous failure; earlier replies are dropped.
    pub(crate) fn abort(&mut self, index: usize, error: HandlerError) {
        self.pending.clear();
        self.aborted = Some(HandlerFailure { index, error });
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// `false` when the channel had no subscriptions at all.
    pub fn is_dispatched(&self) -> bool {
        self.dispatched
    }

    /// Number of handlers invoked.
    pub fn invoked(&self) -> usize {
        self.invoked
    }

    /// Number of replies collected (values, deferred values and failures).
    pub fn pending(&self) -> usize {
        self.pending.len() + usize::from(self.aborted.is_some())
    }

    /// Whether a handler already failed synchronously.
    pub fn has_failures(&self) -> bool {
        self.aborted.is_some()
            || self
                .pending
                .iter()
                .any(|(_, p)| matches!(p, Pending::Failed(_)))
    }

    /// Wait for every collected reply.
    pub async fn settle(self) -> Result<Vec<R>, EmitError> {
        let channel = self.channel;

        if let Some(failure) = self.aborted {
            return Err(EmitError::HandlersFailed {
                channel,
                failures: vec![failure],
            });
        }

        let outcomes = join_all(self.pending.into_iter().map(|(index, pending)| async move {
            let outcome = match pending {
                Pending::Ready(value) => Ok(value),
                Pending::Deferred(future) => future.await,
                Pending::Failed(error) => Err(error),
            };
            (index, outcome)
        }))
        .await;

        let mut values = Vec::with_capacity(outcomes.len());
        let mut failures = Vec::new();

        for (index, outcome) in outcomes {
            match outcome {
                Ok(value) => values.push(value),
                Err(error) => failures.push(HandlerFailure { index, error }),
            }
        }

        if failures.is_empty() {
            Ok(values)
        } else {
            Err(EmitError::HandlersFailed { channel, failures })
        }
    }
}

impl<R: 'static> Emission<R> {
    /// Record a synchronous reply. A `false` value is left out; deferred
    /// replies are collected whatever they resolve to.
    pub(crate) fn capture(&mut self, index: usize, reply: Reply<R>) {
        match reply {
            Reply::Silent => {}
            Reply::Value(value) if is_false(&value) => {}
            Reply::Value(value) => self.pending.push((index, Pending::Ready(value))),
            Reply::Deferred(future) => self.pending.push((index, Pending::Deferred(future))),
        }
    }
}

impl<R: Send + 'static> IntoFuture for Emission<R> {
    type Output = Result<Vec<R>, EmitError>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.settle())
    }
}

impl<R> fmt::Debug for Emission<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emission")
            .field("channel", &self.channel)
            .field("dispatched", &self.dispatched)
            .field("invoked", &self.invoked)
            .field("pending", &self.pending.len())
            .field("aborted", &self.aborted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_idle_resolves_empty() {
        let emission: Emission<i32> = Emission::idle("nowhere");

        assert!(!emission.is_dispatched());
        assert_eq!(emission.invoked(), 0);
        assert_eq!(emission.await, Ok(vec![]));
    }

    #[tokio::test]
    async fn test_settle_keeps_dispatch_order() {
        let mut emission: Emission<i32> = Emission::new("c");

        let first = emission.begin();
        emission.capture(
            first,
            Reply::deferred(async {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok::<_, HandlerError>(1)
            }),
        );
        let second = emission.begin();
        emission.capture(second, Reply::Value(2));
        let third = emission.begin();
        emission.capture(third, Reply::Silent);

        assert_eq!(emission.invoked(), 3);
        assert_eq!(emission.pending(), 2);
        assert_eq!(emission.await, Ok(vec![1, 2]));
    }

    #[tokio::test]
    async fn test_failures_are_collected() {
        let mut emission: Emission<i32> = Emission::new("c");

        let index = emission.begin();
        emission.fail(index, HandlerError::failed("sync"));
        let index = emission.begin();
        emission.capture(index, Reply::Value(7));
        let index = emission.begin();
        emission.capture(
            index,
            Reply::deferred(async { Err::<i32, _>(HandlerError::rejected("async")) }),
        );

        assert!(emission.has_failures());

        let err = emission.await.unwrap_err();
        assert_eq!(
            err.failures(),
            &[
                HandlerFailure {
                    index: 0,
                    error: HandlerError::failed("sync"),
                },
                HandlerFailure {
                    index: 2,
                    error: HandlerError::rejected("async"),
                },
            ]
        );
        assert_eq!(err.to_string(), "2 handler(s) failed on channel \"c\"");
    }

    #[tokio::test]
    async fn test_false_value_is_not_collected() {
        let mut emission: Emission<serde_json::Value> = Emission::new("c");

        let index = emission.begin();
        emission.capture(index, Reply::Value(serde_json::json!(false)));
        let index = emission.begin();
        emission.capture(index, Reply::Value(serde_json::json!(0)));

        assert_eq!(emission.invoked(), 2);
        assert_eq!(emission.pending(), 1);
        assert_eq!(emission.await, Ok(vec![serde_json::json!(0)]));
    }

    #[tokio::test]
    async fn test_abort_discards_collected() {
        let mut emission: Emission<i32> = Emission::new("c");

        let index = emission.begin();
        emission.capture(index, Reply::Value(1));
        let index = emission.begin();
        emission.abort(index, HandlerError::failed("stop"));

        assert_eq!(emission.pending(), 1);

        let err = emission.await.unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].index, 1);
    }
}
