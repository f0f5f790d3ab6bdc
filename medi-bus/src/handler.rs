//! Handlers and their replies

use futures::future::BoxFuture;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// What a handler hands back to the mediator.
pub enum Reply<R> {
    /// Nothing to collect (the handler returned nothing or `false`)
    Silent,

    /// A value available immediately. A `false` (`bool` or JSON) is
    /// treated like [`Reply::Silent`].
    Value(R),

    /// A value that settles later
    Deferred(BoxFuture<'static, Result<R, HandlerError>>),
}

impl<R> Reply<R> {
    /// Wrap a future as a deferred reply
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        Reply::Deferred(Box::pin(future))
    }

    /// Whether the mediator will leave this reply out of the results
    pub fn is_silent(&self) -> bool {
        matches!(self, Reply::Silent)
    }
}

/// Whether a synchronous reply value is the `false` sentinel.
pub(crate) fn is_false<R: 'static>(value: &R) -> bool {
    let value = value as &dyn Any;
    matches!(value.downcast_ref::<Value>(), Some(Value::Bool(false)))
        || value.downcast_ref::<bool>() == Some(&false)
}

impl<R> From<Option<R>> for Reply<R> {
    fn from(value: Option<R>) -> Self {
        match value {
            Some(value) => Reply::Value(value),
            None => Reply::Silent,
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for Reply<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Silent => write!(f, "Silent"),
            Reply::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Reply::Deferred(_) => write!(f, "Deferred(..)"),
        }
    }
}

/// Handler error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Deferred result rejected: {0}")]
    Rejected(String),
}

impl HandlerError {
    pub fn failed(message: impl Into<String>) -> Self {
        HandlerError::Failed(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        HandlerError::Rejected(message.into())
    }
}

/// Result of invoking a handler
pub type HandlerResult<R> = Result<Reply<R>, HandlerError>;

type HandlerFn<P, R> = dyn Fn(&P) -> HandlerResult<R> + Send + Sync;

/// Reference-counted callback registered on a channel.
///
/// Two handlers are equal when they are clones of the same registration,
/// which is how [`Mediator::delete_handler`](crate::Mediator::delete_handler)
/// finds the entry to remove.
///
/// ```
/// use medi_bus::Handler;
///
/// let a: Handler<String, usize> = Handler::from_fn(|msg: &String| msg.len());
/// let b: Handler<String, usize> = Handler::from_fn(|msg: &String| msg.len());
///
/// assert_eq!(a, a.clone());
/// assert_ne!(a, b);
/// ```
pub struct Handler<P, R = serde_json::Value> {
    inner: Arc<HandlerFn<P, R>>,
}

impl<P, R> Handler<P, R> {
    /// Handler with full control over the reply and failure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&P) -> HandlerResult<R> + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Handler whose return value is always collected
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&P) -> R + Send + Sync + 'static,
    {
        Self::new(move |payload| Ok(Reply::Value(f(payload))))
    }

    /// Handler run for its side effects only
    pub fn observer<F>(f: F) -> Self
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        Self::new(move |payload| {
            f(payload);
            Ok(Reply::Silent)
        })
    }

    /// Handler that starts asynchronous work and replies with its future
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(&P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        Self::new(move |payload| Ok(Reply::deferred(f(payload))))
    }

    /// Invoke the handler
    pub fn call(&self, payload: &P) -> HandlerResult<R> {
        (self.inner)(payload)
    }

    /// Whether both handlers point at the same registration
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<P, R> Clone for Handler<P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, R> PartialEq for Handler<P, R> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<P, R> Eq for Handler<P, R> {}

impl<P, R> fmt::Debug for Handler<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&(Arc::as_ptr(&self.inner) as *const ()))
            .finish()
    }
}
