//! The immutable, request-scoped `Context` carrier.

use super::cancellation::{CancelHandle, CancellationToken};
use crate::errors::ContextError;
use std::any::{Any, TypeId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A typed key for values stored in a [`Context`].
///
/// Keys are usually private zero-sized types, which makes a value reachable
/// only through the module that owns the key.
///
/// ```
/// use stdctx::context::{Context, ContextKey};
///
/// struct RequestId;
///
/// impl ContextKey for RequestId {
///     type Value = String;
/// }
///
/// let ctx = Context::background().with_value::<RequestId>("req-1".to_string());
/// assert_eq!(ctx.value::<RequestId>().map(String::as_str), Some("req-1"));
/// ```
pub trait ContextKey: 'static {
    /// The type stored under this key.
    type Value: Send + Sync + 'static;
}

type AnyValue = Arc<dyn Any + Send + Sync>;

/// One link in the chain of values. `value: None` marks the key as removed.
struct ValueNode {
    key: TypeId,
    value: Option<AnyValue>,
    parent: Option<Arc<ValueNode>>,
}

/// An ambient, request-scoped key-value carrier.
///
/// Contexts are never mutated: every `with_*` method returns a derived context
/// that shares its ancestry with the parent. Cloning is cheap.
#[derive(Clone, Default)]
pub struct Context {
    values: Option<Arc<ValueNode>>,
    cancel: Option<Arc<CancellationToken>>,
    deadline: Option<Instant>,
}

impl Context {
    /// Returns an empty root context. Never cancelled, no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a derived context with `value` stored under `K`.
    #[must_use]
    pub fn with_value<K: ContextKey>(&self, value: K::Value) -> Self {
        self.push(TypeId::of::<K>(), Some(Arc::new(value)))
    }

    /// Returns a derived context in which `K` reads as unset.
    #[must_use]
    pub fn without<K: ContextKey>(&self) -> Self {
        self.push(TypeId::of::<K>(), None)
    }

    /// Looks up the most recently stored value for `K`.
    #[must_use]
    pub fn value<K: ContextKey>(&self) -> Option<&K::Value> {
        let key = TypeId::of::<K>();
        let mut node = self.values.as_deref();
        while let Some(n) = node {
            if n.key == key {
                return n.value.as_deref()?.downcast_ref::<K::Value>();
            }
            node = n.parent.as_deref();
        }
        None
    }

    /// Returns true if a value is stored for `K`.
    #[must_use]
    pub fn contains<K: ContextKey>(&self) -> bool {
        self.value::<K>().is_some()
    }

    fn push(&self, key: TypeId, value: Option<AnyValue>) -> Self {
        Self {
            values: Some(Arc::new(ValueNode {
                key,
                value,
                parent: self.values.clone(),
            })),
            cancel: self.cancel.clone(),
            deadline: self.deadline,
        }
    }

    /// Returns a cancellable child context and the handle that cancels it.
    ///
    /// The child is also cancelled when any ancestor is.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let token = match &self.cancel {
            Some(parent) => CancellationToken::child_of(parent),
            None => Arc::new(CancellationToken::new()),
        };
        let ctx = Self {
            values: self.values.clone(),
            cancel: Some(token.clone()),
            deadline: self.deadline,
        };
        (ctx, CancelHandle::new(token))
    }

    /// Returns a child context that expires at `deadline`.
    ///
    /// An earlier deadline inherited from the parent is kept.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            values: self.values.clone(),
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
        }
    }

    /// Returns a child context that expires after `timeout`.
    ///
    /// A timeout too large to represent leaves the deadline unchanged.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns true if this context or an ancestor was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    /// Returns the cancellation reason, if cancelled.
    #[must_use]
    pub fn cancel_reason(&self) -> Option<String> {
        self.cancel.as_ref().and_then(|t| t.reason())
    }

    /// Returns why the context is done, or `None` while it is still live.
    #[must_use]
    pub fn err(&self) -> Option<ContextError> {
        if self.is_cancelled() {
            return Some(ContextError::Cancelled(
                self.cancel_reason().unwrap_or_default(),
            ));
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Returns `Err` if the context is already done.
    pub fn check(&self) -> Result<(), ContextError> {
        self.err().map_or(Ok(()), Err)
    }

    /// Resolves once the context is cancelled or its deadline passes.
    ///
    /// Never resolves for a context without cancellation or deadline.
    pub async fn done(&self) {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => futures::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => futures::future::pending::<()>().await,
            }
        };
        tokio::select! {
            () = cancelled => {}
            () = expired => {}
        }
    }

    /// Runs `fut` to completion unless the context ends first.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, ContextError>
    where
        F: std::future::Future,
    {
        self.check()?;
        tokio::select! {
            out = fut => Ok(out),
            () = self.done() => Err(self.err().unwrap_or(ContextError::DeadlineExceeded)),
        }
    }

    fn value_count(&self) -> usize {
        let mut count = 0;
        let mut node = self.values.as_deref();
        while let Some(n) = node {
            count += 1;
            node = n.parent.as_deref();
        }
        count
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("values", &self.value_count())
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.deadline)
            .finish()
    }
}
