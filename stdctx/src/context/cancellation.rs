//! Cancellation token shared by a context and its descendants.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::Notify;
use tracing::warn;

/// A callback type for cancellation notifications. Receives the reason.
pub type CancelCallback = Box<dyn Fn(&str) + Send + Sync>;

/// A token for cooperative cancellation.
///
/// Cancellation is idempotent - only the first cancellation reason is kept.
/// Child tokens are held weakly and unregister themselves when dropped.
#[derive(Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    reason: RwLock<Option<String>>,
    callbacks: RwLock<Vec<CancelCallback>>,
    children: Mutex<HashMap<u64, Weak<CancellationToken>>>,
    next_child: AtomicU64,
    parent: Option<(Weak<CancellationToken>, u64)>,
    notify: Notify,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a token that is cancelled whenever `parent` is.
    ///
    /// The parent only holds a weak reference to the child, and forgets it
    /// when the child is dropped.
    #[must_use]
    pub fn child_of(parent: &Arc<Self>) -> Arc<Self> {
        let id = parent.next_child.fetch_add(1, Ordering::Relaxed);
        let child = Arc::new(Self {
            cancelled: AtomicBool::new(false),
            reason: RwLock::new(None),
            callbacks: RwLock::new(Vec::new()),
            children: Mutex::new(HashMap::new()),
            next_child: AtomicU64::new(0),
            parent: Some((Arc::downgrade(parent), id)),
            notify: Notify::new(),
        });

        {
            let mut children = parent.children.lock();
            // Checked under the lock so a concurrent cancel cannot miss the child.
            if !parent.is_cancelled() {
                children.insert(id, Arc::downgrade(&child));
                return child;
            }
        }
        child.cancel(parent.reason().unwrap_or_default());
        child
    }

    /// Requests cancellation with a reason.
    ///
    /// Only the first reason is kept. Callbacks run immediately; a panicking
    /// callback is logged and does not stop the others.
    pub fn cancel(&self, reason: impl Into<String>) {
        let reason = reason.into();
        {
            let mut slot = self.reason.write();
            if slot.is_some() {
                return;
            }
            *slot = Some(reason.clone());
            // The reason is visible before the flag.
            self.cancelled.store(true, Ordering::SeqCst);
        }
        self.notify.notify_waiters();

        let children = std::mem::take(&mut *self.children.lock());
        for child in children.into_values().filter_map(|c| c.upgrade()) {
            child.cancel(reason.clone());
        }

        let callbacks = std::mem::take(&mut *self.callbacks.write());
        for callback in &callbacks {
            run_callback(callback.as_ref(), &reason);
        }
    }

    /// Registers a callback to be invoked on cancellation.
    ///
    /// If already cancelled, the callback is invoked immediately.
    pub fn on_cancel<F>(&self, callback: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        {
            let mut callbacks = self.callbacks.write();
            if !self.is_cancelled() {
                callbacks.push(Box::new(callback));
                return;
            }
        }
        let reason = self.reason().unwrap_or_default();
        run_callback(&callback, &reason);
    }

    /// Returns whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Returns the cancellation reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// Returns the number of live child tokens still registered.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.lock().len()
    }

    /// Waits until the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

fn run_callback(callback: &(dyn Fn(&str) + Send + Sync), reason: &str) {
    if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(reason))) {
        warn!(reason, "Cancellation callback panicked: {:?}", e);
    }
}

impl Drop for CancellationToken {
    fn drop(&mut self) {
        if let Some((parent, id)) = &self.parent {
            if let Some(parent) = parent.upgrade() {
                parent.children.lock().remove(id);
            }
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .field("reason", &self.reason())
            .finish_non_exhaustive()
    }
}

/// Cancels the context returned alongside it by `Context::with_cancel`.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: Arc<CancellationToken>,
}

impl CancelHandle {
    pub(crate) fn new(token: Arc<CancellationToken>) -> Self {
        Self { token }
    }

    /// Cancels the context and all of its descendants.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.token.cancel(reason);
    }

    /// Returns whether the context was cancelled, by this handle or an ancestor.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
