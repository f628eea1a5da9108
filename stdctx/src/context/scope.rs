//! Task-local ambient context.

use super::Context;
use std::future::Future;

tokio::task_local! {
    static CURRENT: Context;
}

impl Context {
    /// Returns the context of the enclosing [`Context::scope`], or a
    /// background context outside of any scope.
    #[must_use]
    pub fn current() -> Self {
        CURRENT.try_with(Clone::clone).unwrap_or_default()
    }

    /// Runs `fut` with this context as the ambient [`Context::current`].
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT.scope(self, fut).await
    }

    /// Runs `f` with this context as the ambient [`Context::current`].
    pub fn sync_scope<R>(self, f: impl FnOnce() -> R) -> R {
        CURRENT.sync_scope(self, f)
    }
}
