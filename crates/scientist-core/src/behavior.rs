//! Uniform asynchronous behaviors
//!
//! Every callable declared on an experiment is normalized into a
//! [`Behavior`]: a shareable `Fn() -> BoxFuture<T>`. Synchronous closures are
//! invoked when the behavior is called and their value is handed back as an
//! already-resolved future, so runners only ever deal with one calling
//! convention.

use futures::future::{self, BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type BehaviorFn<T> = dyn Fn() -> BoxFuture<'static, T> + Send + Sync;

/// Asynchronous zero-argument callable producing `T`
pub struct Behavior<T> {
    inner: Arc<BehaviorFn<T>>,
}

/// Pre-run action; a failure is fatal for the execution it precedes
pub type Hook = Behavior<anyhow::Result<()>>;

impl<T: Send + 'static> Behavior<T> {
    /// Wrap a synchronous producer
    ///
    /// The producer runs when the behavior is called; the returned future is
    /// already complete.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(move || future::ready(f()).boxed()),
        }
    }

    /// Wrap an asynchronous producer
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        Self {
            inner: Arc::new(move || f().boxed()),
        }
    }

    /// Invoke the behavior
    #[inline]
    #[must_use]
    pub fn call(&self) -> BoxFuture<'static, T> {
        (self.inner)()
    }
}

impl<T: Clone + Send + Sync + 'static> Behavior<T> {
    /// Behavior that always resolves to `value`
    #[must_use]
    pub fn always(value: T) -> Self {
        Self::from_fn(move || value.clone())
    }
}

impl<T> Clone for Behavior<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Behavior<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}
