use crate::diagnostics::{self, UnresolvedDrop};
use crate::dispatch::Dispatch;
use crate::promise::Promise;
use crate::state::{Core, SettleNotifier};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// The producer side of a promise.
///
/// Cloning a source yields another handle to the same producer; the first
/// call to [`resolve`](Self::resolve) or [`reject`](Self::reject) across all
/// handles wins, even when they race on different threads.
///
/// # Examples
///
/// ```
/// use promise_source::{Dispatch, PromiseSource};
/// use std::thread;
///
/// let source = PromiseSource::<&str, ()>::with_dispatch(Dispatch::Synchronous);
/// let promise = source.promise();
///
/// let producers: Vec<_> = (0..4)
///     .map(|_| {
///         let source = source.clone();
///         thread::spawn(move || source.resolve("done"))
///     })
///     .collect();
/// let winners = producers
///     .into_iter()
///     .map(|t| t.join().expect("producer panicked"))
///     .filter(|won| *won)
///     .count();
///
/// assert_eq!(winners, 1);
/// assert_eq!(promise.value(), Some("done"));
/// ```
pub struct PromiseSource<T, E> {
    inner: Arc<Inner<T, E>>,
}

struct Inner<T, E> {
    core: Arc<Core<T, E>>,
    warn_unresolved_drop: AtomicBool,
}

impl<T, E> PromiseSource<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    /// A source whose promise delivers on the default context.
    pub fn new() -> Self {
        Self::with_dispatch(Dispatch::Unspecified)
    }

    pub fn with_dispatch(dispatch: Dispatch) -> Self {
        Self::from_core(Core::unresolved(dispatch, None))
    }

    /// A source whose promise transforms `origin`. Registrations on it are
    /// routed through `origin` until it settles.
    pub(crate) fn chained<U, F>(origin: &Promise<U, F>) -> Self
    where
        U: Clone + Send + 'static,
        F: Clone + Send + 'static,
    {
        let core = origin.core();
        let notifier: Weak<dyn SettleNotifier> = Arc::downgrade(core) as Weak<dyn SettleNotifier>;
        Self::from_core(Core::unresolved(core.dispatch().clone(), Some(notifier)))
    }

    fn from_core(core: Core<T, E>) -> Self {
        Self {
            inner: Arc::new(Inner {
                core: Arc::new(core),
                warn_unresolved_drop: AtomicBool::new(false),
            }),
        }
    }

    pub fn promise(&self) -> Promise<T, E> {
        Promise::from_core(Arc::clone(&self.inner.core))
    }

    /// Settles with `value`. Returns false if already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles with `error`. Returns false if already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    pub fn settle(&self, result: Result<T, E>) -> bool {
        let settled = self.inner.core.settle(result);
        if !settled {
            log::trace!(
                "ignoring settlement of already settled PromiseSource<{}, {}>",
                std::any::type_name::<T>(),
                std::any::type_name::<E>()
            );
        }
        settled
    }

    /// Settles with whatever `promise` settles with, once it does.
    pub fn adopt(&self, promise: &Promise<T, E>) {
        let source = self.clone();
        promise.finally_result(move |result| {
            source.settle(result);
        });
    }

    pub fn is_settled(&self) -> bool {
        self.inner.core.is_settled()
    }

    /// Requests an [`UnresolvedDrop`] report if the last handle to this
    /// source is dropped before it settles.
    pub fn set_warn_unresolved_drop(&self, warn: bool) {
        self.inner.warn_unresolved_drop.store(warn, Ordering::Relaxed);
    }
}

impl<T, E> Clone for PromiseSource<T, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Default for PromiseSource<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for PromiseSource<T, E>
where
    T: fmt::Debug + Clone + Send + 'static,
    E: fmt::Debug + Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PromiseSource")
            .field("result", &self.inner.core.result())
            .finish()
    }
}

impl<T, E> Drop for Inner<T, E> {
    /// If this is an unresolved source, wake any waiters so they can observe
    /// that it will never settle.
    fn drop(&mut self) {
        if let Some(wakers) = self.core.abandon() {
            if self.warn_unresolved_drop.load(Ordering::Relaxed) {
                diagnostics::report(UnresolvedDrop::of::<T, E>());
            }
            for waker in wakers {
                waker.wake();
            }
        }
    }
}
