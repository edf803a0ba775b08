use crate::dispatch::Dispatch;
use crate::source::PromiseSource;
use crate::state::{self, Core};
use crate::Error;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// The consumer side of a promise: a shareable, read-only view of a value
/// or error that is settled at most once.
///
/// Continuations registered on a promise run in registration order, each
/// exactly once, through the promise's [`Dispatch`]. Registering after
/// settlement behaves exactly like registering before it.
///
/// # Examples
///
/// ```
/// use promise_source::{Dispatch, PromiseSource};
/// use std::sync::{Arc, Mutex};
///
/// let source = PromiseSource::<i32, String>::with_dispatch(Dispatch::Synchronous);
/// let log = Arc::new(Mutex::new(vec![]));
///
/// let (a, b) = (log.clone(), log.clone());
/// source
///     .promise()
///     .then(move |x| a.lock().unwrap().push(format!("then {}", x)))
///     .catch(move |e| b.lock().unwrap().push(format!("catch {}", e)));
///
/// source.reject("boom".into());
/// assert_eq!(*log.lock().unwrap(), vec!["catch boom".to_string()]);
/// ```
pub struct Promise<T, E> {
    core: Arc<Core<T, E>>,
}

impl<T, E> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub(crate) fn from_core(core: Arc<Core<T, E>>) -> Self {
        Self { core }
    }

    pub(crate) fn core(&self) -> &Arc<Core<T, E>> {
        &self.core
    }

    /// A promise that is already resolved with `value`.
    pub fn of_value(value: T) -> Self {
        Self::from_result(Ok(value))
    }

    /// A promise that is already rejected with `error`.
    pub fn of_error(error: E) -> Self {
        Self::from_result(Err(error))
    }

    pub fn from_result(result: Result<T, E>) -> Self {
        Self::from_core(Arc::new(Core::settled(result, Dispatch::Unspecified)))
    }

    /// The value, if resolved. Never waits.
    pub fn value(&self) -> Option<T> {
        self.core.result().and_then(Result::ok)
    }

    /// The error, if rejected. Never waits.
    pub fn error(&self) -> Option<E> {
        self.core.result().and_then(Result::err)
    }

    /// The settlement, if any. Never waits.
    pub fn result(&self) -> Option<Result<T, E>> {
        self.core.result()
    }

    pub fn is_settled(&self) -> bool {
        self.core.is_settled()
    }

    pub fn dispatch(&self) -> &Dispatch {
        self.core.dispatch()
    }

    fn add_or_call_result_handler<H>(&self, handler: H)
    where
        H: FnOnce(Result<T, E>) + Send + 'static,
    {
        self.core.add_or_call(Box::new(handler));
    }

    /// Runs `handler` with the value once resolved. Errors are ignored.
    pub fn then<H>(&self, handler: H) -> Self
    where
        H: FnOnce(T) + Send + 'static,
    {
        self.add_or_call_result_handler(move |result| {
            if let Ok(value) = result {
                handler(value);
            }
        });
        self.clone()
    }

    /// Runs `handler` with the error once rejected. Values are ignored.
    pub fn catch<H>(&self, handler: H) -> Self
    where
        H: FnOnce(E) + Send + 'static,
    {
        self.add_or_call_result_handler(move |result| {
            if let Err(error) = result {
                handler(error);
            }
        });
        self.clone()
    }

    /// Runs `handler` once settled, either way.
    pub fn finally<H>(&self, handler: H) -> Self
    where
        H: FnOnce() + Send + 'static,
    {
        self.add_or_call_result_handler(move |_| handler());
        self.clone()
    }

    pub fn finally_result<H>(&self, handler: H) -> Self
    where
        H: FnOnce(Result<T, E>) + Send + 'static,
    {
        self.add_or_call_result_handler(handler);
        self.clone()
    }

    /// Resolves with `transform(value)`; errors pass through untouched.
    ///
    /// Continuations on the returned promise run only after every
    /// continuation registered on `self` before them.
    pub fn map<U, F>(&self, transform: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        let source = PromiseSource::chained(self);
        let promise = source.promise();
        self.add_or_call_result_handler(move |result| {
            source.settle(result.map(transform));
        });
        promise
    }

    /// Settles like the promise returned by `transform(value)`; errors pass
    /// through untouched.
    pub fn flat_map<U, F>(&self, transform: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(T) -> Promise<U, E> + Send + 'static,
    {
        let source = PromiseSource::with_dispatch(self.dispatch().clone());
        let promise = source.promise();
        self.add_or_call_result_handler(move |result| match result {
            Ok(value) => source.adopt(&transform(value)),
            Err(error) => {
                source.reject(error);
            }
        });
        promise
    }

    /// Recovers from an error by resolving with `transform(error)`.
    pub fn map_error<F>(&self, transform: F) -> Self
    where
        F: FnOnce(E) -> T + Send + 'static,
    {
        let source = PromiseSource::chained(self);
        let promise = source.promise();
        self.add_or_call_result_handler(move |result| {
            source.resolve(result.unwrap_or_else(transform));
        });
        promise
    }

    /// Recovers from an error by settling like `transform(error)`.
    pub fn flat_map_error<F>(&self, transform: F) -> Self
    where
        F: FnOnce(E) -> Self + Send + 'static,
    {
        let source = PromiseSource::with_dispatch(self.dispatch().clone());
        let promise = source.promise();
        self.add_or_call_result_handler(move |result| match result {
            Ok(value) => {
                source.resolve(value);
            }
            Err(error) => source.adopt(&transform(error)),
        });
        promise
    }

    /// Resolves with `transform` applied to either outcome.
    pub fn map_result<U, F>(&self, transform: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(Result<T, E>) -> U + Send + 'static,
    {
        let source = PromiseSource::with_dispatch(self.dispatch().clone());
        let promise = source.promise();
        self.add_or_call_result_handler(move |result| {
            source.resolve(transform(result));
        });
        promise
    }

    /// Settles like the promise `transform` returns for either outcome.
    pub fn flat_map_result<U, F>(&self, transform: F) -> Promise<U, E>
    where
        U: Clone + Send + 'static,
        F: FnOnce(Result<T, E>) -> Promise<U, E> + Send + 'static,
    {
        let source = PromiseSource::with_dispatch(self.dispatch().clone());
        let promise = source.promise();
        self.add_or_call_result_handler(move |result| source.adopt(&transform(result)));
        promise
    }

    /// The same settlement, delivered to its own continuations through
    /// `dispatch` instead.
    pub fn dispatch_on(&self, dispatch: Dispatch) -> Self {
        let source = PromiseSource::with_dispatch(dispatch);
        source.adopt(self);
        source.promise()
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E>
where
    T: fmt::Debug + Clone + Send + 'static,
    E: fmt::Debug + Clone + Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("result", &self.core.result())
            .field("dispatch", self.core.dispatch())
            .finish()
    }
}

impl<T, E> Future for Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static + From<Error>,
{
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.core.poll(cx.waker()) {
            state::Poll::Settled(result) => Poll::Ready(result),
            state::Poll::Abandoned => Poll::Ready(Err(Error::SourceDropped.into())),
            state::Poll::Pending => Poll::Pending,
        }
    }
}
