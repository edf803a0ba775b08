//! Promises derived from several other promises.
//!
//! Every combinator creates one fresh source and registers continuations on
//! its inputs; it never settles or otherwise affects the inputs. The derived
//! promise delivers through the dispatch of the first input.
use crate::dispatch::Dispatch;
use crate::{Error, Promise, PromiseSource};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn source_like<T, E, U, F>(first: Option<&Promise<U, F>>) -> PromiseSource<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
    U: Clone + Send + 'static,
    F: Clone + Send + 'static,
{
    let dispatch = first.map(|p| p.dispatch().clone()).unwrap_or(Dispatch::Unspecified);
    PromiseSource::with_dispatch(dispatch)
}

/// Settles like the inner promise once the outer one resolves with it.
/// If the outer promise rejects, so does the result.
pub fn flatten<T, E>(promise: &Promise<Promise<T, E>, E>) -> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let source = source_like(Some(promise));
    let flattened = source.promise();
    promise.finally_result(move |outer| match outer {
        Ok(inner) => source.adopt(&inner),
        Err(error) => {
            source.reject(error);
        }
    });
    flattened
}

/// Resolves with both values once both resolve; rejects with the first
/// error from either.
pub fn when_both<A, B, E>(first: &Promise<A, E>, second: &Promise<B, E>) -> Promise<(A, B), E>
where
    A: Clone + Send + 'static,
    B: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn take_pair<A, B>(slots: &mut (Option<A>, Option<B>)) -> Option<(A, B)> {
        match std::mem::take(slots) {
            (Some(a), Some(b)) => Some((a, b)),
            partial => {
                *slots = partial;
                None
            }
        }
    }

    let source = source_like(Some(first));
    let both = source.promise();
    let slots: Arc<Mutex<(Option<A>, Option<B>)>> = Arc::new(Mutex::new((None, None)));

    {
        let source = source.clone();
        let slots = slots.clone();
        first.then(move |a| {
            let pair = {
                let mut slots = slots.lock();
                slots.0 = Some(a);
                take_pair(&mut slots)
            };
            if let Some(pair) = pair {
                source.resolve(pair);
            }
        });
    }
    {
        let source = source.clone();
        second.then(move |b| {
            let pair = {
                let mut slots = slots.lock();
                slots.1 = Some(b);
                take_pair(&mut slots)
            };
            if let Some(pair) = pair {
                source.resolve(pair);
            }
        });
    }

    let on_error = source.clone();
    first.catch(move |error| {
        on_error.reject(error);
    });
    second.catch(move |error| {
        source.reject(error);
    });
    both
}

/// Resolves with the first value from either promise. Rejects only when
/// both have rejected, with the error that arrived last.
pub fn when_either<T, E>(first: &Promise<T, E>, second: &Promise<T, E>) -> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    first_value(&[first.clone(), second.clone()])
}

/// Resolves with every value, in input order, once all resolve. Rejects
/// with the first error from any input. An empty input resolves at once
/// with an empty `Vec`.
///
/// # Examples
///
/// ```
/// use promise_source::{when_all, Dispatch, PromiseSource};
///
/// let first = PromiseSource::<i32, ()>::with_dispatch(Dispatch::Synchronous);
/// let second = PromiseSource::<i32, ()>::with_dispatch(Dispatch::Synchronous);
/// let all = when_all(&[first.promise(), second.promise()]);
///
/// second.resolve(2);
/// assert_eq!(all.value(), None);
/// first.resolve(1);
/// assert_eq!(all.value(), Some(vec![1, 2]));
/// ```
pub fn when_all<T, E>(promises: &[Promise<T, E>]) -> Promise<Vec<T>, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    struct Collected<T> {
        values: Vec<Option<T>>,
        remaining: usize,
    }

    if promises.is_empty() {
        return Promise::of_value(Vec::new());
    }

    let source = source_like(promises.first());
    let all = source.promise();
    let collected = Arc::new(Mutex::new(Collected::<T> {
        values: promises.iter().map(|_| None).collect(),
        remaining: promises.len(),
    }));

    for (index, promise) in promises.iter().enumerate() {
        let on_value = source.clone();
        let collected = collected.clone();
        promise.then(move |value| {
            let values = {
                let mut collected = collected.lock();
                collected.values[index] = Some(value);
                collected.remaining -= 1;
                if collected.remaining > 0 {
                    return;
                }
                std::mem::take(&mut collected.values)
            };
            on_value.resolve(values.into_iter().flatten().collect());
        });

        let on_error = source.clone();
        promise.catch(move |error| {
            on_error.reject(error);
        });
    }
    all
}

/// Resolves with the first value from any input. Rejects only when every
/// input has rejected, with the error that arrived last; an empty input
/// rejects at once with [`Error::EmptyInput`].
pub fn when_any<T, E>(promises: &[Promise<T, E>]) -> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static + From<Error>,
{
    if promises.is_empty() {
        return Promise::of_error(Error::EmptyInput.into());
    }
    first_value(promises)
}

fn first_value<T, E>(promises: &[Promise<T, E>]) -> Promise<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let source = source_like(promises.first());
    let any = source.promise();
    let remaining = Arc::new(AtomicUsize::new(promises.len()));

    for promise in promises {
        let on_value = source.clone();
        promise.then(move |value| {
            on_value.resolve(value);
        });

        let on_error = source.clone();
        let remaining = remaining.clone();
        promise.catch(move |error| {
            if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                on_error.reject(error);
            }
        });
    }
    any
}

/// Resolves once every input has settled, whichever way.
pub fn when_all_finalized<T, E>(promises: &[Promise<T, E>]) -> Promise<(), E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    if promises.is_empty() {
        return Promise::of_value(());
    }

    let source = source_like(promises.first());
    let finalized = source.promise();
    let remaining = Arc::new(AtomicUsize::new(promises.len()));

    for promise in promises {
        let source = source.clone();
        let remaining = remaining.clone();
        promise.finally(move || {
            if remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
                source.resolve(());
            }
        });
    }
    finalized
}

/// Resolves once any input has settled, whichever way. An empty input
/// resolves at once.
pub fn when_any_finalized<T, E>(promises: &[Promise<T, E>]) -> Promise<(), E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    if promises.is_empty() {
        return Promise::of_value(());
    }

    let source = source_like(promises.first());
    let finalized = source.promise();
    for promise in promises {
        let source = source.clone();
        promise.finally(move || {
            source.resolve(());
        });
    }
    finalized
}
