use crate::dispatch::{Dispatch, Task};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::task::Waker;

pub(crate) type Handler<T, E> = Box<dyn FnOnce(Result<T, E>) + Send + 'static>;

pub(crate) enum State<T, E> {
    Unresolved(Pending<T, E>),
    Resolved(T),
    Rejected(E),
}

pub(crate) struct Pending<T, E> {
    handlers: Vec<Handler<T, E>>,
    wakers: Vec<Waker>,
    abandoned: bool,
}

impl<T, E> Default for Pending<T, E> {
    fn default() -> Self {
        Self {
            handlers: vec![],
            wakers: vec![],
            abandoned: false,
        }
    }
}

/// Something that can run a callback once it has delivered every handler
/// registered on it so far.
///
/// Derived promises route their own registrations through this so that
/// their consumers are never notified ahead of the origin's consumers.
pub(crate) trait SettleNotifier: Send + Sync {
    /// The origin this one still defers to, if it is unsettled and the
    /// origin is alive.
    fn waiting_on(&self) -> Option<Arc<dyn SettleNotifier>>;

    /// Queues `callback` behind this one's own handlers, without consulting
    /// any origin.
    fn register_on_settle(&self, callback: Box<dyn FnOnce() + Send + 'static>);
}

/// Outcome of polling a core from an async context.
pub(crate) enum Poll<T, E> {
    Settled(Result<T, E>),
    Abandoned,
    Pending,
}

/// The shared state behind a source and all of its promises.
pub(crate) struct Core<T, E> {
    state: Mutex<State<T, E>>,
    dispatch: Dispatch,
    origin: Option<Weak<dyn SettleNotifier>>,
}

impl<T, E> Core<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    pub(crate) fn unresolved(dispatch: Dispatch, origin: Option<Weak<dyn SettleNotifier>>) -> Self {
        Self {
            state: Mutex::new(State::Unresolved(Pending::default())),
            dispatch,
            origin,
        }
    }

    pub(crate) fn settled(result: Result<T, E>, dispatch: Dispatch) -> Self {
        let state = match result {
            Ok(value) => State::Resolved(value),
            Err(error) => State::Rejected(error),
        };
        Self {
            state: Mutex::new(state),
            dispatch,
            origin: None,
        }
    }

    pub(crate) fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub(crate) fn result(&self) -> Option<Result<T, E>> {
        match &*self.state.lock() {
            State::Unresolved(_) => None,
            State::Resolved(value) => Some(Ok(value.clone())),
            State::Rejected(error) => Some(Err(error.clone())),
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        !matches!(&*self.state.lock(), State::Unresolved(_))
    }

    /// Moves out of `Unresolved` and delivers the result to every pending
    /// handler. Returns false, doing nothing, if already settled.
    pub(crate) fn settle(&self, result: Result<T, E>) -> bool {
        let pending = {
            let mut state = self.state.lock();
            let State::Unresolved(pending) = &mut *state else {
                return false;
            };
            let pending = std::mem::take(pending);
            *state = match &result {
                Ok(value) => State::Resolved(value.clone()),
                Err(error) => State::Rejected(error.clone()),
            };
            pending
        };

        for waker in pending.wakers {
            waker.wake();
        }
        self.deliver(result, pending.handlers);
        true
    }

    /// Registers `handler`, or delivers to it right away if already settled.
    ///
    /// While unresolved, a derived core hands the registration to the
    /// nearest ancestor that is no longer deferring, so it lands behind
    /// everything queued along the chain. The walk is a loop, so long
    /// `map` chains cost neither stack nor nested callbacks.
    pub(crate) fn add_or_call(self: &Arc<Self>, handler: Handler<T, E>) {
        let Some(mut target) = self.waiting_on() else {
            self.add_or_call_local(handler);
            return;
        };
        while let Some(next) = target.waiting_on() {
            target = next;
        }
        let core = Arc::clone(self);
        target.register_on_settle(Box::new(move || core.add_or_call_local(handler)));
    }

    fn add_or_call_local(&self, handler: Handler<T, E>) {
        let result = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Unresolved(pending) => {
                    if !pending.abandoned {
                        pending.handlers.push(handler);
                    }
                    return;
                }
                State::Resolved(value) => Ok(value.clone()),
                State::Rejected(error) => Err(error.clone()),
            }
        };
        self.deliver(result, vec![handler]);
    }

    fn deliver(&self, result: Result<T, E>, handlers: Vec<Handler<T, E>>) {
        let tasks: Vec<Task> = handlers
            .into_iter()
            .map(|handler| {
                let result = result.clone();
                Box::new(move || handler(result)) as Task
            })
            .collect();
        self.dispatch.execute(tasks);
    }

    pub(crate) fn poll(&self, waker: &Waker) -> Poll<T, E> {
        match &mut *self.state.lock() {
            State::Resolved(value) => Poll::Settled(Ok(value.clone())),
            State::Rejected(error) => Poll::Settled(Err(error.clone())),
            State::Unresolved(pending) if pending.abandoned => Poll::Abandoned,
            State::Unresolved(pending) => {
                if !pending.wakers.iter().any(|w| w.will_wake(waker)) {
                    pending.wakers.push(waker.clone());
                }
                Poll::Pending
            }
        }
    }
}

impl<T, E> Core<T, E> {
    /// Marks an unresolved core as never going to settle. Returns the wakers
    /// that were waiting on it, or `None` if it had already settled.
    pub(crate) fn abandon(&self) -> Option<Vec<Waker>> {
        let pending = {
            let mut state = self.state.lock();
            let State::Unresolved(pending) = &mut *state else {
                return None;
            };
            let taken = std::mem::take(pending);
            pending.abandoned = true;
            taken
        };
        // Never going to run; dropping them releases the sources they hold.
        drop(pending.handlers);
        Some(pending.wakers)
    }
}

impl<T, E> SettleNotifier for Core<T, E>
where
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    fn waiting_on(&self) -> Option<Arc<dyn SettleNotifier>> {
        if self.is_settled() {
            return None;
        }
        self.origin.as_ref().and_then(Weak::upgrade)
    }

    fn register_on_settle(&self, callback: Box<dyn FnOnce() + Send + 'static>) {
        self.add_or_call_local(Box::new(move |_: Result<T, E>| callback()));
    }
}
