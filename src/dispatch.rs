//! Where continuations run.
//!
//! A promise never runs its handlers by itself; it hands them to an
//! [`Executor`] chosen through a [`Dispatch`] when its source is created.
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// A unit of work handed to an executor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// The capability that runs queued handlers.
///
/// Implementations must run the tasks of a single `execute` call in the
/// order they were given.
pub trait Executor: Send + Sync {
    fn execute(&self, tasks: Vec<Task>);
}

/// Runs every task immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SynchronousExecutor;

impl Executor for SynchronousExecutor {
    fn execute(&self, tasks: Vec<Task>) {
        for task in tasks {
            task();
        }
    }
}

/// An explicit execution context that only makes progress when pumped.
///
/// This is the shape of a host main loop: producers on any thread queue
/// work, and the owning thread calls [`QueueExecutor::run_pending`].
///
/// # Examples
///
/// ```
/// use promise_source::{Dispatch, PromiseSource, QueueExecutor};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// let queue = Arc::new(QueueExecutor::new());
/// let source = PromiseSource::<i32, ()>::with_dispatch(Dispatch::On(queue.clone()));
/// let fired = Arc::new(AtomicBool::new(false));
/// let flag = fired.clone();
/// source.promise().then(move |_| flag.store(true, Ordering::SeqCst));
///
/// source.resolve(1);
/// assert!(!fired.load(Ordering::SeqCst));
/// assert_eq!(queue.run_pending(), 1);
/// assert!(fired.load(Ordering::SeqCst));
/// ```
#[derive(Default)]
pub struct QueueExecutor {
    queue: Mutex<VecDeque<Task>>,
}

impl QueueExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs queued tasks until the queue is empty, including tasks queued
    /// by the tasks themselves. Returns how many tasks ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // The lock is released before running so tasks may queue more work.
            let task = self.queue.lock().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl Executor for QueueExecutor {
    fn execute(&self, tasks: Vec<Task>) {
        self.queue.lock().extend(tasks);
    }
}

impl fmt::Debug for QueueExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueExecutor")
            .field("pending", &self.len())
            .finish()
    }
}

lazy_static::lazy_static! {
    static ref DEFAULT_EXECUTOR: RwLock<Arc<dyn Executor>> = RwLock::new(Arc::new(SynchronousExecutor) as Arc<dyn Executor>);
}

/// Installs the executor used by [`Dispatch::Unspecified`], typically the
/// host's main context. Until this is called the default context runs
/// handlers synchronously.
pub fn set_default_executor(executor: Arc<dyn Executor>) {
    let previous = std::mem::replace(&mut *DEFAULT_EXECUTOR.write(), executor);
    drop(previous);
}

pub fn default_executor() -> Arc<dyn Executor> {
    DEFAULT_EXECUTOR.read().clone()
}

/// How a promise delivers its handlers.
#[derive(Clone, Default)]
pub enum Dispatch {
    /// Deliver on the default context installed with [`set_default_executor`].
    #[default]
    Unspecified,
    /// Deliver immediately on whichever thread settles the promise or
    /// registers the handler.
    Synchronous,
    /// Deliver on an explicitly supplied context.
    On(Arc<dyn Executor>),
}

impl Dispatch {
    pub fn on(executor: impl Executor + 'static) -> Self {
        Dispatch::On(Arc::new(executor))
    }

    pub(crate) fn execute(&self, tasks: Vec<Task>) {
        if tasks.is_empty() {
            return;
        }
        match self {
            Dispatch::Unspecified => default_executor().execute(tasks),
            Dispatch::Synchronous => SynchronousExecutor.execute(tasks),
            Dispatch::On(executor) => executor.execute(tasks),
        }
    }
}

impl fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Unspecified => f.write_str("Unspecified"),
            Dispatch::Synchronous => f.write_str("Synchronous"),
            Dispatch::On(_) => f.write_str("On(..)"),
        }
    }
}
