//! Deferred values: a [`PromiseSource`] is settled exactly once with a value
//! or an error, and every [`Promise`] handed out from it delivers that
//! settlement to its registered continuations, in registration order,
//! through the [`Dispatch`] it was created with.
//!
//! # Examples
//!
//! ```
//! use promise_source::{Dispatch, PromiseSource};
//! use std::sync::{Arc, Mutex};
//!
//! let source = PromiseSource::<i32, String>::with_dispatch(Dispatch::Synchronous);
//! let seen = Arc::new(Mutex::new(None));
//! let seen_in_handler = seen.clone();
//!
//! source
//!     .promise()
//!     .map(|x| x + 1)
//!     .then(move |x| *seen_in_handler.lock().unwrap() = Some(x));
//!
//! assert!(source.resolve(41));
//! assert!(!source.reject("too late".into()));
//! assert_eq!(*seen.lock().unwrap(), Some(42));
//! ```
use thiserror::Error;

pub mod combinators;
pub mod diagnostics;
pub mod dispatch;
mod promise;
mod source;
mod state;

pub use combinators::{
    flatten, when_all, when_all_finalized, when_any, when_any_finalized, when_both, when_either,
};
pub use diagnostics::{clear_unresolved_drop_hook, set_unresolved_drop_hook, UnresolvedDrop};
pub use dispatch::{
    default_executor, set_default_executor, Dispatch, Executor, QueueExecutor,
    SynchronousExecutor, Task,
};
pub use promise::Promise;
pub use source::PromiseSource;

/// Failures produced by the library itself rather than by a producer.
///
/// Error types used with [`when_any`] or with `.await` on a [`Promise`]
/// opt in to these by implementing `From<Error>`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("when_any was called without any promises")]
    EmptyInput,
    #[error("PromiseSource was dropped before it was settled")]
    SourceDropped,
}
