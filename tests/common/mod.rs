#![allow(dead_code)]
use promise_source::{Dispatch, PromiseSource};
use std::sync::{Arc, Mutex};

/// An error carrying a numeric code, standing in for an application's
/// error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub code: i32,
}

pub fn failure(code: i32) -> Failure {
    Failure { code }
}

impl From<promise_source::Error> for Failure {
    fn from(_: promise_source::Error) -> Self {
        Failure { code: -1 }
    }
}

/// A source that delivers on the settling thread, so assertions can follow
/// `resolve`/`reject` directly.
pub fn source<T: Clone + Send + 'static>() -> PromiseSource<T, Failure> {
    PromiseSource::with_dispatch(Dispatch::Synchronous)
}

/// A shared slot written from handlers.
pub fn slot<T>() -> Arc<Mutex<Option<T>>> {
    Arc::new(Mutex::new(None))
}

pub fn log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(vec![]))
}
