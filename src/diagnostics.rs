//! Reporting of sources that are dropped before they settle.
//!
//! Such a source can never settle its promise, so every continuation
//! registered on it is silently lost. Sources opt in to the report with
//! [`PromiseSource::set_warn_unresolved_drop`](crate::PromiseSource::set_warn_unresolved_drop).
//! By default reports go to the `log` facade at warn level; a hook installed
//! with [`set_unresolved_drop_hook`] receives them instead.
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// An unresolved `PromiseSource<T, E>` lost its last handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnresolvedDrop {
    pub value_type: &'static str,
    pub error_type: &'static str,
}

impl UnresolvedDrop {
    pub(crate) fn of<T, E>() -> Self {
        Self {
            value_type: std::any::type_name::<T>(),
            error_type: std::any::type_name::<E>(),
        }
    }
}

impl fmt::Display for UnresolvedDrop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unresolved PromiseSource<{}, {}> dropped; its promise will never settle",
            self.value_type, self.error_type
        )
    }
}

type Hook = Arc<dyn Fn(&UnresolvedDrop) + Send + Sync + 'static>;

lazy_static::lazy_static! {
    static ref HOOK: RwLock<Option<Hook>> = RwLock::new(None);
}

pub fn set_unresolved_drop_hook<F>(hook: F)
where
    F: Fn(&UnresolvedDrop) + Send + Sync + 'static,
{
    // The old hook is dropped after the lock is released: it may own
    // sources whose drop reports through `HOOK`.
    let previous = HOOK.write().replace(Arc::new(hook));
    drop(previous);
}

/// Restores the default of logging reports.
pub fn clear_unresolved_drop_hook() {
    let previous = HOOK.write().take();
    drop(previous);
}

pub(crate) fn report(event: UnresolvedDrop) {
    // Cloned out so the hook may itself replace the hook.
    let hook = HOOK.read().clone();
    match hook {
        Some(hook) => hook(&event),
        None => log::warn!("{}", event),
    }
}
