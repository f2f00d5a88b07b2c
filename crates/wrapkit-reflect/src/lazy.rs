//! One-shot resolution cache

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::error::ReflectResult;

/// Resolution state of a [`LazyMember`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// Nothing cached yet
    Unresolved,
    /// Resolved and cached for the lifetime of the cache
    Resolved,
}

/// Lazily resolved, process-lifetime member handle
///
/// The first successful resolution is cached and reused forever; a failed
/// resolution caches nothing, so the next call tries again and reports the
/// same error. No lock is held while resolving: threads racing on first use
/// may each run the resolver, the first finished result is published and
/// every caller ends up with that one. Resolvers must therefore be
/// idempotent, which contract matching is.
#[derive(Debug)]
pub struct LazyMember<M> {
    cell: OnceCell<M>,
}

impl<M> Default for LazyMember<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> LazyMember<M> {
    /// Empty cache
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Cached member, resolving it first if needed
    pub fn get_or_resolve<F>(&self, resolve: F) -> ReflectResult<&M>
    where
        F: FnOnce() -> ReflectResult<M>,
    {
        if let Some(member) = self.cell.get() {
            return Ok(member);
        }

        let resolved = resolve()?;
        trace!("publishing resolved member");
        // A racing thread may have published first; keep its value
        Ok(self.cell.get_or_init(|| resolved))
    }

    /// Cached member without resolving
    pub fn get(&self) -> Option<&M> {
        self.cell.get()
    }

    /// Current state
    pub fn state(&self) -> ResolutionState {
        if self.cell.get().is_some() {
            ResolutionState::Resolved
        } else {
            ResolutionState::Unresolved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReflectError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_resolves_once() {
        let lazy = LazyMember::new();
        let calls = AtomicUsize::new(0);
        let resolve = || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(7)
        };

        assert_eq!(lazy.state(), ResolutionState::Unresolved);
        assert_eq!(*lazy.get_or_resolve(resolve).unwrap(), 7);
        assert_eq!(*lazy.get_or_resolve(resolve).unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(lazy.state(), ResolutionState::Resolved);
    }

    #[test]
    fn test_failure_stays_unresolved() {
        let lazy: LazyMember<u32> = LazyMember::new();
        let result = lazy.get_or_resolve(|| {
            Err(ReflectError::NotAnEnum {
                type_name: "Thing".to_string(),
            })
        });

        assert!(result.is_err());
        assert_eq!(lazy.state(), ResolutionState::Unresolved);
        assert_eq!(*lazy.get_or_resolve(|| Ok(3)).unwrap(), 3);
    }

    #[test]
    fn test_concurrent_first_use_agrees() {
        let lazy = LazyMember::new();
        let values: Vec<usize> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let lazy = &lazy;
                    scope.spawn(move || *lazy.get_or_resolve(|| Ok(i)).unwrap())
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let first = values[0];
        assert!(values.iter().all(|&v| v == first));
        assert_eq!(lazy.get(), Some(&first));
    }
}
