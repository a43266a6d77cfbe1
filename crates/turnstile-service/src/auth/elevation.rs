//! Scoped privilege elevation.
//!
//! Identity and credential lookups run on behalf of the system, not the
//! requester. Store methods take a [`SystemAccount`] so a lookup cannot be
//! written without first elevating, and dropping the guard ends the
//! elevation on every exit path.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Per-request elevation state.
#[derive(Debug, Default)]
pub struct SecurityContext {
    depth: AtomicUsize,
}

impl SecurityContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// ## Summary
    /// Enters the system account until the returned guard is dropped.
    ///
    /// Elevations nest.
    #[must_use = "elevation ends when the guard is dropped"]
    pub fn elevate(&self) -> SystemAccount<'_> {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(depth, "Entering system account");
        SystemAccount { context: self }
    }

    #[must_use]
    pub fn is_elevated(&self) -> bool {
        self.depth() > 0
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

/// Proof of elevation, borrowed from a [`SecurityContext`].
#[derive(Debug)]
pub struct SystemAccount<'a> {
    context: &'a SecurityContext,
}

impl Drop for SystemAccount<'_> {
    fn drop(&mut self) {
        let previous = self.context.depth.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(depth = previous - 1, "Leaving system account");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn elevation_nests_and_releases() {
        let context = SecurityContext::new();
        assert!(!context.is_elevated());

        {
            let _outer = context.elevate();
            assert_eq!(context.depth(), 1);
            {
                let _inner = context.elevate();
                assert_eq!(context.depth(), 2);
            }
            assert_eq!(context.depth(), 1);
        }

        assert!(!context.is_elevated());
    }

    #[test_log::test]
    fn elevation_released_on_error_path() {
        fn failing_lookup(context: &SecurityContext) -> Result<(), &'static str> {
            let _scope = context.elevate();
            Err("store unavailable")
        }

        let context = SecurityContext::new();
        assert!(failing_lookup(&context).is_err());
        assert_eq!(context.depth(), 0);
    }

    #[test_log::test]
    fn elevation_released_on_unwind() {
        let context = SecurityContext::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = context.elevate();
            panic!("lookup panicked");
        }));

        assert!(result.is_err());
        assert_eq!(context.depth(), 0);
    }
}
