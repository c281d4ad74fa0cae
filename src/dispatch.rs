//! Execution context on which discovery callbacks are delivered.

use std::future::Future;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Explicit execution context for callback delivery.
///
/// Wraps a tokio runtime [`Handle`]. Sessions carry a default target chosen
/// when the manager is built; individual operations may override it.
#[derive(Debug, Clone)]
pub struct DispatchTarget {
    handle: Handle,
}

impl DispatchTarget {
    /// Use the given runtime handle.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Use the runtime the caller is currently running on, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    /// The underlying runtime handle.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Run a future on this target.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(fut)
    }
}

impl From<Handle> for DispatchTarget {
    fn from(handle: Handle) -> Self {
        Self::new(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_is_none_outside_a_runtime() {
        assert!(DispatchTarget::current().is_none());
    }

    #[tokio::test]
    async fn spawns_on_the_wrapped_runtime() {
        let target = DispatchTarget::current().expect("inside runtime");
        let out = target.spawn(async { 41 + 1 }).await.unwrap();
        assert_eq!(out, 42);
    }
}
