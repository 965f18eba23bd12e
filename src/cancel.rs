//! Cancellation handle tree (spec §5 "Cancellation"): a one-way
//! Active -> Cancelled state machine where cancelling a parent cancels
//! every child transitively. Hand-rolled rather than pulling in
//! `tokio-util`'s `CancellationToken`, matching the rest of this crate's
//! preference for small hand-rolled primitives over extra dependencies
//! for a single type.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
    children: Mutex<Vec<Arc<Inner>>>,
}

/// A handle in the cancellation tree. Clones share the same underlying
/// state; `child()` creates a new node that this handle's `cancel()` will
/// also tear down.
#[derive(Clone)]
pub struct CancellationHandle {
    inner: Arc<Inner>,
}

impl Default for CancellationHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
                children: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Creates a child handle. If this handle is already cancelled, the
    /// child is born cancelled.
    pub fn child(&self) -> CancellationHandle {
        let child = CancellationHandle::new();
        if self.is_cancelled() {
            child.cancel();
        } else {
            self.inner.children.lock().push(child.inner.clone());
        }
        child
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Cancels this handle and every descendant. Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.notify.notify_waiters();
        for child in self.inner.children.lock().drain(..) {
            let handle = CancellationHandle { inner: child };
            handle.cancel();
        }
    }

    /// Resolves once this handle is cancelled. Cheap to poll repeatedly:
    /// callers typically `tokio::select!` this against the real work.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_handle_is_not_cancelled() {
        assert!(!CancellationHandle::new().is_cancelled());
    }

    #[test]
    fn cancel_propagates_to_children() {
        let parent = CancellationHandle::new();
        let child = parent.child();
        let grandchild = child.child();
        parent.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
    }

    #[test]
    fn child_of_cancelled_parent_is_born_cancelled() {
        let parent = CancellationHandle::new();
        parent.cancel();
        let child = parent.child();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_future_resolves_after_cancel() {
        let handle = CancellationHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move {
            waiter.cancelled().await;
        });
        handle.cancel();
        task.await.unwrap();
    }
}
