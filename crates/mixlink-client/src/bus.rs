//! In-process fan-out of patches to subscribers.
//!
//! Every subscriber receives every patch; relevance is decided
//! subscriber-side, typically with a [`mixlink_core::PathPattern`].
//! Delivery is synchronous, best-effort, at-most-once: handlers run on the
//! thread that received the frame and must not block for long.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::warn;

use mixlink_core::Patch;

/// A patch handler callback.
pub type PatchHandler = dyn Fn(&Patch) + Send + Sync;

/// Handle returned by [`PatchBus::subscribe`], used to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Registry of patch subscribers.
#[derive(Default)]
pub struct PatchBus {
    subscribers: Mutex<HashMap<u64, Arc<PatchHandler>>>,
    next_id: AtomicU64,
}

impl PatchBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; it receives every subsequently published patch.
    pub fn subscribe(&self, handler: impl Fn(&Patch) + Send + Sync + 'static) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().insert(id, Arc::new(handler));
        SubscriptionId(id)
    }

    /// Detach a handler. Safe to call from inside a handler during
    /// dispatch; a patch already being dispatched may still be delivered.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().remove(&id.0);
    }

    /// Deliver one patch to every current subscriber.
    ///
    /// The subscriber list is snapshotted before iterating, so handlers may
    /// subscribe or unsubscribe mid-dispatch. A panicking handler is caught
    /// and logged; the remaining handlers still receive the patch.
    pub fn publish(&self, patch: &Patch) {
        let handlers: Vec<(u64, Arc<PatchHandler>)> = {
            let subscribers = self.subscribers.lock();
            subscribers.iter().map(|(id, handler)| (*id, Arc::clone(handler))).collect()
        };

        for (id, handler) in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(patch))).is_err() {
                warn!(subscriber = id, path = %patch.path, "Subscriber panicked during dispatch");
            }
        }
    }

    /// Number of attached subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }
}
