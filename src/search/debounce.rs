//! Debounce gate
//!
//! Holds at most one pending invocation. Scheduling a new one discards the
//! previous before arming its own timer.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct Pending {
    id: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct Slot {
    pending: Mutex<Option<Pending>>,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, Option<Pending>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Single-slot debounce timer
pub struct DebounceGate {
    slot: Arc<Slot>,
    next_id: AtomicU64,
}

impl DebounceGate {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Slot::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Run `trigger` after `delay` unless another call to `schedule` or
    /// `cancel` comes first. Must be called within a tokio runtime.
    pub fn schedule<F>(&self, delay: Duration, trigger: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        if let Some(previous) = self.slot.lock().replace(Pending {
            id,
            token: token.clone(),
        }) {
            previous.token.cancel();
        }

        let slot = self.slot.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Debounced trigger {} discarded", id);
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }

            {
                let mut pending = slot.lock();
                // Lost a race with a newer schedule or a cancel
                if pending.as_ref().map(|p| p.id) != Some(id) {
                    return;
                }
                *pending = None;
            }

            trigger.await;
        });
    }

    /// Discard the pending invocation, if any
    pub fn cancel(&self) {
        if let Some(pending) = self.slot.lock().take() {
            pending.token.cancel();
        }
    }

    pub fn has_pending(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl Default for DebounceGate {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DebounceGate {
    fn drop(&mut self) {
        self.cancel();
    }
}
