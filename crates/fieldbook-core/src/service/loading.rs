// ── Loading state and cancellation ──
//
// `LoadingTracker` counts in-flight calls and publishes "anything in
// flight?" through a `watch` channel. Each call holds a `LoadingGuard`;
// dropping it releases the slot, so every exit path (success, error,
// panic unwind, early return) clears loading. Every guard also carries
// a `CancelHandle` that releases the slot immediately and wakes the
// call, which then resolves to `CoreError::Cancelled`.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use dashmap::DashMap;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::CoreError;

/// Shared in-flight counter with a boolean `watch` view.
#[derive(Clone)]
pub struct LoadingTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    in_flight: Mutex<usize>,
    state: watch::Sender<bool>,
    handles: DashMap<u64, CancelHandle>,
    next_id: AtomicU64,
}

impl TrackerInner {
    fn release(&self, id: u64) {
        self.handles.remove(&id);

        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.state.send_if_modified(|loading| std::mem::replace(loading, false));
        }
    }
}

impl LoadingTracker {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            inner: Arc::new(TrackerInner {
                in_flight: Mutex::new(0),
                state,
                handles: DashMap::new(),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Mark one call as started.
    pub fn begin(&self) -> LoadingGuard {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *in_flight += 1;
            self.inner
                .state
                .send_if_modified(|loading| !std::mem::replace(loading, true));
        }

        let handle = CancelHandle {
            token: CancellationToken::new(),
            slot: Arc::new(Slot {
                id,
                released: AtomicBool::new(false),
                tracker: Arc::downgrade(&self.inner),
            }),
        };
        self.inner.handles.insert(id, handle.clone());
        trace!(call = id, "loading started");

        LoadingGuard { handle }
    }

    pub fn is_loading(&self) -> bool {
        *self.inner.state.borrow()
    }

    /// Number of calls currently holding a slot.
    pub fn in_flight(&self) -> usize {
        *self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.state.subscribe()
    }

    /// Handles of every call still in flight.
    pub fn handles(&self) -> Vec<CancelHandle> {
        self.inner
            .handles
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Cancel every in-flight call. Returns how many were cancelled.
    pub fn cancel_all(&self) -> usize {
        // Collect first: cancelling removes entries from the map.
        let handles = self.handles();
        for handle in &handles {
            handle.cancel();
        }
        handles.len()
    }
}

impl Default for LoadingTracker {
    fn default() -> Self {
        Self::new()
    }
}

// ── Per-call slot ────────────────────────────────────────────────────

#[derive(Debug)]
struct Slot {
    id: u64,
    released: AtomicBool,
    tracker: Weak<TrackerInner>,
}

impl Slot {
    /// Release exactly once, whoever gets here first.
    fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(tracker) = self.tracker.upgrade() {
            tracker.release(self.id);
        }
        trace!(call = self.id, "loading released");
    }
}

/// Cancels one in-flight call. Cloneable; cancelling twice is a no-op.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
    slot: Arc<Slot>,
}

impl CancelHandle {
    /// Clear this call's loading slot now and make the call resolve to
    /// `CoreError::Cancelled`. The transfer itself may still finish in
    /// the background; its result is dropped.
    pub fn cancel(&self) {
        self.token.cancel();
        self.slot.release();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Scoped ownership of one loading slot.
#[derive(Debug)]
pub struct LoadingGuard {
    handle: CancelHandle,
}

impl LoadingGuard {
    pub fn handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// Drive `fut` to completion unless this call is cancelled first.
    /// The slot is released when this returns.
    pub async fn run<T, E, F>(self, fut: F) -> Result<T, CoreError>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<CoreError>,
    {
        let token = self.handle.token.clone();
        tokio::select! {
            biased;
            () = token.cancelled() => Err(CoreError::Cancelled),
            result = fut => result.map_err(Into::into),
        }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.handle.slot.release();
    }
}
