//! World update events and their connections.
//!
//! A host fires [`UpdateInfo`] once per simulation step through an
//! [`EventHub`]. Listeners register an [`UpdateCallback`] and receive a
//! [`Connection`]; dropping the connection disconnects the listener.
//!
//! The hub invokes callbacks outside of its own lock, so a callback may
//! connect or disconnect listeners without deadlocking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sim_types::SimTime;
use tracing::trace;

/// Thread-safe callback wrapper that implements Debug.
///
/// Wraps `Arc<dyn Fn(...) + Send + Sync>` and provides a Debug impl
/// (since `dyn Fn` doesn't implement Debug).
pub struct Callback<F: ?Sized>(pub Arc<F>);

impl<F: ?Sized> Clone for Callback<F> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<F: ?Sized> fmt::Debug for Callback<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(<fn>)")
    }
}

/// Per-step world update callback.
pub type UpdateCallback = Callback<dyn Fn(&UpdateInfo) + Send + Sync>;

impl Callback<dyn Fn(&UpdateInfo) + Send + Sync> {
    /// Wrap a closure as an update callback.
    pub fn new(f: impl Fn(&UpdateInfo) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }
}

/// Information passed to update callbacks at the start of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateInfo {
    /// Simulated time at the start of the step.
    pub sim_time: SimTime,
    /// Number of steps taken so far, including this one.
    pub iteration: u64,
}

/// A list of update listeners.
#[derive(Debug, Default)]
pub struct EventHub {
    slots: Mutex<Vec<(u64, UpdateCallback)>>,
    next_id: AtomicU64,
}

impl EventHub {
    /// Create an empty hub.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a listener. It stays connected while the returned
    /// [`Connection`] is alive.
    pub fn connect(self: &Arc<Self>, callback: UpdateCallback) -> Connection {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.slots.lock().push((id, callback));
        trace!(id, "update listener connected");
        Connection {
            hub: Arc::downgrade(self),
            id,
        }
    }

    /// Invoke every connected listener in connection order.
    pub fn fire(&self, info: &UpdateInfo) {
        let callbacks: Vec<UpdateCallback> =
            self.slots.lock().iter().map(|(_, cb)| cb.clone()).collect();
        for callback in callbacks {
            (callback.0)(info);
        }
    }

    /// Number of connected listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns true if nothing is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    fn disconnect(&self, id: u64) {
        self.slots.lock().retain(|(slot, _)| *slot != id);
        trace!(id, "update listener disconnected");
    }
}

/// RAII handle for a connected listener.
#[derive(Debug)]
#[must_use = "dropping a Connection disconnects the listener"]
pub struct Connection {
    hub: Weak<EventHub>,
    id: u64,
}

impl Connection {
    /// Returns true while the hub is alive and the listener registered.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.hub
            .upgrade()
            .is_some_and(|hub| hub.slots.lock().iter().any(|(id, _)| *id == self.id))
    }

    /// Disconnect explicitly.
    pub fn disconnect(self) {}
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.disconnect(self.id);
        }
    }
}
