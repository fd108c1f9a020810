/*!
 * Signal Tracker
 * Per-object signal bitmask with observer fanout and cancellation
 */

use super::traits::SignalObserver;
use crate::core::errors::{PortError, PortResult};
use crate::core::types::{Koid, Signals};
use log::debug;
use parking_lot::Mutex;
use std::sync::Arc;

struct TrackerInner {
    asserted: Signals,
    observers: Vec<Arc<dyn SignalObserver>>,
    cancelled: bool,
}

/// Tracks the current signal state of one kernel object and fans out
/// notifications to registered observers.
///
/// The tracker lock is never held across an observer callback, so a
/// callback may freely take the port lock (the reverse nesting never
/// happens: port code calls into the tracker only with its own lock
/// released).
pub struct SignalTracker {
    koid: Koid,
    waitable: bool,
    inner: Mutex<TrackerInner>,
}

impl SignalTracker {
    /// Create a waitable tracker with no signals asserted
    pub fn new() -> Arc<Self> {
        Self::with_waitable(true)
    }

    /// Create a tracker that reports itself not waitable (objects that
    /// carry state but cannot be bound to a port)
    pub fn unwaitable() -> Arc<Self> {
        Self::with_waitable(false)
    }

    fn with_waitable(waitable: bool) -> Arc<Self> {
        Arc::new(Self {
            koid: Koid::generate(),
            waitable,
            inner: Mutex::new(TrackerInner {
                asserted: Signals::NONE,
                observers: Vec::new(),
                cancelled: false,
            }),
        })
    }

    pub fn koid(&self) -> Koid {
        self.koid
    }

    pub fn is_waitable(&self) -> bool {
        self.waitable
    }

    /// Current asserted signal state
    pub fn asserted(&self) -> Signals {
        self.inner.lock().asserted
    }

    /// Register an observer for subsequent state changes.
    ///
    /// Fails NotAvailable once the object has been cancelled; a
    /// registration racing with teardown must not be silently dropped.
    pub fn add_observer(&self, observer: Arc<dyn SignalObserver>) -> PortResult<()> {
        let mut inner = self.inner.lock();
        if inner.cancelled {
            return Err(PortError::NotAvailable);
        }
        inner.observers.push(observer);
        Ok(())
    }

    /// Deregister an observer; unknown observers are ignored
    pub fn remove_observer(&self, observer: &dyn SignalObserver) {
        let target = observer as *const dyn SignalObserver as *const ();
        let mut inner = self.inner.lock();
        inner
            .observers
            .retain(|o| Arc::as_ptr(o) as *const () != target);
    }

    /// Assert signals and notify every observer with the new state
    pub fn assert_signals(&self, signals: Signals) {
        let (current, observers) = {
            let mut inner = self.inner.lock();
            if inner.cancelled {
                return;
            }
            inner.asserted |= signals;
            (inner.asserted, inner.observers.clone())
        };

        for observer in observers {
            observer.on_signal(current);
        }
    }

    /// Clear signals. No fanout: observers only hear about asserted
    /// state, matching edge-style delivery.
    pub fn deassert_signals(&self, signals: Signals) {
        let mut inner = self.inner.lock();
        inner.asserted &= !signals;
    }

    /// Deliver the cancellation notice to every registered observer
    /// and drop the registrations. Idempotent.
    pub fn cancel(&self) {
        let observers = {
            let mut inner = self.inner.lock();
            if inner.cancelled {
                return;
            }
            inner.cancelled = true;
            std::mem::take(&mut inner.observers)
        };

        if !observers.is_empty() {
            debug!(
                "tracker {}: cancelling {} observer(s)",
                self.koid,
                observers.len()
            );
        }
        for observer in observers {
            observer.on_cancel();
        }
    }
}
