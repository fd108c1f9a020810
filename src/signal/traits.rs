/*!
 * Signal Traits
 * Observer callback surface and the waitable-object seam
 */

use super::tracker::SignalTracker;
use crate::core::types::Signals;
use std::sync::Arc;

/// Callback surface a signal tracker notifies asynchronously.
///
/// Both callbacks may arrive from the tracker owner's thread context,
/// concurrently with any other operation on the receiver.
pub trait SignalObserver: Send + Sync {
    /// The target's asserted signal state changed; `asserted` is the
    /// full current state, not a delta
    fn on_signal(&self, asserted: Signals);

    /// The target is being cancelled or destroyed. Delivered at most
    /// once per registration.
    fn on_cancel(&self);
}

/// An object that may expose a signal-state tracker.
///
/// Objects without a tracker (or with a non-waitable one) cannot be
/// bound to a port.
pub trait Waitable {
    fn state_tracker(&self) -> Option<Arc<SignalTracker>>;
}

/// A bare tracker is itself waitable, which keeps tests and simple
/// objects free of wrapper types.
impl Waitable for Arc<SignalTracker> {
    fn state_tracker(&self) -> Option<Arc<SignalTracker>> {
        Some(Arc::clone(self))
    }
}
