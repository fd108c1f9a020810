/*!
 * Port Observer
 * Binding record bridging a target's signal state into queued packets
 */

use super::dispatcher::PortDispatcher;
use super::packet::PortPacket;
use crate::core::types::{PacketKey, Signals};
use crate::signal::{SignalObserver, SignalTracker};
use log::{debug, warn};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Terminal-state cell values. The NEW → terminal transition happens
/// exactly once; whichever path loses the CAS performs no mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ObserverState {
    New = 0,
    /// Explicit unbind won the race
    Unbound = 1,
    /// The target's cancellation notice won the race
    Cancelled = 2,
}

/// One binding of {target, signal mask, key} registered on a port.
///
/// Holds a strong reference to the dispatcher for its whole lifetime,
/// so a port with live observers can never be destroyed; the
/// dispatcher's observer set is membership only.
pub struct PortObserver {
    port: Arc<PortDispatcher>,
    target: Arc<SignalTracker>,
    mask: Signals,
    key: PacketKey,
    state: AtomicU8,
}

impl PortObserver {
    pub(super) fn new(
        port: Arc<PortDispatcher>,
        target: Arc<SignalTracker>,
        mask: Signals,
        key: PacketKey,
    ) -> Self {
        port.accounting().inc_observers_allocated();
        Self {
            port,
            target,
            mask,
            key,
            state: AtomicU8::new(ObserverState::New as u8),
        }
    }

    pub fn key(&self) -> PacketKey {
        self.key
    }

    pub fn mask(&self) -> Signals {
        self.mask
    }

    pub(super) fn target(&self) -> &Arc<SignalTracker> {
        &self.target
    }

    /// Attempt the exactly-once NEW → terminal transition. Returns
    /// whether this caller won and therefore owns cleanup.
    pub(super) fn transition(&self, to: ObserverState) -> bool {
        self.state
            .compare_exchange(
                ObserverState::New as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl SignalObserver for PortObserver {
    fn on_signal(&self, asserted: Signals) {
        if !asserted.intersects(self.mask) {
            return;
        }

        match PortPacket::make_signal(self.key, asserted, self.port.accounting()) {
            Ok(packet) => {
                if let Err(e) = self.port.queue(packet) {
                    debug!("signal packet for key {} dropped: {}", self.key, e);
                }
            }
            Err(e) => warn!("signal packet allocation failed for key {}: {}", self.key, e),
        }
    }

    fn on_cancel(&self) {
        if self.transition(ObserverState::Cancelled) {
            self.port.erase_observer(self);
        }
        // Losing the race means unbind already removed us
    }
}

impl Drop for PortObserver {
    fn drop(&mut self) {
        self.port.accounting().inc_observers_freed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_exactly_once() {
        let (port, _rights) = PortDispatcher::create(Default::default());
        let tracker = SignalTracker::new();
        let observer = PortObserver::new(port, tracker, Signals::READABLE, 7);

        assert!(observer.transition(ObserverState::Unbound));
        assert!(!observer.transition(ObserverState::Cancelled));
        assert!(!observer.transition(ObserverState::Unbound));
    }
}
