/*!
 * Port Dispatcher
 * Orchestrates the packet FIFO and the live observer set
 */

use super::observer::{ObserverState, PortObserver};
use super::packet::PortPacket;
use super::queue::PacketFifo;
use super::stats::AtomicPortStats;
use super::types::{PortOptions, PortStats, MAX_PACKET_SIZE};
use crate::core::errors::{PortError, PortResult};
use crate::core::types::{Koid, PacketKey, Rights, Signals};
use crate::signal::Waitable;
use crate::usercopy::{UserAddr, UserCopy};
use log::{debug, info};
use parking_lot::{Condvar, Mutex};
use std::sync::{Arc, Weak};

struct PortInner {
    packets: PacketFifo,
    observers: Vec<Arc<PortObserver>>,
    no_clients: bool,
}

/// The port: a FIFO of packets drained by blocking waiters.
///
/// One mutex guards both the FIFO and the observer set; critical
/// sections are short list operations and the lock is never held
/// across a blocking call or a call into a signal tracker.
pub struct PortDispatcher {
    koid: Koid,
    options: PortOptions,
    rights: Rights,
    stats: Arc<AtomicPortStats>,
    weak_self: Weak<PortDispatcher>,
    inner: Mutex<PortInner>,
    available: Condvar,
}

impl PortDispatcher {
    /// Create a port, minting the default rights set
    pub fn create(options: PortOptions) -> (Arc<Self>, Rights) {
        let port = Arc::new_cyclic(|weak| Self {
            koid: Koid::generate(),
            options,
            rights: Rights::DEFAULT,
            stats: Arc::new(AtomicPortStats::new()),
            weak_self: weak.clone(),
            inner: Mutex::new(PortInner {
                packets: PacketFifo::new(),
                observers: Vec::new(),
                no_clients: false,
            }),
            available: Condvar::new(),
        });

        info!("port {} created", port.koid);
        (port, Rights::DEFAULT)
    }

    pub fn koid(&self) -> Koid {
        self.koid
    }

    pub fn options(&self) -> PortOptions {
        self.options
    }

    pub fn rights(&self) -> Rights {
        self.rights
    }

    /// Allocation accounting cell shared with this port's packets
    pub fn accounting(&self) -> &Arc<AtomicPortStats> {
        &self.stats
    }

    /// Statistics snapshot
    pub fn stats(&self) -> PortStats {
        self.stats.snapshot()
    }

    /// Queued packets not yet drained by a waiter
    pub fn depth(&self) -> usize {
        self.inner.lock().packets.len()
    }

    /// Append a packet in strict FIFO order and wake one waiter.
    ///
    /// After the last client is gone the packet is freed here and the
    /// call fails NotAvailable; the caller keeps nothing.
    pub fn queue(&self, packet: PortPacket) -> PortResult<()> {
        let mut inner = self.inner.lock();
        if inner.no_clients {
            drop(inner);
            self.stats.inc_packets_rejected();
            drop(packet);
            return Err(PortError::NotAvailable);
        }

        inner.packets.push(packet);
        let woke = self.available.notify_one();
        drop(inner);

        self.stats.inc_packets_queued();
        if woke {
            // Scheduling hint only: let the consumer run promptly
            std::thread::yield_now();
        }
        Ok(())
    }

    /// Copy a user buffer into a USER packet and queue it
    pub fn queue_user(
        &self,
        copier: &dyn UserCopy,
        src: UserAddr,
        size: usize,
    ) -> PortResult<()> {
        if size > MAX_PACKET_SIZE {
            return Err(PortError::OutOfMemory);
        }
        let packet = PortPacket::make_from_user(copier, src, size, &self.stats)?;
        self.queue(packet)
    }

    /// Block until a packet is available and pop it, transferring
    /// ownership to the caller.
    ///
    /// Re-checks the FIFO after every wake, so stolen and spurious
    /// wakeups are absorbed. Fails NotAvailable only once the port has
    /// been drained after the last client is gone.
    pub fn wait(&self) -> PortResult<PortPacket> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(packet) = inner.packets.pop() {
                self.stats.inc_packets_delivered();
                return Ok(packet);
            }
            if inner.no_clients {
                return Err(PortError::NotAvailable);
            }
            self.available.wait(&mut inner);
        }
    }

    /// Bind a target's signal interest to this port.
    ///
    /// The observer joins the local set before external registration so
    /// a concurrently delivered notification always finds a consistent
    /// record; a failed registration unwinds the local insert.
    pub fn bind(&self, target: &dyn Waitable, mask: Signals, key: PacketKey) -> PortResult<()> {
        let tracker = target.state_tracker().ok_or(PortError::NotSupported)?;
        if !tracker.is_waitable() {
            return Err(PortError::NotSupported);
        }

        // Upgrade cannot fail while a caller holds this port
        let port = self.weak_self.upgrade().ok_or(PortError::NotAvailable)?;
        let observer = Arc::new(PortObserver::new(
            port,
            Arc::clone(&tracker),
            mask,
            key,
        ));

        {
            let mut inner = self.inner.lock();
            // Duplicate (target, key) bindings are tolerated; unbind
            // removes the first match
            inner.observers.push(Arc::clone(&observer));
        }

        if let Err(e) = tracker.add_observer(observer.clone()) {
            self.cancel_observer(&observer);
            return Err(e);
        }

        debug!(
            "port {}: bound key {} to tracker {} (mask {})",
            self.koid,
            key,
            tracker.koid(),
            mask
        );
        Ok(())
    }

    /// Unbind the first observer matching (target identity, key).
    ///
    /// Races with the target's cancellation notice: the observer's
    /// atomic state cell decides which path cleans up, and losing the
    /// race is a successful no-op.
    pub fn unbind(&self, target: &dyn Waitable, key: PacketKey) -> PortResult<()> {
        let tracker = target.state_tracker().ok_or(PortError::BadHandle)?;

        let observer = {
            let mut inner = self.inner.lock();
            let index = inner
                .observers
                .iter()
                .position(|o| Arc::ptr_eq(o.target(), &tracker) && o.key() == key)
                .ok_or(PortError::BadHandle)?;

            if !inner.observers[index].transition(ObserverState::Unbound) {
                // Cancellation already owns cleanup
                return Ok(());
            }
            inner.observers.remove(index)
        };

        tracker.remove_observer(observer.as_ref());
        debug!("port {}: unbound key {}", self.koid, key);
        Ok(())
    }

    /// Unwind helper for a failed bind: unconditionally drop the set
    /// membership. Never used in the unbind/cancel race; those go
    /// through the atomic state cell.
    pub(super) fn cancel_observer(&self, observer: &Arc<PortObserver>) {
        self.erase_observer(observer.as_ref());
    }

    /// Remove one observer from the set by identity
    pub(super) fn erase_observer(&self, observer: &PortObserver) {
        let mut inner = self.inner.lock();
        inner
            .observers
            .retain(|o| !std::ptr::eq(Arc::as_ptr(o), observer));
    }

    /// Invoked by the handle-close path when the last handle to this
    /// port goes away: reject future enqueues and free everything a
    /// consumer can no longer drain.
    pub fn on_zero_handles(&self) {
        let freed = {
            let mut inner = self.inner.lock();
            inner.no_clients = true;
            let freed = inner.packets.drain();
            self.available.notify_all();
            freed
        };

        if freed > 0 {
            info!("port {}: closed, dropped {} undelivered packet(s)", self.koid, freed);
        } else {
            info!("port {}: closed", self.koid);
        }
    }

    #[cfg(test)]
    pub(super) fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }
}

impl Drop for PortDispatcher {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        inner.packets.drain();
        debug_assert!(inner.packets.is_empty());
        // Observers hold a strong reference to the port, so reaching
        // the destructor with a non-empty set is a programming error
        debug_assert!(
            inner.observers.is_empty(),
            "port destroyed with live observers"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalTracker;

    #[test]
    fn test_queue_and_wait_fifo() {
        let (port, _rights) = PortDispatcher::create(PortOptions::default());
        for payload in [b"A", b"B", b"C"] {
            let packet =
                PortPacket::make_from_buffer(payload, port.accounting()).unwrap();
            port.queue(packet).unwrap();
        }

        assert_eq!(port.wait().unwrap().payload(), b"A");
        assert_eq!(port.wait().unwrap().payload(), b"B");
        assert_eq!(port.wait().unwrap().payload(), b"C");
        assert_eq!(port.depth(), 0);
    }

    #[test]
    fn test_queue_after_zero_handles() {
        let (port, _rights) = PortDispatcher::create(PortOptions::default());
        port.on_zero_handles();

        let packet = PortPacket::make_from_buffer(b"late", port.accounting()).unwrap();
        assert_eq!(port.queue(packet), Err(PortError::NotAvailable));
        // The rejected packet was freed synchronously
        assert_eq!(port.stats().packets_live(), 0);
        assert_eq!(port.stats().packets_rejected, 1);
    }

    #[test]
    fn test_bind_not_waitable() {
        let (port, _rights) = PortDispatcher::create(PortOptions::default());
        let tracker = SignalTracker::unwaitable();

        let before = port.stats().observers_allocated;
        assert_eq!(
            port.bind(&tracker, Signals::READABLE, 1),
            Err(PortError::NotSupported)
        );
        assert_eq!(port.stats().observers_allocated, before);
        assert_eq!(port.observer_count(), 0);
    }

    #[test]
    fn test_bind_registration_failure_unwinds() {
        let (port, _rights) = PortDispatcher::create(PortOptions::default());
        let tracker = SignalTracker::new();
        tracker.cancel();

        assert_eq!(
            port.bind(&tracker, Signals::READABLE, 1),
            Err(PortError::NotAvailable)
        );
        assert_eq!(port.observer_count(), 0);
        assert_eq!(port.stats().observers_live(), 0);
    }

    #[test]
    fn test_unbind_unknown_key() {
        let (port, _rights) = PortDispatcher::create(PortOptions::default());
        let tracker = SignalTracker::new();
        assert_eq!(port.unbind(&tracker, 9), Err(PortError::BadHandle));
    }
}
