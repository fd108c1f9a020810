/*!
 * Lock-Free Port Statistics
 * Atomic counters for allocation accounting and queue monitoring
 */

use super::types::PortStats;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic port statistics for lock-free updates
///
/// # Performance
/// - Cache-line aligned to prevent false sharing
/// - All operations use relaxed ordering
/// - Read-only snapshot requires no synchronization
#[repr(C, align(64))]
pub struct AtomicPortStats {
    packets_allocated: AtomicU64,
    packets_freed: AtomicU64,
    packets_queued: AtomicU64,
    packets_delivered: AtomicU64,
    packets_rejected: AtomicU64,
    observers_allocated: AtomicU64,
    observers_freed: AtomicU64,
}

impl AtomicPortStats {
    #[inline]
    pub const fn new() -> Self {
        Self {
            packets_allocated: AtomicU64::new(0),
            packets_freed: AtomicU64::new(0),
            packets_queued: AtomicU64::new(0),
            packets_delivered: AtomicU64::new(0),
            packets_rejected: AtomicU64::new(0),
            observers_allocated: AtomicU64::new(0),
            observers_freed: AtomicU64::new(0),
        }
    }

    /// Hot path - called on every packet allocation
    #[inline(always)]
    pub fn inc_packets_allocated(&self) {
        self.packets_allocated.fetch_add(1, Ordering::Relaxed);
    }

    /// Hot path - called from every packet drop
    #[inline(always)]
    pub fn inc_packets_freed(&self) {
        self.packets_freed.fetch_add(1, Ordering::Relaxed);
    }

    /// Hot path - called on every successful enqueue
    #[inline(always)]
    pub fn inc_packets_queued(&self) {
        self.packets_queued.fetch_add(1, Ordering::Relaxed);
    }

    /// Hot path - called on every successful wait
    #[inline(always)]
    pub fn inc_packets_delivered(&self) {
        self.packets_delivered.fetch_add(1, Ordering::Relaxed);
    }

    /// Called when an enqueue is rejected after the last client is gone
    #[inline(always)]
    pub fn inc_packets_rejected(&self) {
        self.packets_rejected.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_observers_allocated(&self) {
        self.observers_allocated.fetch_add(1, Ordering::Relaxed);
    }

    #[inline(always)]
    pub fn inc_observers_freed(&self) {
        self.observers_freed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of current stats (no locks required)
    ///
    /// # Note
    /// Values may not be perfectly consistent with each other under
    /// concurrent updates, but each individual value is accurate.
    #[inline]
    pub fn snapshot(&self) -> PortStats {
        PortStats {
            packets_allocated: self.packets_allocated.load(Ordering::Relaxed),
            packets_freed: self.packets_freed.load(Ordering::Relaxed),
            packets_queued: self.packets_queued.load(Ordering::Relaxed),
            packets_delivered: self.packets_delivered.load(Ordering::Relaxed),
            packets_rejected: self.packets_rejected.load(Ordering::Relaxed),
            observers_allocated: self.observers_allocated.load(Ordering::Relaxed),
            observers_freed: self.observers_freed.load(Ordering::Relaxed),
        }
    }
}

impl Default for AtomicPortStats {
    fn default() -> Self {
        Self::new()
    }
}
