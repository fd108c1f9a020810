/*!
 * Core Types
 * Common types used across the port subsystem
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};
use std::sync::atomic::{AtomicU64, Ordering};

/// Kernel object ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Koid(pub u64);

static NEXT_KOID: AtomicU64 = AtomicU64::new(1);

impl Koid {
    /// Allocate the next object ID (lock-free, never recycled)
    pub fn generate() -> Self {
        Koid(NEXT_KOID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for Koid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-chosen opaque value echoed in generated packets
pub type PacketKey = u64;

/// Signal bitmask on a kernel object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Signals(pub u32);

impl Signals {
    pub const NONE: Signals = Signals(0);
    pub const READABLE: Signals = Signals(1 << 0);
    pub const WRITABLE: Signals = Signals(1 << 1);
    pub const PEER_CLOSED: Signals = Signals(1 << 2);
    pub const SIGNALED: Signals = Signals(1 << 3);

    /// All of `other`'s bits are set
    pub const fn contains(self, other: Signals) -> bool {
        self.0 & other.0 == other.0
    }

    /// At least one of `other`'s bits is set
    pub const fn intersects(self, other: Signals) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Signals {
    type Output = Signals;
    fn bitor(self, rhs: Signals) -> Signals {
        Signals(self.0 | rhs.0)
    }
}

impl BitOrAssign for Signals {
    fn bitor_assign(&mut self, rhs: Signals) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Signals {
    type Output = Signals;
    fn bitand(self, rhs: Signals) -> Signals {
        Signals(self.0 & rhs.0)
    }
}

impl BitAndAssign for Signals {
    fn bitand_assign(&mut self, rhs: Signals) {
        self.0 &= rhs.0;
    }
}

impl Not for Signals {
    type Output = Signals;
    fn not(self) -> Signals {
        Signals(!self.0)
    }
}

impl fmt::Display for Signals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Access rights minted with a port handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rights(pub u32);

impl Rights {
    pub const DUPLICATE: Rights = Rights(1 << 0);
    pub const TRANSFER: Rights = Rights(1 << 1);
    pub const READ: Rights = Rights(1 << 2);
    pub const WRITE: Rights = Rights(1 << 3);

    /// Default rights minted by the port factory
    pub const DEFAULT: Rights =
        Rights(Self::DUPLICATE.0 | Self::TRANSFER.0 | Self::READ.0 | Self::WRITE.0);

    pub const fn contains(self, other: Rights) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Rights {
    type Output = Rights;
    fn bitor(self, rhs: Rights) -> Rights {
        Rights(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_koid_monotonic() {
        let a = Koid::generate();
        let b = Koid::generate();
        assert_ne!(a, b);
        assert!(b.0 > a.0);
    }

    #[test]
    fn test_signal_ops() {
        let s = Signals::READABLE | Signals::PEER_CLOSED;
        assert!(s.contains(Signals::READABLE));
        assert!(s.intersects(Signals::PEER_CLOSED | Signals::WRITABLE));
        assert!(!s.intersects(Signals::WRITABLE));
        assert!((s & !Signals::READABLE) == Signals::PEER_CLOSED);
        assert!(Signals::NONE.is_empty());
    }

    #[test]
    fn test_default_rights() {
        assert!(Rights::DEFAULT.contains(Rights::READ));
        assert!(Rights::DEFAULT.contains(Rights::WRITE));
        assert!(Rights::DEFAULT.contains(Rights::DUPLICATE | Rights::TRANSFER));
    }
}
