/*!
 * Event Port Library
 * Kernel event-aggregation primitive: a FIFO of notification packets
 * drained by blocking waiters and fed by producers or signal observers
 */

pub mod core;
pub mod port;
pub mod signal;
pub mod usercopy;

// Re-exports
pub use crate::core::errors::{PortError, PortResult};
pub use crate::core::types::{Koid, PacketKey, Rights, Signals};
pub use port::{
    PacketKind, PortDispatcher, PortOptions, PortPacket, PortStats, SignalPayload,
};
pub use signal::{SignalObserver, SignalTracker, Waitable};
pub use usercopy::{BufferCopy, UserAddr, UserCopy};
