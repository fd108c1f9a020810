/*!
 * Port Module
 * Packet queue, observer bindings, and dispatcher lifecycle
 */

pub mod dispatcher;
pub mod observer;
pub mod packet;
pub mod queue;
pub mod stats;
pub mod types;

// Re-export public API
pub use dispatcher::PortDispatcher;
pub use observer::{ObserverState, PortObserver};
pub use packet::PortPacket;
pub use stats::AtomicPortStats;
pub use types::{PacketKind, PortOptions, PortStats, SignalPayload, MAX_PACKET_SIZE};
