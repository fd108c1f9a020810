/*!
 * Port Types
 * Common types and constants for the packet queue
 */

use crate::core::types::{PacketKey, Signals};
use serde::{Deserialize, Serialize};

/// Externally imposed cap on a single user packet payload
pub const MAX_PACKET_SIZE: usize = 1024 * 1024; // 1MB

/// Packet origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PacketKind {
    /// Submitted by a producer from user space
    User,
    /// Synthesized by the signal notification path
    Signal,
}

/// Payload carried by a SIGNAL-kind packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalPayload {
    /// Key chosen at bind time, echoed back to the consumer
    pub key: PacketKey,
    /// Signal state observed when the binding fired
    pub observed: Signals,
    /// Microseconds since the Unix epoch at synthesis time
    pub timestamp: u64,
}

/// Port creation options (opaque to this layer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortOptions(pub u32);

/// Port statistics snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PortStats {
    pub packets_allocated: u64,
    pub packets_freed: u64,
    pub packets_queued: u64,
    pub packets_delivered: u64,
    pub packets_rejected: u64,
    pub observers_allocated: u64,
    pub observers_freed: u64,
}

impl PortStats {
    /// Packets currently alive (allocated but not yet freed)
    pub fn packets_live(&self) -> u64 {
        self.packets_allocated - self.packets_freed
    }

    /// Observers currently alive
    pub fn observers_live(&self) -> u64 {
        self.observers_allocated - self.observers_freed
    }
}
