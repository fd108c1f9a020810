/*!
 * Port Packet
 * Variable-length delivery unit with exclusive ownership semantics
 */

use super::stats::AtomicPortStats;
use super::types::{PacketKind, SignalPayload};
use crate::core::errors::{PortError, PortResult};
use crate::core::types::{PacketKey, Signals};
use crate::usercopy::{UserAddr, UserCopy};
use std::fmt;
use std::sync::Arc;

/// One delivered unit: header fields plus an owned payload buffer.
///
/// A packet is exclusively held by exactly one of the allocator that
/// created it, the queue, or the consumer that popped it. It is never
/// shared and never reference-counted; `Drop` is the single release
/// point, which keeps the allocation accounting exact.
pub struct PortPacket {
    kind: PacketKind,
    key: PacketKey,
    signals: Signals,
    payload: Vec<u8>,
    stats: Arc<AtomicPortStats>,
}

impl PortPacket {
    /// Allocate a zeroed packet of the given payload size
    pub fn alloc(size: usize, stats: &Arc<AtomicPortStats>) -> PortResult<Self> {
        let mut payload = Vec::new();
        payload
            .try_reserve_exact(size)
            .map_err(|_| PortError::OutOfMemory)?;
        payload.resize(size, 0);

        stats.inc_packets_allocated();
        Ok(Self {
            kind: PacketKind::Signal,
            key: 0,
            signals: Signals::NONE,
            payload,
            stats: Arc::clone(stats),
        })
    }

    /// Synthesize a SIGNAL-kind packet from a kernel-owned buffer
    pub fn make_from_buffer(data: &[u8], stats: &Arc<AtomicPortStats>) -> PortResult<Self> {
        let mut packet = Self::alloc(data.len(), stats)?;
        packet.payload.copy_from_slice(data);
        Ok(packet)
    }

    /// Build a USER-kind packet from a caller address space.
    ///
    /// A failed copy discards the partially built packet; no partial
    /// payload is ever observable.
    pub fn make_from_user(
        copier: &dyn UserCopy,
        src: UserAddr,
        size: usize,
        stats: &Arc<AtomicPortStats>,
    ) -> PortResult<Self> {
        let mut packet = Self::alloc(size, stats)?;
        copier.copy_in(&mut packet.payload, src)?;
        packet.kind = PacketKind::User;
        Ok(packet)
    }

    /// Synthesize the packet delivered when a bound signal fires
    pub(crate) fn make_signal(
        key: PacketKey,
        observed: Signals,
        stats: &Arc<AtomicPortStats>,
    ) -> PortResult<Self> {
        let info = SignalPayload {
            key,
            observed,
            timestamp: timestamp_micros(),
        };
        let bytes = bincode::serialize(&info).map_err(|_| PortError::OutOfMemory)?;

        let mut packet = Self::make_from_buffer(&bytes, stats)?;
        packet.key = key;
        packet.signals = observed;
        Ok(packet)
    }

    /// Copy the payload out to user memory.
    ///
    /// On success `capacity` is updated to the bytes written. If the
    /// destination is smaller than the payload, fails BufferTooSmall,
    /// rewrites `capacity` to the required size, copies nothing, and
    /// leaves the packet intact for the caller to retry or discard.
    pub fn copy_out(
        &self,
        copier: &dyn UserCopy,
        dst: UserAddr,
        capacity: &mut usize,
    ) -> PortResult<()> {
        let required = self.payload.len();
        if *capacity < required {
            *capacity = required;
            return Err(PortError::BufferTooSmall { required });
        }

        copier.copy_out(dst, &self.payload)?;
        *capacity = required;
        Ok(())
    }

    pub fn kind(&self) -> PacketKind {
        self.kind
    }

    pub fn key(&self) -> PacketKey {
        self.key
    }

    pub fn signals(&self) -> Signals {
        self.signals
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Decode the SIGNAL payload; None for USER-kind packets
    pub fn signal_payload(&self) -> Option<SignalPayload> {
        match self.kind {
            PacketKind::Signal => bincode::deserialize(&self.payload).ok(),
            PacketKind::User => None,
        }
    }
}

impl Drop for PortPacket {
    fn drop(&mut self) {
        self.stats.inc_packets_freed();
    }
}

impl fmt::Debug for PortPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortPacket")
            .field("kind", &self.kind)
            .field("key", &self.key)
            .field("signals", &self.signals)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

fn timestamp_micros() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> Arc<AtomicPortStats> {
        Arc::new(AtomicPortStats::new())
    }

    #[test]
    fn test_make_from_buffer() {
        let stats = stats();
        let packet = PortPacket::make_from_buffer(b"payload", &stats).unwrap();
        assert_eq!(packet.kind(), PacketKind::Signal);
        assert_eq!(packet.payload(), b"payload");
        assert_eq!(stats.snapshot().packets_live(), 1);

        drop(packet);
        assert_eq!(stats.snapshot().packets_live(), 0);
        assert_eq!(stats.snapshot().packets_freed, 1);
    }

    #[test]
    fn test_make_from_user() {
        let stats = stats();
        let space = crate::usercopy::BufferCopy::new(0x1000, 64);
        space.write(UserAddr(0x1000), b"user data").unwrap();

        let packet = PortPacket::make_from_user(&space, UserAddr(0x1000), 9, &stats).unwrap();
        assert_eq!(packet.kind(), PacketKind::User);
        assert_eq!(packet.payload(), b"user data");
    }

    #[test]
    fn test_make_from_user_fault_frees_packet() {
        let stats = stats();
        let space = crate::usercopy::BufferCopy::new(0x1000, 8);

        let result = PortPacket::make_from_user(&space, UserAddr(0x1000), 64, &stats);
        assert_eq!(result.unwrap_err(), PortError::CopyFault);
        // The partially built packet was discarded
        assert_eq!(stats.snapshot().packets_live(), 0);
    }

    #[test]
    fn test_copy_out_short_buffer_non_destructive() {
        let stats = stats();
        let space = crate::usercopy::BufferCopy::new(0x1000, 256);
        let payload = vec![0xabu8; 100];
        let packet = PortPacket::make_from_buffer(&payload, &stats).unwrap();

        let mut capacity = 10;
        let result = packet.copy_out(&space, UserAddr(0x1000), &mut capacity);
        assert_eq!(result.unwrap_err(), PortError::BufferTooSmall { required: 100 });
        assert_eq!(capacity, 100);
        // Nothing was copied
        assert_eq!(space.read(UserAddr(0x1000), 10).unwrap(), vec![0u8; 10]);

        // The same packet satisfies a retry with enough room
        let mut capacity = 256;
        packet.copy_out(&space, UserAddr(0x1000), &mut capacity).unwrap();
        assert_eq!(capacity, 100);
        assert_eq!(space.read(UserAddr(0x1000), 100).unwrap(), payload);
    }

    #[test]
    fn test_signal_payload_roundtrip() {
        let stats = stats();
        let packet =
            PortPacket::make_signal(0xdead_beef, Signals::READABLE, &stats).unwrap();
        assert_eq!(packet.kind(), PacketKind::Signal);
        assert_eq!(packet.key(), 0xdead_beef);

        let info = packet.signal_payload().unwrap();
        assert_eq!(info.key, 0xdead_beef);
        assert_eq!(info.observed, Signals::READABLE);
    }
}
