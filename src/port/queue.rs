/*!
 * Packet FIFO
 * Strict insertion-order packet sequence, locked by the dispatcher
 */

use super::packet::PortPacket;
use std::collections::VecDeque;

/// Plain FIFO of owned packets. Not synchronized; the dispatcher's
/// mutex serializes every access.
pub(super) struct PacketFifo {
    packets: VecDeque<PortPacket>,
}

impl PacketFifo {
    pub fn new() -> Self {
        Self {
            packets: VecDeque::new(),
        }
    }

    pub fn push(&mut self, packet: PortPacket) {
        self.packets.push_back(packet);
    }

    pub fn pop(&mut self) -> Option<PortPacket> {
        self.packets.pop_front()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Free every queued packet, returning how many were dropped
    pub fn drain(&mut self) -> usize {
        let freed = self.packets.len();
        self.packets.clear();
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::stats::AtomicPortStats;
    use std::sync::Arc;

    #[test]
    fn test_fifo_order() {
        let stats = Arc::new(AtomicPortStats::new());
        let mut fifo = PacketFifo::new();
        for byte in [b'a', b'b', b'c'] {
            fifo.push(PortPacket::make_from_buffer(&[byte], &stats).unwrap());
        }

        assert_eq!(fifo.len(), 3);
        assert_eq!(fifo.pop().unwrap().payload(), b"a");
        assert_eq!(fifo.pop().unwrap().payload(), b"b");
        assert_eq!(fifo.pop().unwrap().payload(), b"c");
        assert!(fifo.pop().is_none());
    }

    #[test]
    fn test_drain_frees_all() {
        let stats = Arc::new(AtomicPortStats::new());
        let mut fifo = PacketFifo::new();
        for _ in 0..4 {
            fifo.push(PortPacket::make_from_buffer(b"x", &stats).unwrap());
        }

        assert_eq!(fifo.drain(), 4);
        assert!(fifo.is_empty());
        assert_eq!(stats.snapshot().packets_live(), 0);
    }
}
