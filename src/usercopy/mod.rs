/*!
 * User Copy Primitives
 * Validated copies between user address space and kernel buffers
 */

use crate::core::errors::{PortError, PortResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Address in a user address space. Never dereferenced directly;
/// all access goes through a [`UserCopy`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserAddr(pub usize);

impl UserAddr {
    pub fn offset(self, bytes: usize) -> UserAddr {
        UserAddr(self.0 + bytes)
    }
}

/// Copy primitive between a user address space and kernel memory.
///
/// Implementations validate every address range and report
/// [`PortError::CopyFault`] on invalid access; no partial copy is
/// observable after a failure.
pub trait UserCopy: Send + Sync {
    /// Copy `dst.len()` bytes from the user address into a kernel buffer
    fn copy_in(&self, dst: &mut [u8], src: UserAddr) -> PortResult<()>;

    /// Copy a kernel buffer out to the user address
    fn copy_out(&self, dst: UserAddr, src: &[u8]) -> PortResult<()>;
}

/// Bounds-checked copy primitive over a single in-memory region.
///
/// Stands in for a real address space in tests and simulations: a
/// `base..base + size` window is mapped, everything else faults.
pub struct BufferCopy {
    base: usize,
    memory: Mutex<Vec<u8>>,
}

impl BufferCopy {
    pub fn new(base: usize, size: usize) -> Self {
        Self {
            base,
            memory: Mutex::new(vec![0; size]),
        }
    }

    pub fn base(&self) -> UserAddr {
        UserAddr(self.base)
    }

    /// Seed the region (test setup path, same validation as copies)
    pub fn write(&self, addr: UserAddr, bytes: &[u8]) -> PortResult<()> {
        let range = self.range(addr, bytes.len())?;
        self.memory.lock()[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Read back the region contents
    pub fn read(&self, addr: UserAddr, len: usize) -> PortResult<Vec<u8>> {
        let range = self.range(addr, len)?;
        Ok(self.memory.lock()[range].to_vec())
    }

    fn range(&self, addr: UserAddr, len: usize) -> PortResult<Range<usize>> {
        let start = addr.0.checked_sub(self.base).ok_or(PortError::CopyFault)?;
        let end = start.checked_add(len).ok_or(PortError::CopyFault)?;
        if end > self.memory.lock().len() {
            return Err(PortError::CopyFault);
        }
        Ok(start..end)
    }
}

impl UserCopy for BufferCopy {
    fn copy_in(&self, dst: &mut [u8], src: UserAddr) -> PortResult<()> {
        let range = self.range(src, dst.len())?;
        dst.copy_from_slice(&self.memory.lock()[range]);
        Ok(())
    }

    fn copy_out(&self, dst: UserAddr, src: &[u8]) -> PortResult<()> {
        let range = self.range(dst, src.len())?;
        self.memory.lock()[range].copy_from_slice(src);
        Ok(())
    }
}
