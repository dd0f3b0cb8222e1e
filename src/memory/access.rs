//! Byte-level access to a target process
//!
//! Every engine in this crate talks to the target exclusively through
//! [`MemoryAccess`]. Implementations own all OS-specific detail and any
//! blocking behavior; engines impose no timeouts of their own.

use crate::core::types::{Address, MemoryResult, ProcessId};
use crate::memory::regions::RegionInfo;

/// Read/write/enumerate primitives over one target process.
///
/// Reads are not atomic across multiple bytes. The target may be writing
/// the same memory concurrently.
pub trait MemoryAccess: Send + Sync {
    /// Attaches to the process with the given id
    fn attach(&mut self, pid: ProcessId) -> MemoryResult<()>;

    /// Whether a process is currently attached
    fn is_attached(&self) -> bool;

    /// Reads exactly `len` bytes starting at `address`
    fn read(&self, address: Address, len: usize) -> MemoryResult<Vec<u8>>;

    /// Writes all of `data` starting at `address`
    fn write(&self, address: Address, data: &[u8]) -> MemoryResult<()>;

    /// Lists the target's memory regions
    fn enumerate_regions(&self) -> MemoryResult<Vec<RegionInfo>>;
}

/// Reads a little-endian pointer of `width` bytes (4 or 8)
pub fn read_pointer(access: &dyn MemoryAccess, address: Address, width: usize) -> MemoryResult<u64> {
    let bytes = access.read(address, width)?;
    Ok(decode_pointer(&bytes, width))
}

/// Decodes a little-endian pointer of `width` bytes from the start of `bytes`.
///
/// Returns 0 when fewer than `width` bytes are available.
pub fn decode_pointer(bytes: &[u8], width: usize) -> u64 {
    match width {
        8 => bytes
            .get(..8)
            .and_then(|b| b.try_into().ok())
            .map(u64::from_le_bytes)
            .unwrap_or(0),
        _ => bytes
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .map(|b| u64::from(u32::from_le_bytes(b)))
            .unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pointer() {
        let bytes = 0x1122334455667788u64.to_le_bytes();
        assert_eq!(decode_pointer(&bytes, 8), 0x1122334455667788);
        assert_eq!(decode_pointer(&bytes, 4), 0x55667788);
        assert_eq!(decode_pointer(&bytes[..3], 4), 0);
    }
}
