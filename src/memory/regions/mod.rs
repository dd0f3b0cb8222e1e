//! Memory region descriptions and filtering
//!
//! Regions are reported by a [`MemoryAccess`](crate::memory::MemoryAccess)
//! implementation and narrowed with a [`RegionFilter`] before searching.

pub mod filter;
pub mod protection;

pub use filter::{presets, FilterCriteria, RegionFilter};
pub use protection::ProtectionFlags;

use crate::core::types::{Address, AddressRange};
use std::fmt;

/// One contiguous region of target memory, `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionInfo {
    pub start: Address,
    pub end: Address,
    pub permissions: ProtectionFlags,
}

impl RegionInfo {
    /// Creates a region covering `size` bytes from `start`
    pub fn new(start: Address, size: u64, permissions: ProtectionFlags) -> Self {
        RegionInfo {
            start,
            end: start.add(size),
            permissions,
        }
    }

    /// Region size in bytes
    pub fn size(&self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// Checks whether `address` lies inside the region
    pub fn contains(&self, address: Address) -> bool {
        address >= self.start && address < self.end
    }

    /// The region as an address range
    pub fn range(&self) -> AddressRange {
        AddressRange::new(self.start, self.end)
    }

    pub fn is_readable(&self) -> bool {
        self.permissions.is_readable()
    }

    pub fn is_writable(&self) -> bool {
        self.permissions.is_writable()
    }

    pub fn is_executable(&self) -> bool {
        self.permissions.is_executable()
    }
}

impl fmt::Display for RegionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}-{:x} {}", self.start, self.end, self.permissions)
    }
}
