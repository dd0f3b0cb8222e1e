//! Target address wrapper type with hex parsing and range helpers

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An address in the target process.
///
/// Stored as `u64` regardless of the host pointer width so that a 32-bit
/// host can still describe a 64-bit target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub u64);

impl Address {
    /// Creates a new address from a raw value
    pub const fn new(value: u64) -> Self {
        Address(value)
    }

    /// Creates a null address (0x0)
    pub const fn null() -> Self {
        Address(0)
    }

    /// Checks if the address is null
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the address is a multiple of `alignment`
    pub const fn is_aligned(&self, alignment: u64) -> bool {
        alignment != 0 && self.0 % alignment == 0
    }

    /// Rounds the address down to a multiple of `alignment`
    pub const fn align_down(&self, alignment: u64) -> Self {
        if alignment == 0 {
            return *self;
        }
        Address(self.0 - self.0 % alignment)
    }

    /// Rounds the address up to a multiple of `alignment`, saturating at the top
    pub const fn align_up(&self, alignment: u64) -> Self {
        if alignment == 0 {
            return *self;
        }
        let rem = self.0 % alignment;
        if rem == 0 {
            *self
        } else {
            Address(self.0.saturating_add(alignment - rem))
        }
    }

    /// Adds a signed offset, wrapping on overflow
    pub const fn offset(&self, offset: i64) -> Self {
        Address(self.0.wrapping_add_signed(offset))
    }

    /// Adds an unsigned byte count, wrapping on overflow
    pub const fn add(&self, count: u64) -> Self {
        Address(self.0.wrapping_add(count))
    }

    /// Returns the raw value
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl FromStr for Address {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            parse_hex(hex)
        } else if let Some(hex) = s.strip_prefix('$') {
            parse_hex(hex)
        } else if s.chars().any(|c| c.is_ascii_alphabetic()) {
            // Letters only make sense as hex digits
            parse_hex(s)
        } else if s.bytes().all(|b| b.is_ascii_digit()) {
            s.parse::<u64>().ok().or_else(|| parse_hex(s))
        } else {
            None
        };

        value
            .map(Address::new)
            .ok_or_else(|| MemoryError::InvalidAddress(s.to_string()))
    }
}

fn parse_hex(digits: &str) -> Option<u64> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl fmt::LowerHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

impl fmt::UpperHex for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016X}", self.0)
    }
}

impl From<u64> for Address {
    fn from(value: u64) -> Self {
        Address::new(value)
    }
}

impl From<usize> for Address {
    fn from(value: usize) -> Self {
        Address::new(value as u64)
    }
}

/// Half-open address range `[start, end)` to scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRange {
    pub start: Address,
    pub end: Address,
}

impl AddressRange {
    /// Creates a range from `start` (inclusive) to `end` (exclusive)
    pub const fn new(start: Address, end: Address) -> Self {
        AddressRange { start, end }
    }

    /// Creates a range covering `size` bytes from `start`
    pub const fn with_size(start: Address, size: u64) -> Self {
        AddressRange {
            start,
            end: Address(start.0.saturating_add(size)),
        }
    }

    /// Number of bytes covered by the range
    pub const fn len(&self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    /// True when the range covers no bytes
    pub const fn is_empty(&self) -> bool {
        self.end.0 <= self.start.0
    }

    /// Checks whether `address` lies inside the range
    pub const fn contains(&self, address: Address) -> bool {
        address.0 >= self.start.0 && address.0 < self.end.0
    }

    /// Rejects empty or inverted ranges
    pub fn validate(&self) -> MemoryResult<()> {
        if self.is_empty() {
            return Err(MemoryError::InvalidState(format!(
                "empty scan range {}..{}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

impl fmt::Display for AddressRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
