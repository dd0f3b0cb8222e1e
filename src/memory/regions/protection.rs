//! Region protection flags

use std::fmt;
use std::str::FromStr;

use crate::core::types::MemoryError;

/// Access permissions of a memory region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ProtectionFlags {
    value: u8,
}

impl ProtectionFlags {
    pub const READ: u8 = 0x1;
    pub const WRITE: u8 = 0x2;
    pub const EXECUTE: u8 = 0x4;

    /// Create new protection flags
    pub const fn new(value: u8) -> Self {
        ProtectionFlags {
            value: value & (Self::READ | Self::WRITE | Self::EXECUTE),
        }
    }

    /// No access protection
    pub const fn no_access() -> Self {
        ProtectionFlags::new(0)
    }

    /// Read-only protection
    pub const fn read_only() -> Self {
        ProtectionFlags::new(Self::READ)
    }

    /// Read-write protection
    pub const fn read_write() -> Self {
        ProtectionFlags::new(Self::READ | Self::WRITE)
    }

    /// Execute-read protection
    pub const fn execute_read() -> Self {
        ProtectionFlags::new(Self::READ | Self::EXECUTE)
    }

    /// Execute-read-write protection
    pub const fn execute_read_write() -> Self {
        ProtectionFlags::new(Self::READ | Self::WRITE | Self::EXECUTE)
    }

    /// Check if protection allows reading
    pub const fn is_readable(&self) -> bool {
        self.value & Self::READ != 0
    }

    /// Check if protection allows writing
    pub const fn is_writable(&self) -> bool {
        self.value & Self::WRITE != 0
    }

    /// Check if protection allows execution
    pub const fn is_executable(&self) -> bool {
        self.value & Self::EXECUTE != 0
    }

    /// Get the raw protection value
    pub const fn raw(&self) -> u8 {
        self.value
    }
}

impl fmt::Display for ProtectionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            if self.is_readable() { 'r' } else { '-' },
            if self.is_writable() { 'w' } else { '-' },
            if self.is_executable() { 'x' } else { '-' }
        )
    }
}

/// Parses `/proc/<pid>/maps` style permission strings such as `r-xp`
impl FromStr for ProtectionFlags {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut value = 0;
        for (index, c) in s.chars().enumerate() {
            match (index, c) {
                (0, 'r') => value |= Self::READ,
                (1, 'w') => value |= Self::WRITE,
                (2, 'x') => value |= Self::EXECUTE,
                (0..=2, '-') | (3, 'p' | 's' | '-') => {}
                _ => {
                    return Err(MemoryError::InvalidState(format!(
                        "invalid permission string '{}'",
                        s
                    )))
                }
            }
        }
        Ok(ProtectionFlags::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protection_checks() {
        let rw = ProtectionFlags::read_write();
        assert!(rw.is_readable());
        assert!(rw.is_writable());
        assert!(!rw.is_executable());

        let none = ProtectionFlags::no_access();
        assert!(!none.is_readable());
        assert_eq!(none.raw(), 0);

        assert_eq!(ProtectionFlags::new(0xFF).raw(), 0x7);
    }

    #[test]
    fn test_display_and_parse() {
        assert_eq!(ProtectionFlags::execute_read().to_string(), "r-x");
        assert_eq!(ProtectionFlags::read_write().to_string(), "rw-");

        let parsed: ProtectionFlags = "r-xp".parse().unwrap();
        assert_eq!(parsed, ProtectionFlags::execute_read());
        let parsed: ProtectionFlags = "rw-".parse().unwrap();
        assert_eq!(parsed, ProtectionFlags::read_write());
        assert!("rwz".parse::<ProtectionFlags>().is_err());
    }
}
