//! Typed memory reading on top of a [`MemoryAccess`] port

use crate::core::types::{Address, DataType, MemoryError, MemoryResult, MemoryValue};
use crate::memory::access::{decode_pointer, MemoryAccess};

/// Memory reader with type-aware decoding
pub struct MemoryReader<'a> {
    access: &'a dyn MemoryAccess,
}

impl<'a> MemoryReader<'a> {
    /// Create a new memory reader
    pub fn new(access: &'a dyn MemoryAccess) -> Self {
        MemoryReader { access }
    }

    /// Read raw bytes from memory
    pub fn read_bytes(&self, address: Address, size: usize) -> MemoryResult<Vec<u8>> {
        self.access.read(address, size)
    }

    /// Read and decode one value of `data_type`.
    ///
    /// A string whose full bound would cross into unreadable memory is read
    /// up to the end of its region instead.
    pub fn read_value(&self, address: Address, data_type: DataType) -> MemoryResult<MemoryValue> {
        data_type.validate()?;
        let bytes = match self.access.read(address, data_type.width()) {
            Ok(bytes) => bytes,
            Err(e) => match data_type {
                DataType::FixedString(max_len) => {
                    self.read_region_prefix(address, max_len).ok_or(e)?
                }
                _ => return Err(e),
            },
        };
        MemoryValue::decode(&bytes, data_type).ok_or_else(|| {
            MemoryError::read_failed(
                address,
                format!("short read of {} bytes for {}", bytes.len(), data_type),
            )
        })
    }

    /// Read a pointer-sized value of `width` bytes (4 or 8)
    pub fn read_pointer(&self, address: Address, width: usize) -> MemoryResult<Address> {
        let bytes = self.access.read(address, width)?;
        if bytes.len() < width {
            return Err(MemoryError::read_failed(address, "short pointer read"));
        }
        Ok(Address::new(decode_pointer(&bytes, width)))
    }

    /// Read a NUL-terminated string of at most `max_len` bytes
    pub fn read_string(&self, address: Address, max_len: usize) -> MemoryResult<String> {
        match self.read_value(address, DataType::FixedString(max_len))? {
            MemoryValue::String(s) => Ok(s),
            other => Err(MemoryError::InvalidValueType(format!(
                "expected string, decoded {}",
                other.type_name()
            ))),
        }
    }

    fn read_region_prefix(&self, address: Address, max_len: usize) -> Option<Vec<u8>> {
        let regions = self.access.enumerate_regions().ok()?;
        let region = regions
            .iter()
            .find(|r| r.is_readable() && r.contains(address))?;
        let len = (region.end.0 - address.0).min(max_len as u64) as usize;
        self.access.read(address, len).ok()
    }

    /// Read values at several addresses; each read fails independently
    pub fn read_batch(&self, addresses: &[Address], data_type: DataType) -> Vec<MemoryResult<MemoryValue>> {
        addresses
            .iter()
            .map(|&addr| self.read_value(addr, data_type))
            .collect()
    }
}
