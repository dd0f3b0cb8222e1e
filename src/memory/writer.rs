//! Typed memory writing on top of a [`MemoryAccess`] port

use tracing::debug;

use crate::core::types::{Address, DataType, MemoryResult, MemoryValue};
use crate::memory::access::MemoryAccess;

/// Memory writer that encodes typed values before writing
pub struct MemoryWriter<'a> {
    access: &'a dyn MemoryAccess,
}

impl<'a> MemoryWriter<'a> {
    /// Create a new memory writer
    pub fn new(access: &'a dyn MemoryAccess) -> Self {
        MemoryWriter { access }
    }

    /// Write raw bytes to memory
    pub fn write_bytes(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        self.access.write(address, data)
    }

    /// Encode `value` as `data_type` and write it
    pub fn write_value(&self, address: Address, value: &MemoryValue, data_type: DataType) -> MemoryResult<()> {
        let bytes = value.encode(data_type)?;
        self.access.write(address, &bytes)?;
        debug!(address = %address, value = %value, "wrote value");
        Ok(())
    }

    /// Parse `literal` as `data_type` and write it
    pub fn write_literal(&self, address: Address, literal: &str, data_type: DataType) -> MemoryResult<MemoryValue> {
        let value = MemoryValue::parse(literal, data_type)?;
        self.write_value(address, &value, data_type)?;
        Ok(value)
    }
}
