//! Core type definitions for memscope
//!
//! Address wrappers, typed values, scan results, pointer chains and the
//! error type shared by every engine.

mod address;
mod error;
mod pointer_chain;
mod scan_result;
mod value;

// Re-export all public types
pub use address::{Address, AddressRange};
pub use error::{ErrorKind, MemoryError, MemoryResult};
pub use pointer_chain::PointerChain;
pub use scan_result::{CompareMode, ScanProgress, ScanResult};
pub use value::{DataType, MemoryValue};

// Common type aliases
pub type ProcessId = u32;
