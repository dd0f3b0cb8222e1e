//! Core module containing fundamental types for memscope
//!
//! This module provides the foundational building blocks used throughout
//! the crate: address handling, typed memory values, scan results, pointer
//! chains and error types.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{
    Address, AddressRange, CompareMode, DataType, MemoryError, MemoryResult, MemoryValue,
    PointerChain, ScanResult,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
