//! memscope: value scanning, byte-pattern search and pointer chain
//! resolution over the memory of an external process
//!
//! The engines never touch the OS directly. They read and write through a
//! [`MemoryAccess`] implementation supplied by the caller; [`BufferMemory`]
//! is the in-crate implementation used for dumps and tests.

pub mod config;
pub mod core;
pub mod logging;
pub mod memory;
pub mod session;

// Re-export main types from core module
pub use crate::core::types::{
    Address, AddressRange, CompareMode, DataType, ErrorKind, MemoryError, MemoryResult,
    MemoryValue, PointerChain, ProcessId, ScanProgress, ScanResult,
};

pub use memory::{
    AobResult, BufferMemory, BytePattern, CancellationToken, MemoryAccess, PatternMatcher,
    PointerChainResolver, PointerWidth, ProgressSink, RegionInfo, ScanWorker, ValueScanEngine,
};
pub use session::Session;

// Re-export core directly for full access
pub use crate::core::{AUTHORS, VERSION};
