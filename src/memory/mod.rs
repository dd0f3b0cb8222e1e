//! Memory operations module for scanning and navigating target memory
//!
//! This module provides the engines that reason over a target's address
//! space through the [`MemoryAccess`] port:
//! - Typed value scanning and candidate refinement
//! - Wildcard byte-pattern search
//! - Pointer chain resolution and single-level pointer search
//! - Region descriptions and filtering

pub mod access;
pub mod buffer;
pub mod pattern;
pub mod pointer;
pub mod reader;
pub mod regions;
pub mod scanner;
pub mod writer;

pub use access::MemoryAccess;
pub use buffer::BufferMemory;
pub use pattern::{AobResult, BytePattern, PatternMatcher, PatternToken};
pub use pointer::{PointerChainResolver, PointerWidth};
pub use reader::MemoryReader;
pub use regions::{FilterCriteria, ProtectionFlags, RegionFilter, RegionInfo};
pub use scanner::{CancellationToken, ProgressSink, ScanTask, ScanWorker, ValueScanEngine};
pub use writer::MemoryWriter;

use std::sync::Arc;

use crate::config::Config;
use crate::core::types::MemoryResult;

/// The three engines built over one shared port
pub struct MemoryOperations {
    pub scanner: ValueScanEngine,
    pub patterns: PatternMatcher,
    pub pointers: PointerChainResolver,
}

impl MemoryOperations {
    /// Build every engine over `access` using `config`
    pub fn new(access: Arc<dyn MemoryAccess>, config: &Config) -> MemoryResult<Self> {
        Ok(MemoryOperations {
            scanner: ValueScanEngine::new(access.clone(), config.scanner.clone()),
            patterns: PatternMatcher::new(access.clone(), config.pattern.clone()),
            pointers: PointerChainResolver::from_config(access, config.pointer.clone())?,
        })
    }
}
