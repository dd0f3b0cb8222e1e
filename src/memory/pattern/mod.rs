//! Array-of-bytes search with wildcards
//!
//! [`PatternMatcher`] slides a compiled [`BytePattern`] across target regions
//! with stride 1. Regions are read in chunks overlapping by `len - 1` bytes so
//! matches straddling a chunk boundary are found exactly once.

mod bytes;

pub use bytes::{BytePattern, PatternToken};

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::PatternConfig;
use crate::core::types::{Address, MemoryError, MemoryResult};
use crate::memory::access::MemoryAccess;
use crate::memory::regions::{FilterCriteria, RegionFilter, RegionInfo};
use crate::memory::scanner::CancellationToken;

/// One pattern occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AobResult {
    pub address: Address,
    pub pattern: Arc<BytePattern>,
    /// Exactly `pattern.len()` bytes as read at `address`
    pub matched_bytes: Vec<u8>,
}

/// Searches target memory for byte patterns
pub struct PatternMatcher {
    access: Arc<dyn MemoryAccess>,
    config: PatternConfig,
    cancel: CancellationToken,
}

impl PatternMatcher {
    pub fn new(access: Arc<dyn MemoryAccess>, config: PatternConfig) -> Self {
        PatternMatcher {
            access,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Same as [`BytePattern::compile`]
    pub fn compile(text: &str) -> MemoryResult<BytePattern> {
        BytePattern::compile(text)
    }

    pub fn config(&self) -> &PatternConfig {
        &self.config
    }

    /// Requests cancellation of the running search; false when none is running
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Search `regions` in ascending address order for up to `max_results`
    /// matches. Regions without read permission and unreadable chunks are
    /// skipped. A cancelled search returns the matches found so far.
    pub fn search(&self, pattern: &BytePattern, regions: &[RegionInfo], max_results: usize) -> Vec<AobResult> {
        let shared = Arc::new(pattern.clone());
        let mut ordered: Vec<&RegionInfo> = regions.iter().collect();
        ordered.sort_by_key(|r| r.start);

        let mut results = Vec::new();
        let mut skipped = 0usize;
        self.cancel.begin();

        'regions: for region in ordered {
            if results.len() >= max_results {
                break;
            }
            if !region.is_readable() {
                debug!(region = %region, "skipping unreadable region");
                continue;
            }

            let mut chunk_start = region.start.0;
            while chunk_start < region.end.0 {
                if self.cancel.is_cancelled() {
                    break 'regions;
                }

                let chunk_end = chunk_start
                    .saturating_add(self.config.chunk_size.max(1) as u64)
                    .min(region.end.0);
                match self.read_chunk(chunk_start, chunk_end, region.end.0, pattern.len()) {
                    Some(buffer) => {
                        let span = (chunk_end - chunk_start) as usize;
                        for offset in pattern.find_in(&buffer).take_while(|o| *o < span) {
                            results.push(AobResult {
                                address: Address::new(chunk_start + offset as u64),
                                pattern: shared.clone(),
                                matched_bytes: buffer[offset..offset + pattern.len()].to_vec(),
                            });
                            if results.len() >= max_results {
                                break 'regions;
                            }
                        }
                    }
                    None => skipped += 1,
                }
                chunk_start = chunk_end;
            }
        }

        let cancelled = self.cancel.is_cancelled();
        self.cancel.finish();
        info!(
            pattern = %pattern,
            results = results.len(),
            skipped_chunks = skipped,
            cancelled,
            "pattern search complete"
        );
        results
    }

    /// Enumerate the target's regions, keep those matching `criteria`, and
    /// search them
    pub fn search_all(
        &self,
        pattern: &BytePattern,
        criteria: FilterCriteria,
        max_results: usize,
    ) -> MemoryResult<Vec<AobResult>> {
        let regions = self.access.enumerate_regions()?;
        let selected = RegionFilter::new(criteria).apply(&regions);
        debug!(
            total = regions.len(),
            selected = selected.len(),
            "regions selected for pattern search"
        );
        Ok(self.search(pattern, &selected, max_results))
    }

    /// Whether `pattern` still matches at `address`. Unreadable is `false`.
    pub fn verify_at(&self, address: Address, pattern: &BytePattern) -> bool {
        match self.access.read(address, pattern.len()) {
            Ok(bytes) => pattern.matches(&bytes),
            Err(e) => {
                debug!(address = %address, error = %e, "verify read failed");
                false
            }
        }
    }

    /// Read `size` bytes at `address` and render them as pattern text with
    /// `??` at each of `wildcard_positions`.
    pub fn pattern_from_address(
        &self,
        address: Address,
        size: usize,
        wildcard_positions: &[usize],
    ) -> MemoryResult<String> {
        if size == 0 {
            return Err(MemoryError::invalid_pattern("", 0, "empty pattern"));
        }
        if let Some(&position) = wildcard_positions.iter().find(|&&p| p >= size) {
            return Err(MemoryError::invalid_pattern(
                "??",
                position,
                format!("wildcard position beyond pattern of {} bytes", size),
            ));
        }

        let bytes = self.access.read(address, size)?;
        if bytes.len() < size {
            return Err(MemoryError::read_failed(address, "short read"));
        }

        let tokens: Vec<String> = bytes
            .iter()
            .enumerate()
            .map(|(i, b)| {
                if wildcard_positions.contains(&i) {
                    "??".to_string()
                } else {
                    format!("{:02X}", b)
                }
            })
            .collect();
        Ok(tokens.join(" "))
    }

    fn read_chunk(&self, chunk_start: u64, chunk_end: u64, region_end: u64, len: usize) -> Option<Vec<u8>> {
        let wanted_end = chunk_end
            .saturating_add(len.saturating_sub(1) as u64)
            .min(region_end);
        let start = Address::new(chunk_start);

        if let Ok(buffer) = self.access.read(start, (wanted_end - chunk_start) as usize) {
            return Some(buffer);
        }
        match self.access.read(start, (chunk_end - chunk_start) as usize) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                debug!(chunk = %start, error = %e, "skipping unreadable chunk");
                None
            }
        }
    }
}
