//! Value scanning: typed first scans and candidate refinement
//!
//! A [`ValueScanEngine`] owns one candidate set. A first scan walks an
//! address range chunk by chunk and records every aligned value that
//! satisfies a comparison; next scans re-read each candidate and keep the
//! ones that still match, in their original order.

pub mod compare;
pub mod control;
pub mod worker;

pub use compare::Comparison;
pub use control::{CancellationToken, ProgressSink};
pub use worker::{ScanTask, ScanWorker};

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::ScannerConfig;
use crate::core::types::{
    Address, AddressRange, CompareMode, DataType, MemoryError, MemoryResult, MemoryValue,
    ScanProgress, ScanResult,
};
use crate::memory::access::MemoryAccess;
use crate::memory::reader::MemoryReader;
use crate::memory::writer::MemoryWriter;
use control::ProgressThrottle;

/// Scans target memory for values and refines the resulting candidates
pub struct ValueScanEngine {
    access: Arc<dyn MemoryAccess>,
    config: ScannerConfig,
    results: Vec<ScanResult>,
    data_type: Option<DataType>,
    cancel: CancellationToken,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl ValueScanEngine {
    /// Create a scan engine over `access`
    pub fn new(access: Arc<dyn MemoryAccess>, config: ScannerConfig) -> Self {
        ValueScanEngine {
            access,
            config,
            results: Vec::new(),
            data_type: None,
            cancel: CancellationToken::new(),
            progress: None,
        }
    }

    /// Install a progress sink invoked at chunk/candidate boundaries
    pub fn with_progress<S: ProgressSink + 'static>(mut self, sink: S) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }

    /// Replace or remove the progress sink
    pub fn set_progress_sink(&mut self, sink: Option<Arc<dyn ProgressSink>>) {
        self.progress = sink;
    }

    /// Current candidates in scan order
    pub fn results(&self) -> &[ScanResult] {
        &self.results
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the candidate set is empty
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Data type of the current candidate set
    pub fn data_type(&self) -> Option<DataType> {
        self.data_type
    }

    /// Scanner settings this engine was built with
    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    /// Discard all candidates
    pub fn clear(&mut self) {
        self.results.clear();
        self.data_type = None;
    }

    /// Request cancellation of the running scan.
    ///
    /// Returns false, and has no effect, when no scan is running.
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Token that cancels this engine's scans from another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Scan `range` for values of `data_type` satisfying `mode`.
    ///
    /// `alignment` defaults to the configured alignment. Chunks that cannot
    /// be read are skipped. Replaces any previous candidate set, and on
    /// cancellation keeps whatever was found before the flag was seen.
    pub fn first_scan(
        &mut self,
        range: AddressRange,
        alignment: Option<usize>,
        data_type: DataType,
        mode: &CompareMode,
    ) -> MemoryResult<&[ScanResult]> {
        let alignment = alignment.unwrap_or(self.config.alignment);
        if alignment == 0 {
            return Err(MemoryError::InvalidState(
                "alignment must be at least 1".to_string(),
            ));
        }
        if !mode.allowed_in_first_scan() {
            return Err(MemoryError::InvalidState(format!(
                "'{}' needs a previous scan",
                mode
            )));
        }
        data_type.validate()?;
        range.validate()?;
        let comparison = Comparison::compile(mode, data_type)?;

        self.cancel.begin();
        self.results.clear();
        self.data_type = Some(data_type);

        let width = data_type.width() as u64;
        let chunk_size = self.config.chunk_size.max(1) as u64;
        let total = range.len();
        let mut throttle = ProgressThrottle::new(self.config.progress_step_percent);
        let mut chunk_start = range.start.0;
        let mut skipped = 0usize;
        let mut cancelled = false;

        debug!(range = %range, data_type = %data_type, mode = %mode, alignment, "first scan started");

        while chunk_start < range.end.0 {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let chunk_end = chunk_start.saturating_add(chunk_size).min(range.end.0);
            match self.read_chunk(chunk_start, chunk_end, range.end.0, width) {
                Some(buffer) => self.scan_chunk(
                    &buffer,
                    chunk_start,
                    chunk_end,
                    alignment as u64,
                    data_type,
                    &comparison,
                ),
                None => skipped += 1,
            }

            chunk_start = chunk_end;
            self.report_progress(
                &mut throttle,
                ScanProgress {
                    processed: chunk_start - range.start.0,
                    total,
                    results_found: self.results.len(),
                },
            );
        }

        if !cancelled && throttle.should_report_completion() {
            self.emit(ScanProgress {
                processed: total,
                total,
                results_found: self.results.len(),
            });
        }
        self.cancel.finish();

        info!(
            results = self.results.len(),
            skipped_chunks = skipped,
            cancelled,
            "first scan complete"
        );
        Ok(&self.results)
    }

    /// Re-read every candidate and keep those satisfying `mode`.
    ///
    /// History modes compare against each candidate's stored value; literal
    /// modes against the literal. Candidates that can no longer be read are
    /// dropped for good. On cancellation, candidates not yet visited are kept
    /// unchanged.
    pub fn next_scan(&mut self, mode: &CompareMode) -> MemoryResult<&[ScanResult]> {
        let data_type = match self.data_type {
            Some(data_type) if !self.results.is_empty() => data_type,
            _ => return Err(MemoryError::NoCandidates),
        };
        let comparison = Comparison::compile(mode, data_type)?;

        self.cancel.begin();
        let candidates = std::mem::take(&mut self.results);
        let total = candidates.len() as u64;
        let mut kept = Vec::with_capacity(candidates.len());
        let mut throttle = ProgressThrottle::new(self.config.progress_step_percent);
        let mut unreadable = 0usize;
        let mut cancelled = false;
        let mut visited = 0u64;

        let mut remaining = candidates.into_iter();
        while let Some(mut candidate) = remaining.next() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                kept.push(candidate);
                kept.extend(remaining);
                break;
            }

            let reader = MemoryReader::new(self.access.as_ref());
            match reader.read_value(candidate.address, candidate.data_type) {
                Ok(fresh) => {
                    if comparison.matches(&fresh, Some(&candidate.value)) {
                        candidate.update(fresh);
                        kept.push(candidate);
                    }
                }
                Err(e) => {
                    debug!(address = %candidate.address, error = %e, "candidate vanished");
                    unreadable += 1;
                }
            }

            visited += 1;
            self.report_progress(
                &mut throttle,
                ScanProgress {
                    processed: visited,
                    total,
                    results_found: kept.len(),
                },
            );
        }

        self.results = kept;
        if !cancelled && throttle.should_report_completion() {
            self.emit(ScanProgress {
                processed: total,
                total,
                results_found: self.results.len(),
            });
        }
        self.cancel.finish();

        info!(
            results = self.results.len(),
            unreadable,
            cancelled,
            mode = %mode,
            "next scan complete"
        );
        Ok(&self.results)
    }

    /// Replace the candidate set, e.g. from a saved session.
    ///
    /// All results must share one data type, carry a value of that type,
    /// and have distinct addresses.
    pub fn restore(&mut self, results: Vec<ScanResult>) -> MemoryResult<()> {
        let data_type = results.first().map(|r| r.data_type);
        let mut seen = HashSet::with_capacity(results.len());

        for result in &results {
            if Some(result.data_type) != data_type {
                return Err(MemoryError::InvalidValueType(format!(
                    "mixed data types in candidate set at {}",
                    result.address
                )));
            }
            if !result.value.matches_type(result.data_type) {
                return Err(MemoryError::InvalidValueType(format!(
                    "{} value at {} is not {}",
                    result.value.type_name(),
                    result.address,
                    result.data_type
                )));
            }
            if !seen.insert(result.address) {
                return Err(MemoryError::InvalidState(format!(
                    "duplicate candidate address {}",
                    result.address
                )));
            }
        }

        self.results = results;
        self.data_type = data_type;
        Ok(())
    }

    /// Write `value` to a candidate address using the candidate set's type
    pub fn write_value(&self, address: Address, value: &MemoryValue) -> MemoryResult<()> {
        let data_type = self.data_type.ok_or(MemoryError::NoCandidates)?;
        MemoryWriter::new(self.access.as_ref()).write_value(address, value, data_type)
    }

    /// Reads `[chunk_start, chunk_end)` plus enough overlap to decode values
    /// starting near the end of the chunk, clamped to `range_end`.
    fn read_chunk(&self, chunk_start: u64, chunk_end: u64, range_end: u64, width: u64) -> Option<Vec<u8>> {
        let wanted_end = chunk_end
            .saturating_add(width.saturating_sub(1))
            .min(range_end);
        let start = Address::new(chunk_start);

        match self.access.read(start, (wanted_end - chunk_start) as usize) {
            Ok(buffer) => return Some(buffer),
            Err(e) if wanted_end == chunk_end => {
                debug!(chunk = %start, error = %e, "skipping unreadable chunk");
                return None;
            }
            Err(_) => {}
        }

        // The overlap may run into an unmapped page; retry the bare chunk
        match self.access.read(start, (chunk_end - chunk_start) as usize) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                debug!(chunk = %start, error = %e, "skipping unreadable chunk");
                None
            }
        }
    }

    fn scan_chunk(
        &mut self,
        buffer: &[u8],
        chunk_start: u64,
        chunk_end: u64,
        alignment: u64,
        data_type: DataType,
        comparison: &Comparison,
    ) {
        let width = data_type.width();
        let mut address = Address::new(chunk_start).align_up(alignment).0;

        while address < chunk_end {
            let offset = (address - chunk_start) as usize;
            // Strings near the end of the readable range decode from what is left
            let window_end = match data_type {
                DataType::FixedString(_) => (offset + width).min(buffer.len()),
                _ => offset + width,
            };
            let Some(window) = buffer.get(offset..window_end) else {
                break;
            };

            if let Some(value) = MemoryValue::decode(window, data_type) {
                if comparison.matches(&value, None) {
                    self.results
                        .push(ScanResult::new(Address::new(address), data_type, value));
                }
            }

            match address.checked_add(alignment) {
                Some(next) => address = next,
                None => break,
            }
        }
    }

    fn report_progress(&self, throttle: &mut ProgressThrottle, progress: ScanProgress) {
        if self.progress.is_some() && throttle.should_report(progress.percent()) {
            self.emit(progress);
        }
    }

    fn emit(&self, progress: ScanProgress) {
        if let Some(sink) = &self.progress {
            sink.report(progress);
        }
    }
}
