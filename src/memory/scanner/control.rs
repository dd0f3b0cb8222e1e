//! Cooperative cancellation and progress reporting for scans

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::core::types::ScanProgress;

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLED: u8 = 2;

/// Shared flag polled by a running scan between chunks or candidates.
///
/// Requests only stick while a scan is running. One that arrives between
/// scans is dropped, so it can never empty the next scan.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    state: Arc<AtomicU8>,
}

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    /// Requests cancellation of the running scan.
    ///
    /// Returns false when no scan was running to observe it.
    pub fn cancel(&self) -> bool {
        match self
            .state
            .compare_exchange(RUNNING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => true,
            Err(state) => state == CANCELLED,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::SeqCst) == CANCELLED
    }

    /// Whether a scan is between `begin` and `finish`
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::SeqCst) != IDLE
    }

    /// Marks a scan as running. A scan already marked, e.g. by a worker that
    /// queued it, keeps any request made in the meantime.
    pub(crate) fn begin(&self) {
        let _ = self
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst);
    }

    /// Marks the scan as returned and drops any pending request
    pub(crate) fn finish(&self) {
        self.state.store(IDLE, Ordering::SeqCst);
    }
}

/// Receives progress from a running scan.
///
/// Called on the scan's own thread; implementations must return promptly.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: ScanProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(ScanProgress) + Send + Sync,
{
    fn report(&self, progress: ScanProgress) {
        self(progress)
    }
}

/// Suppresses reports that advance less than `step` whole percent
#[derive(Debug)]
pub(crate) struct ProgressThrottle {
    step: u8,
    last: u8,
    reported_any: bool,
}

impl ProgressThrottle {
    pub(crate) fn new(step: u8) -> Self {
        ProgressThrottle {
            step: step.max(1),
            last: 0,
            reported_any: false,
        }
    }

    pub(crate) fn should_report(&mut self, percent: u8) -> bool {
        if percent >= self.last.saturating_add(self.step) {
            self.last = percent;
            self.reported_any = true;
            true
        } else {
            false
        }
    }

    /// True when the 100% report has not gone out yet
    pub(crate) fn should_report_completion(&mut self) -> bool {
        if self.reported_any && self.last >= 100 {
            return false;
        }
        self.last = 100;
        self.reported_any = true;
        true
    }
}
