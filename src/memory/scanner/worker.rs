//! Runs scans off the async executor
//!
//! A [`ScanWorker`] owns a [`ValueScanEngine`] and executes one scan at a
//! time on tokio's blocking pool. Requests made while a scan is running are
//! rejected with [`MemoryError::ScanInProgress`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::warn;

use super::{CancellationToken, ValueScanEngine};
use crate::core::types::{AddressRange, CompareMode, DataType, MemoryError, MemoryResult, ScanResult};

/// Async front for a scan engine
pub struct ScanWorker {
    engine: Arc<Mutex<ValueScanEngine>>,
    busy: Arc<AtomicBool>,
    cancel: CancellationToken,
}

/// Handle to a scan running on the blocking pool
pub struct ScanTask {
    handle: JoinHandle<MemoryResult<Vec<ScanResult>>>,
}

impl ScanTask {
    /// Waits for the scan and returns a snapshot of the candidates
    pub async fn wait(self) -> MemoryResult<Vec<ScanResult>> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(MemoryError::InvalidState(format!("scan task failed: {}", e))),
        }
    }
}

/// Clears the busy flag however the scan ends
struct BusyGuard {
    busy: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.cancel.finish();
        self.busy.store(false, Ordering::SeqCst);
    }
}

impl ScanWorker {
    pub fn new(engine: ValueScanEngine) -> Self {
        let cancel = engine.cancellation_token();
        ScanWorker {
            engine: Arc::new(Mutex::new(engine)),
            busy: Arc::new(AtomicBool::new(false)),
            cancel,
        }
    }

    /// Whether a scan is currently running
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Requests cancellation of the running or queued scan.
    ///
    /// Returns false when no scan is in flight; the request is then dropped.
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    /// Starts a first scan in the background
    pub fn first_scan(
        &self,
        range: AddressRange,
        alignment: Option<usize>,
        data_type: DataType,
        mode: CompareMode,
    ) -> MemoryResult<ScanTask> {
        self.spawn(move |engine| {
            engine
                .first_scan(range, alignment, data_type, &mode)
                .map(|results| results.to_vec())
        })
    }

    /// Starts a next scan in the background
    pub fn next_scan(&self, mode: CompareMode) -> MemoryResult<ScanTask> {
        self.spawn(move |engine| engine.next_scan(&mode).map(|results| results.to_vec()))
    }

    /// Runs `f` against the engine when no scan is running.
    ///
    /// Fails with `ScanInProgress` rather than blocking on a running scan.
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut ValueScanEngine) -> R) -> MemoryResult<R> {
        if self.is_busy() {
            return Err(MemoryError::ScanInProgress);
        }
        let mut engine = lock(&self.engine)?;
        Ok(f(&mut engine))
    }

    fn spawn<F>(&self, scan: F) -> MemoryResult<ScanTask>
    where
        F: FnOnce(&mut ValueScanEngine) -> MemoryResult<Vec<ScanResult>> + Send + 'static,
    {
        let runtime = Handle::try_current()
            .map_err(|_| MemoryError::InvalidState("no tokio runtime available".to_string()))?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("scan requested while another scan is running");
            return Err(MemoryError::ScanInProgress);
        }

        // Marked before the task is queued so an early cancel still applies
        self.cancel.begin();
        let guard = BusyGuard {
            busy: self.busy.clone(),
            cancel: self.cancel.clone(),
        };
        let engine = self.engine.clone();
        let handle = runtime.spawn_blocking(move || {
            let _guard = guard;
            let mut engine = lock(&engine)?;
            scan(&mut engine)
        });

        Ok(ScanTask { handle })
    }
}

fn lock(engine: &Mutex<ValueScanEngine>) -> MemoryResult<MutexGuard<'_, ValueScanEngine>> {
    engine
        .lock()
        .map_err(|_| MemoryError::InvalidState("scan engine lock poisoned".to_string()))
}
