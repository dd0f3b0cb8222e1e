//! In-memory implementation of [`MemoryAccess`]
//!
//! `BufferMemory` holds a set of byte regions with permissions. It backs
//! offline analysis of captured dumps and gives the engines a deterministic
//! target in tests and benchmarks.

use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::core::types::{Address, MemoryError, MemoryResult, ProcessId};
use crate::memory::access::MemoryAccess;
use crate::memory::regions::{ProtectionFlags, RegionInfo};

#[derive(Debug, Clone)]
struct Segment {
    start: Address,
    bytes: Vec<u8>,
    permissions: ProtectionFlags,
}

impl Segment {
    fn end(&self) -> u64 {
        self.start.0 + self.bytes.len() as u64
    }
}

/// Byte regions standing in for a live process
#[derive(Debug)]
pub struct BufferMemory {
    segments: RwLock<Vec<Segment>>,
    attached: Option<ProcessId>,
}

impl Default for BufferMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferMemory {
    /// Creates an empty memory that reports itself attached
    pub fn new() -> Self {
        BufferMemory {
            segments: RwLock::new(Vec::new()),
            attached: Some(0),
        }
    }

    /// Loads a raw dump file as a single read-write region at `base`
    pub fn from_dump<P: AsRef<Path>>(path: P, base: Address) -> MemoryResult<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        debug!(
            path = %path.as_ref().display(),
            size = bytes.len(),
            "loaded memory dump"
        );
        let memory = BufferMemory::new();
        memory.map(base, bytes, ProtectionFlags::read_write())?;
        Ok(memory)
    }

    /// Builder form of [`map`](Self::map)
    pub fn with_region(self, start: Address, bytes: Vec<u8>, permissions: ProtectionFlags) -> MemoryResult<Self> {
        self.map(start, bytes, permissions)?;
        Ok(self)
    }

    /// Maps `bytes` at `start`; overlapping an existing region is rejected
    pub fn map(&self, start: Address, bytes: Vec<u8>, permissions: ProtectionFlags) -> MemoryResult<()> {
        let end = start
            .0
            .checked_add(bytes.len() as u64)
            .ok_or_else(|| MemoryError::InvalidAddress(format!("{} + {} overflows", start, bytes.len())))?;

        let mut segments = self.segments_mut()?;
        if segments.iter().any(|s| start.0 < s.end() && s.start.0 < end) {
            return Err(MemoryError::InvalidState(format!(
                "region {}..0x{:X} overlaps an existing region",
                start, end
            )));
        }

        let index = segments.partition_point(|s| s.start < start);
        segments.insert(
            index,
            Segment {
                start,
                bytes,
                permissions,
            },
        );
        Ok(())
    }

    /// Maps `size` bytes that enumerate as a region but cannot be read
    pub fn map_unreadable(&self, start: Address, size: usize) -> MemoryResult<()> {
        self.map(start, vec![0; size], ProtectionFlags::no_access())
    }

    /// Overwrites bytes regardless of permissions, as the target itself would
    pub fn poke(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        let mut segments = self.segments_mut()?;
        copy_into(&mut segments, address, data, |_| true)
            .map_err(|reason| MemoryError::write_failed(address, reason))
    }

    /// Marks the memory detached; subsequent reads and writes fail
    pub fn detach(&mut self) {
        self.attached = None;
    }

    fn segments(&self) -> MemoryResult<RwLockReadGuard<'_, Vec<Segment>>> {
        self.segments
            .read()
            .map_err(|_| MemoryError::InvalidState("memory lock poisoned".to_string()))
    }

    fn segments_mut(&self) -> MemoryResult<RwLockWriteGuard<'_, Vec<Segment>>> {
        self.segments
            .write()
            .map_err(|_| MemoryError::InvalidState("memory lock poisoned".to_string()))
    }

    fn ensure_attached(&self) -> MemoryResult<()> {
        if self.attached.is_none() {
            return Err(MemoryError::NotAttached);
        }
        Ok(())
    }
}

/// Walks the contiguous segments covering `[address, address + len)`,
/// calling `visit(segment, offset_in_segment, offset_in_request, count)`.
fn walk<F>(
    segments: &[Segment],
    address: Address,
    len: usize,
    allowed: impl Fn(ProtectionFlags) -> bool,
    mut visit: F,
) -> Result<(), String>
where
    F: FnMut(&Segment, usize, usize, usize),
{
    let end = address
        .0
        .checked_add(len as u64)
        .ok_or_else(|| "range overflows the address space".to_string())?;
    let mut cursor = address.0;
    let mut done = 0usize;

    for segment in segments {
        if cursor >= end {
            break;
        }
        if segment.end() <= cursor {
            continue;
        }
        if segment.start.0 > cursor {
            break;
        }
        if !allowed(segment.permissions) {
            return Err(format!("region at {} is {}", segment.start, segment.permissions));
        }
        let offset = (cursor - segment.start.0) as usize;
        let count = (segment.end().min(end) - cursor) as usize;
        visit(segment, offset, done, count);
        cursor += count as u64;
        done += count;
    }

    if cursor < end {
        return Err(format!("0x{:X} is not mapped", cursor));
    }
    Ok(())
}

fn copy_into(
    segments: &mut [Segment],
    address: Address,
    data: &[u8],
    allowed: impl Fn(ProtectionFlags) -> bool,
) -> Result<(), String> {
    let mut spans = Vec::new();
    walk(segments, address, data.len(), allowed, |segment, offset, done, count| {
        spans.push((segment.start, offset, done, count));
    })?;

    for (start, offset, done, count) in spans {
        if let Some(segment) = segments.iter_mut().find(|s| s.start == start) {
            segment.bytes[offset..offset + count].copy_from_slice(&data[done..done + count]);
        }
    }
    Ok(())
}

impl MemoryAccess for BufferMemory {
    fn attach(&mut self, pid: ProcessId) -> MemoryResult<()> {
        self.attached = Some(pid);
        Ok(())
    }

    fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    fn read(&self, address: Address, len: usize) -> MemoryResult<Vec<u8>> {
        self.ensure_attached()?;
        let segments = self.segments()?;
        let mut buffer = vec![0u8; len];

        walk(
            &segments,
            address,
            len,
            |p| p.is_readable(),
            |segment, offset, done, count| {
                buffer[done..done + count].copy_from_slice(&segment.bytes[offset..offset + count]);
            },
        )
        .map_err(|reason| MemoryError::read_failed(address, reason))?;

        Ok(buffer)
    }

    fn write(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        self.ensure_attached()?;
        let mut segments = self.segments_mut()?;
        copy_into(&mut segments, address, data, |p| p.is_writable())
            .map_err(|reason| MemoryError::write_failed(address, reason))
    }

    fn enumerate_regions(&self) -> MemoryResult<Vec<RegionInfo>> {
        self.ensure_attached()?;
        let segments = self.segments()?;
        Ok(segments
            .iter()
            .map(|s| RegionInfo::new(s.start, s.bytes.len() as u64, s.permissions))
            .collect())
    }
}

/// Cancels the running scan from inside every read it makes
#[cfg(test)]
pub(crate) struct CancelOnRead {
    pub(crate) inner: BufferMemory,
    pub(crate) token: std::sync::OnceLock<crate::memory::scanner::CancellationToken>,
}

#[cfg(test)]
impl MemoryAccess for CancelOnRead {
    fn attach(&mut self, pid: ProcessId) -> MemoryResult<()> {
        self.inner.attach(pid)
    }

    fn is_attached(&self) -> bool {
        self.inner.is_attached()
    }

    fn read(&self, address: Address, len: usize) -> MemoryResult<Vec<u8>> {
        if let Some(token) = self.token.get() {
            token.cancel();
        }
        self.inner.read(address, len)
    }

    fn write(&self, address: Address, data: &[u8]) -> MemoryResult<()> {
        self.inner.write(address, data)
    }

    fn enumerate_regions(&self) -> MemoryResult<Vec<RegionInfo>> {
        self.inner.enumerate_regions()
    }
}
