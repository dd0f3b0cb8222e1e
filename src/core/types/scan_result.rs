//! Scan result, comparison mode and progress types

use super::{Address, DataType, MemoryValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A candidate tracked by the value scanner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub address: Address,
    pub data_type: DataType,
    pub value: MemoryValue,
    pub previous_value: Option<MemoryValue>,
}

impl ScanResult {
    /// Creates a new scan result
    pub fn new(address: Address, data_type: DataType, value: MemoryValue) -> Self {
        ScanResult {
            address,
            data_type,
            value,
            previous_value: None,
        }
    }

    /// Creates a scan result with previous value for comparison
    pub fn with_previous(
        address: Address,
        data_type: DataType,
        value: MemoryValue,
        previous: MemoryValue,
    ) -> Self {
        ScanResult {
            address,
            data_type,
            value,
            previous_value: Some(previous),
        }
    }

    /// Records a fresh reading, shifting the current value into history
    pub fn update(&mut self, fresh: MemoryValue) {
        let old = std::mem::replace(&mut self.value, fresh);
        self.previous_value = Some(old);
    }
}

/// How a reading is compared during a scan.
///
/// Literal operands are kept as text and parsed against the scan's data
/// type before any memory is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    Exact(String),
    BiggerThan(String),
    SmallerThan(String),
    /// Inclusive on both ends
    Between(String, String),
    Increased,
    IncreasedBy(String),
    Decreased,
    DecreasedBy(String),
    Changed,
    Unchanged,
}

impl CompareMode {
    /// Checks if this mode compares against the candidate's stored value
    pub fn requires_previous(&self) -> bool {
        matches!(
            self,
            CompareMode::Increased
                | CompareMode::IncreasedBy(_)
                | CompareMode::Decreased
                | CompareMode::DecreasedBy(_)
                | CompareMode::Changed
                | CompareMode::Unchanged
        )
    }

    /// Checks if this mode carries a literal operand
    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            CompareMode::Exact(_)
                | CompareMode::IncreasedBy(_)
                | CompareMode::DecreasedBy(_)
                | CompareMode::Between(_, _)
                | CompareMode::BiggerThan(_)
                | CompareMode::SmallerThan(_)
        )
    }

    /// Modes usable without history
    pub fn allowed_in_first_scan(&self) -> bool {
        !self.requires_previous()
    }
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareMode::Exact(v) => write!(f, "exact {}", v),
            CompareMode::BiggerThan(v) => write!(f, "> {}", v),
            CompareMode::SmallerThan(v) => write!(f, "< {}", v),
            CompareMode::Between(low, high) => write!(f, "between {} and {}", low, high),
            CompareMode::Increased => write!(f, "increased"),
            CompareMode::IncreasedBy(v) => write!(f, "increased by {}", v),
            CompareMode::Decreased => write!(f, "decreased"),
            CompareMode::DecreasedBy(v) => write!(f, "decreased by {}", v),
            CompareMode::Changed => write!(f, "changed"),
            CompareMode::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Progress snapshot handed to a progress sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub processed: u64,
    pub total: u64,
    pub results_found: usize,
}

impl ScanProgress {
    /// Whole percentage completed, 0..=100
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let processed = self.processed.min(self.total) as u128;
        (processed * 100 / self.total as u128) as u8
    }
}
