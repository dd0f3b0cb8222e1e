//! Memory region filtering functionality

use crate::core::types::Address;
use crate::memory::regions::RegionInfo;

/// Criteria for filtering memory regions
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    /// Filter by minimum size
    pub min_size: Option<u64>,
    /// Filter by maximum size
    pub max_size: Option<u64>,
    /// Filter by readable regions only
    pub readable_only: bool,
    /// Filter by writable regions only
    pub writable_only: bool,
    /// Filter by executable regions only
    pub executable_only: bool,
    /// Keep regions lying entirely inside `[start, end)`
    pub address_range: Option<(Address, Address)>,
}

impl FilterCriteria {
    /// Create a new filter criteria builder
    pub fn new() -> Self {
        FilterCriteria::default()
    }

    /// Set minimum size filter
    pub fn with_min_size(mut self, size: u64) -> Self {
        self.min_size = Some(size);
        self
    }

    /// Set maximum size filter
    pub fn with_max_size(mut self, size: u64) -> Self {
        self.max_size = Some(size);
        self
    }

    /// Filter for readable regions only
    pub fn readable(mut self) -> Self {
        self.readable_only = true;
        self
    }

    /// Filter for writable regions only
    pub fn writable(mut self) -> Self {
        self.writable_only = true;
        self
    }

    /// Filter for executable regions only
    pub fn executable(mut self) -> Self {
        self.executable_only = true;
        self
    }

    /// Set address range filter
    pub fn with_address_range(mut self, start: Address, end: Address) -> Self {
        self.address_range = Some((start, end));
        self
    }
}

/// Filter for memory regions
pub struct RegionFilter {
    criteria: FilterCriteria,
}

impl RegionFilter {
    /// Create a new region filter with the given criteria
    pub fn new(criteria: FilterCriteria) -> Self {
        RegionFilter { criteria }
    }

    /// Apply the filter, returning matches sorted by start address
    pub fn apply(&self, regions: &[RegionInfo]) -> Vec<RegionInfo> {
        let mut matched: Vec<RegionInfo> = regions
            .iter()
            .filter(|region| self.matches(region))
            .copied()
            .collect();
        matched.sort_by_key(|region| region.start);
        matched
    }

    /// Check if a region matches the filter criteria
    pub fn matches(&self, region: &RegionInfo) -> bool {
        if let Some(min) = self.criteria.min_size {
            if region.size() < min {
                return false;
            }
        }

        if let Some(max) = self.criteria.max_size {
            if region.size() > max {
                return false;
            }
        }

        if self.criteria.readable_only && !region.is_readable() {
            return false;
        }

        if self.criteria.writable_only && !region.is_writable() {
            return false;
        }

        if self.criteria.executable_only && !region.is_executable() {
            return false;
        }

        if let Some((start, end)) = self.criteria.address_range {
            if region.start < start || region.end > end {
                return false;
            }
        }

        true
    }

    /// Total size of regions matching the filter
    pub fn total_size(&self, regions: &[RegionInfo]) -> u64 {
        regions
            .iter()
            .filter(|region| self.matches(region))
            .map(|region| region.size())
            .sum()
    }
}

/// Common filter presets
pub mod presets {
    use super::*;

    /// Readable code, where signatures usually live
    pub fn executable_code() -> FilterCriteria {
        FilterCriteria::new().readable().executable()
    }

    /// Readable and writable data, where game state usually lives
    pub fn writable_data() -> FilterCriteria {
        FilterCriteria::new().readable().writable()
    }

    /// Everything that can be read
    pub fn readable() -> FilterCriteria {
        FilterCriteria::new().readable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::regions::ProtectionFlags;

    fn region(start: u64, size: u64, permissions: ProtectionFlags) -> RegionInfo {
        RegionInfo::new(Address::new(start), size, permissions)
    }

    #[test]
    fn test_filter_criteria_builder() {
        let criteria = FilterCriteria::new()
            .with_min_size(4096)
            .with_max_size(1024 * 1024)
            .readable()
            .writable();

        assert_eq!(criteria.min_size, Some(4096));
        assert_eq!(criteria.max_size, Some(1024 * 1024));
        assert!(criteria.readable_only);
        assert!(criteria.writable_only);
        assert!(!criteria.executable_only);
    }

    #[test]
    fn test_region_filter_matching() {
        let data = region(0x1000, 8192, ProtectionFlags::read_write());

        let filter = RegionFilter::new(FilterCriteria::new().with_min_size(4096).readable());
        assert!(filter.matches(&data));

        let filter2 = RegionFilter::new(FilterCriteria::new().executable());
        assert!(!filter2.matches(&data));

        let filter3 = RegionFilter::new(
            FilterCriteria::new().with_address_range(Address::new(0x1000), Address::new(0x2000)),
        );
        assert!(!filter3.matches(&data));
    }

    #[test]
    fn test_apply_sorts_by_start() {
        let regions = vec![
            region(0x3000, 0x100, ProtectionFlags::read_write()),
            region(0x1000, 0x100, ProtectionFlags::no_access()),
            region(0x2000, 0x100, ProtectionFlags::execute_read()),
        ];

        let filter = RegionFilter::new(presets::readable());
        let kept = filter.apply(&regions);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].start, Address::new(0x2000));
        assert_eq!(kept[1].start, Address::new(0x3000));
        assert_eq!(filter.total_size(&regions), 0x200);
    }

    #[test]
    fn test_filter_presets() {
        let exec_filter = presets::executable_code();
        assert!(exec_filter.executable_only);
        assert!(exec_filter.readable_only);

        let data_filter = presets::writable_data();
        assert!(data_filter.writable_only);
        assert!(!data_filter.executable_only);
    }
}
