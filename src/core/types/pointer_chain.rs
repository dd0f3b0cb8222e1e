//! Pointer chain type

use super::Address;
use serde::{Deserialize, Serialize};

/// A base address plus the offsets followed to reach a value.
///
/// `resolved_address` is a cache written only by an explicit resolve; it is
/// not a live view of target memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerChain {
    pub base_address: Address,
    pub offsets: Vec<i64>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_address: Option<Address>,
    #[serde(default)]
    pub is_valid: bool,
}

impl PointerChain {
    /// Creates an unresolved chain
    pub fn new(base_address: Address, offsets: Vec<i64>, description: impl Into<String>) -> Self {
        PointerChain {
            base_address,
            offsets,
            description: description.into(),
            resolved_address: None,
            is_valid: false,
        }
    }

    /// Creates an unresolved chain described by its own path
    pub fn from_path(base_address: Address, offsets: Vec<i64>) -> Self {
        let description = format_path(base_address, &offsets);
        PointerChain::new(base_address, offsets, description)
    }

    /// Number of dereferences performed when resolving
    pub fn depth(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Renders the chain as `[0x...+0x10]+0x8`
    pub fn path(&self) -> String {
        format_path(self.base_address, &self.offsets)
    }

    /// Drops the cached resolution
    pub fn invalidate(&mut self) {
        self.resolved_address = None;
        self.is_valid = false;
    }
}

fn format_offset(offset: i64) -> String {
    if offset >= 0 {
        format!("+0x{:X}", offset)
    } else {
        format!("-0x{:X}", offset.unsigned_abs())
    }
}

fn format_path(base: Address, offsets: &[i64]) -> String {
    let Some((last, derefs)) = offsets.split_last() else {
        return format!("0x{:X}", base.0);
    };

    let mut path = format!("0x{:X}", base.0);
    for offset in derefs {
        path = format!("[{}{}]", path, format_offset(*offset));
    }
    path.push_str(&format_offset(*last));
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chain_is_unresolved() {
        let chain = PointerChain::new(Address::new(0x1000), vec![0x10, 0x20], "health");
        assert_eq!(chain.description, "health");
        assert!(!chain.is_valid);
        assert!(chain.resolved_address.is_none());
        assert_eq!(chain.depth(), 1);
    }

    #[test]
    fn test_path_format() {
        let chain = PointerChain::from_path(Address::new(0x1000), vec![0x10, -0x8]);
        assert_eq!(chain.path(), "[0x1000+0x10]-0x8");
        assert_eq!(chain.description, chain.path());

        let nested = PointerChain::from_path(Address::new(0x400000), vec![0x8, 0x0, 0x1C]);
        assert_eq!(nested.path(), "[[0x400000+0x8]+0x0]+0x1C");

        let identity = PointerChain::from_path(Address::new(0xAB), vec![]);
        assert_eq!(identity.path(), "0xAB");
        assert_eq!(identity.depth(), 0);
    }

    #[test]
    fn test_invalidate() {
        let mut chain = PointerChain::new(Address::new(0x1000), vec![0x4], "x");
        chain.resolved_address = Some(Address::new(0x1004));
        chain.is_valid = true;
        chain.invalidate();
        assert!(!chain.is_valid);
        assert!(chain.resolved_address.is_none());
    }
}
