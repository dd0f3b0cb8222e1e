//! Pointer chain resolution
//!
//! A chain `[[base + o0] + o1] + o2` is resolved by reading a pointer at
//! `base + o0`, then at `that + o1`, and adding `o2` without a final read.
//! Resolved addresses are cached on the chain and only change when the caller
//! resolves again.

mod finder;

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::config::PointerConfig;
use crate::core::types::{Address, DataType, MemoryError, MemoryResult, MemoryValue, PointerChain};
use crate::memory::access::{read_pointer, MemoryAccess};
use crate::memory::reader::MemoryReader;
use crate::memory::scanner::CancellationToken;
use crate::memory::writer::MemoryWriter;

/// Pointer width of the target process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerWidth {
    Bits32,
    Bits64,
}

impl PointerWidth {
    /// Parses a width given in bits
    pub fn from_bits(bits: u32) -> MemoryResult<Self> {
        match bits {
            32 => Ok(PointerWidth::Bits32),
            64 => Ok(PointerWidth::Bits64),
            other => Err(MemoryError::InvalidState(format!(
                "unsupported pointer width: {} bits",
                other
            ))),
        }
    }

    /// Width in bytes
    pub const fn bytes(self) -> usize {
        match self {
            PointerWidth::Bits32 => 4,
            PointerWidth::Bits64 => 8,
        }
    }

    /// Truncates an address to this width
    pub const fn truncate(self, address: Address) -> Address {
        match self {
            PointerWidth::Bits32 => Address(address.0 & 0xFFFF_FFFF),
            PointerWidth::Bits64 => address,
        }
    }
}

impl fmt::Display for PointerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bytes() * 8)
    }
}

/// Resolves pointer chains and keeps a registry of the caller's chains
pub struct PointerChainResolver {
    access: Arc<dyn MemoryAccess>,
    width: PointerWidth,
    config: PointerConfig,
    chains: Vec<PointerChain>,
    cancel: CancellationToken,
}

impl PointerChainResolver {
    pub fn new(access: Arc<dyn MemoryAccess>, width: PointerWidth) -> Self {
        let config = PointerConfig {
            pointer_width: (width.bytes() * 8) as u32,
            ..PointerConfig::default()
        };
        PointerChainResolver {
            access,
            width,
            config,
            chains: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Creates a resolver using the configured pointer width and limits
    pub fn from_config(access: Arc<dyn MemoryAccess>, config: PointerConfig) -> MemoryResult<Self> {
        let width = PointerWidth::from_bits(config.pointer_width)?;
        Ok(PointerChainResolver {
            access,
            width,
            config,
            chains: Vec::new(),
            cancel: CancellationToken::new(),
        })
    }

    pub fn width(&self) -> PointerWidth {
        self.width
    }

    /// Requests cancellation of a running [`find_chains`](Self::find_chains).
    ///
    /// Returns false when no search is running.
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Follow `offsets` from `base`.
    ///
    /// Every offset but the last is followed by a pointer read; the last is
    /// only added. A failed read at any level fails the whole resolution.
    pub fn resolve(&self, base: Address, offsets: &[i64]) -> MemoryResult<Address> {
        let Some((last, path)) = offsets.split_last() else {
            return Ok(self.width.truncate(base));
        };

        let mut current = self.width.truncate(base);
        for (level, offset) in path.iter().enumerate() {
            let slot = self.width.truncate(current.offset(*offset));
            let value = read_pointer(self.access.as_ref(), slot, self.width.bytes())
                .map_err(|e| MemoryError::pointer_chain_broken(level, format!("{} at {}", e, slot)))?;
            current = self.width.truncate(Address::new(value));
        }

        Ok(self.width.truncate(current.offset(*last)))
    }

    /// Re-resolve `chain`, caching the result. Returns whether it resolved.
    pub fn update_chain(&self, chain: &mut PointerChain) -> bool {
        match self.resolve(chain.base_address, &chain.offsets) {
            Ok(address) => {
                chain.resolved_address = Some(address);
                chain.is_valid = true;
                true
            }
            Err(e) => {
                debug!(chain = %chain.path(), error = %e, "pointer chain unresolved");
                chain.invalidate();
                false
            }
        }
    }

    /// Register a chain, returning its index
    pub fn add_chain(&mut self, chain: PointerChain) -> usize {
        self.chains.push(chain);
        self.chains.len() - 1
    }

    /// Remove a registered chain; later indices shift down by one
    pub fn remove_chain(&mut self, index: usize) -> MemoryResult<PointerChain> {
        if index >= self.chains.len() {
            return Err(MemoryError::InvalidState(format!(
                "no pointer chain at index {}",
                index
            )));
        }
        Ok(self.chains.remove(index))
    }

    /// Drop every registered chain
    pub fn clear_chains(&mut self) {
        self.chains.clear();
    }

    pub fn chains(&self) -> &[PointerChain] {
        &self.chains
    }

    pub fn chain(&self, index: usize) -> Option<&PointerChain> {
        self.chains.get(index)
    }

    /// Re-resolve every registered chain; returns how many resolved
    pub fn update_all(&mut self) -> usize {
        let mut chains = std::mem::take(&mut self.chains);
        let resolved = chains
            .iter_mut()
            .filter_map(|chain| self.update_chain(chain).then_some(()))
            .count();
        self.chains = chains;
        resolved
    }

    /// Read the value at the chain's cached address
    pub fn get_value(&self, chain: &PointerChain, data_type: DataType) -> MemoryResult<MemoryValue> {
        let address = resolved(chain)?;
        MemoryReader::new(self.access.as_ref()).read_value(address, data_type)
    }

    /// Write `value` at the chain's cached address
    pub fn set_value(&self, chain: &PointerChain, value: &MemoryValue, data_type: DataType) -> MemoryResult<()> {
        let address = resolved(chain)?;
        MemoryWriter::new(self.access.as_ref()).write_value(address, value, data_type)
    }
}

fn resolved(chain: &PointerChain) -> MemoryResult<Address> {
    match chain.resolved_address {
        Some(address) if chain.is_valid => Ok(address),
        _ => Err(MemoryError::ChainNotResolved(chain.description.clone())),
    }
}
