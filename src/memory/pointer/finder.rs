//! Single-level pointer search

use tracing::{debug, info, warn};

use super::PointerChainResolver;
use crate::core::types::{Address, AddressRange, MemoryError, MemoryResult, PointerChain};
use crate::memory::access::decode_pointer;

impl PointerChainResolver {
    /// Find locations in `search_range` holding a pointer to within
    /// `max_offset` bytes of `target`.
    ///
    /// Each hit becomes an unresolved chain `[location + 0] + (target - value)`.
    /// Only single-level chains are searched; `max_depth` above 1 is accepted
    /// and treated as 1. `max_offset` defaults to the configured value.
    pub fn find_chains(
        &self,
        target: Address,
        search_range: AddressRange,
        max_offset: Option<u64>,
        max_depth: usize,
    ) -> MemoryResult<Vec<PointerChain>> {
        if max_depth == 0 {
            return Err(MemoryError::InvalidState(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if max_depth > 1 {
            warn!(max_depth, "multi-level pointer search is not supported, searching depth 1");
        }
        search_range.validate()?;

        let max_offset = max_offset.unwrap_or(self.config.max_offset);
        let width = self.width.bytes() as u64;
        let chunk_size = self.config.chunk_size.max(1) as u64;
        let target = self.width.truncate(target).0;

        let mut chains = Vec::new();
        let mut chunk_start = search_range.start.0;
        self.cancel.begin();

        'chunks: while chunk_start < search_range.end.0 {
            if self.cancel.is_cancelled() {
                break;
            }

            let chunk_end = chunk_start.saturating_add(chunk_size).min(search_range.end.0);
            let read_end = chunk_end.saturating_add(width - 1).min(search_range.end.0);
            let start = Address::new(chunk_start);

            let buffer = match self
                .access
                .read(start, (read_end - chunk_start) as usize)
                .or_else(|_| self.access.read(start, (chunk_end - chunk_start) as usize))
            {
                Ok(buffer) => buffer,
                Err(e) => {
                    debug!(chunk = %start, error = %e, "skipping unreadable chunk");
                    chunk_start = chunk_end;
                    continue;
                }
            };

            let mut location = start.align_up(width).0;
            while location < chunk_end {
                let offset = (location - chunk_start) as usize;
                let Some(window) = buffer.get(offset..offset + width as usize) else {
                    break;
                };

                let value = decode_pointer(window, width as usize);
                if value != 0 && value.abs_diff(target) <= max_offset {
                    let delta = target.wrapping_sub(value) as i64;
                    chains.push(PointerChain::from_path(Address::new(location), vec![0, delta]));
                    if chains.len() >= self.config.max_results {
                        break 'chunks;
                    }
                }
                location += width;
            }

            chunk_start = chunk_end;
        }

        let cancelled = self.cancel.is_cancelled();
        self.cancel.finish();
        info!(
            target = %Address::new(target),
            found = chains.len(),
            cancelled,
            "pointer search complete"
        );
        Ok(chains)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointerConfig;
    use crate::memory::buffer::{BufferMemory, CancelOnRead};
    use crate::memory::pointer::PointerWidth;
    use crate::memory::regions::ProtectionFlags;
    use std::sync::{Arc, OnceLock};

    const TARGET: u64 = 0x5000_0040;

    fn memory() -> Arc<BufferMemory> {
        let mut bytes = vec![0u8; 0x40];
        bytes[0x08..0x10].copy_from_slice(&0x5000_0000u64.to_le_bytes());
        bytes[0x18..0x20].copy_from_slice(&0x5000_0050u64.to_le_bytes());
        bytes[0x28..0x30].copy_from_slice(&0x4000_0000u64.to_le_bytes());
        Arc::new(
            BufferMemory::new()
                .with_region(Address::new(0x1000), bytes, ProtectionFlags::read_write())
                .unwrap(),
        )
    }

    fn resolver(chunk_size: usize, max_results: usize) -> PointerChainResolver {
        PointerChainResolver::from_config(
            memory(),
            PointerConfig {
                chunk_size,
                max_results,
                ..PointerConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_find_chains_depth_one() {
        let resolver = resolver(0x10, 100);
        let range = AddressRange::with_size(Address::new(0x1000), 0x40);

        let chains = resolver
            .find_chains(Address::new(TARGET), range, Some(0x100), 1)
            .unwrap();
        let found: Vec<(u64, Vec<i64>)> = chains
            .iter()
            .map(|c| (c.base_address.0, c.offsets.clone()))
            .collect();
        assert_eq!(
            found,
            vec![(0x1008, vec![0, 0x40]), (0x1018, vec![0, -0x10])]
        );
        assert!(chains.iter().all(|c| !c.is_valid));

        for chain in &chains {
            assert_eq!(
                resolver.resolve(chain.base_address, &chain.offsets).unwrap(),
                Address::new(TARGET)
            );
        }
    }

    #[test]
    fn test_find_chains_respects_offset_and_cap() {
        let resolver = resolver(0x10, 1);
        let range = AddressRange::with_size(Address::new(0x1000), 0x40);

        let chains = resolver
            .find_chains(Address::new(TARGET), range, Some(0x100), 1)
            .unwrap();
        assert_eq!(chains.len(), 1);

        let resolver = self::resolver(0x10, 100);
        let chains = resolver
            .find_chains(Address::new(TARGET), range, Some(0x20), 1)
            .unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].base_address, Address::new(0x1018));
    }

    #[test]
    fn test_find_chains_depth_handling() {
        let resolver = resolver(0x10, 100);
        let range = AddressRange::with_size(Address::new(0x1000), 0x40);

        let deep = resolver
            .find_chains(Address::new(TARGET), range, Some(0x100), 4)
            .unwrap();
        assert_eq!(deep.len(), 2);
        assert!(resolver
            .find_chains(Address::new(TARGET), range, Some(0x100), 0)
            .is_err());
    }

    #[test]
    fn test_find_chains_skips_unreadable_and_cancels() {
        let resolver = resolver(0x10, 100);
        // Runs past the mapped region into unmapped memory
        let range = AddressRange::new(Address::new(0x1000), Address::new(0x1100));
        let chains = resolver
            .find_chains(Address::new(TARGET), range, None, 1)
            .unwrap();
        assert_eq!(chains.len(), 2);

        assert!(!resolver.cancel());
        let chains = resolver
            .find_chains(Address::new(TARGET), range, None, 1)
            .unwrap();
        assert_eq!(chains.len(), 2);
    }

    #[test]
    fn test_find_chains_cancelled_mid_search_keeps_prefix() {
        let memory = Arc::new(CancelOnRead {
            inner: Arc::try_unwrap(memory()).unwrap(),
            token: OnceLock::new(),
        });
        let resolver = PointerChainResolver::from_config(
            memory.clone(),
            PointerConfig {
                chunk_size: 0x10,
                ..PointerConfig::default()
            },
        )
        .unwrap();
        memory.token.set(resolver.cancellation_token()).unwrap();

        let chains = resolver
            .find_chains(
                Address::new(TARGET),
                AddressRange::with_size(Address::new(0x1000), 0x40),
                Some(0x100),
                1,
            )
            .unwrap();
        let locations: Vec<Address> = chains.iter().map(|c| c.base_address).collect();
        assert_eq!(locations, vec![Address::new(0x1008)]);
    }

    #[test]
    fn test_find_chains_32_bit() {
        let mut bytes = vec![0u8; 0x10];
        bytes[0x4..0x8].copy_from_slice(&0x0040_0000u32.to_le_bytes());
        let memory = BufferMemory::new()
            .with_region(Address::new(0x2000), bytes, ProtectionFlags::read_only())
            .unwrap();
        let resolver = PointerChainResolver::new(Arc::new(memory), PointerWidth::Bits32);

        let chains = resolver
            .find_chains(
                Address::new(0x0040_001C),
                AddressRange::with_size(Address::new(0x2000), 0x10),
                Some(0x100),
                1,
            )
            .unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].offsets, vec![0, 0x1C]);
        assert_eq!(chains[0].path(), "[0x2004+0x0]+0x1C");
    }
}
