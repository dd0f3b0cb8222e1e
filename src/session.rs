//! Serializable snapshot of scan state
//!
//! A [`Session`] captures the scan engine's candidates, the resolver's
//! registered pointer chains and a list of pattern matches, and writes them
//! as JSON. Restoring a session reproduces the same candidates, chains and
//! matches. Cached chain resolutions are not saved; restored chains must be
//! resolved again against the live target.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::types::{Address, MemoryError, MemoryResult, PointerChain, ScanResult};
use crate::memory::pattern::{AobResult, BytePattern};
use crate::memory::pointer::PointerChainResolver;
use crate::memory::scanner::ValueScanEngine;

/// Saved form of a pointer chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRecord {
    pub base: Address,
    pub offsets: Vec<i64>,
    pub description: String,
}

/// Saved form of a pattern match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AobRecord {
    pub address: Address,
    pub pattern_text: String,
    pub matched_bytes_hex: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub scan_results: Vec<ScanResult>,
    #[serde(default)]
    pub pointer_chains: Vec<ChainRecord>,
    #[serde(default)]
    pub aob_results: Vec<AobRecord>,
}

impl Session {
    /// Snapshot the current state of the engines
    pub fn capture(engine: &ValueScanEngine, resolver: &PointerChainResolver, aob_results: &[AobResult]) -> Self {
        Session {
            scan_results: engine.results().to_vec(),
            pointer_chains: resolver
                .chains()
                .iter()
                .map(|chain| ChainRecord {
                    base: chain.base_address,
                    offsets: chain.offsets.clone(),
                    description: chain.description.clone(),
                })
                .collect(),
            aob_results: aob_results
                .iter()
                .map(|result| AobRecord {
                    address: result.address,
                    pattern_text: result.pattern.to_string(),
                    matched_bytes_hex: hex::encode_upper(&result.matched_bytes),
                })
                .collect(),
        }
    }

    /// Load the snapshot into the engines and return the saved pattern
    /// matches.
    ///
    /// Everything is validated before either engine is touched, so a bad
    /// session leaves the current state intact.
    pub fn restore(
        &self,
        engine: &mut ValueScanEngine,
        resolver: &mut PointerChainResolver,
    ) -> MemoryResult<Vec<AobResult>> {
        let aob_results = self.aob_results()?;

        engine.restore(self.scan_results.clone())?;
        resolver.clear_chains();
        for record in &self.pointer_chains {
            resolver.add_chain(PointerChain::new(
                record.base,
                record.offsets.clone(),
                record.description.clone(),
            ));
        }

        info!(
            candidates = self.scan_results.len(),
            chains = self.pointer_chains.len(),
            aob_results = aob_results.len(),
            "session restored"
        );
        Ok(aob_results)
    }

    /// Rebuild the saved pattern matches; matches of the same text share
    /// one compiled pattern
    pub fn aob_results(&self) -> MemoryResult<Vec<AobResult>> {
        let mut patterns: HashMap<&str, Arc<BytePattern>> = HashMap::new();
        let mut results = Vec::with_capacity(self.aob_results.len());

        for record in &self.aob_results {
            let pattern = match patterns.get(record.pattern_text.as_str()) {
                Some(pattern) => pattern.clone(),
                None => {
                    let pattern = Arc::new(BytePattern::compile(&record.pattern_text)?);
                    patterns.insert(&record.pattern_text, pattern.clone());
                    pattern
                }
            };

            let matched_bytes = hex::decode(&record.matched_bytes_hex).map_err(|e| {
                MemoryError::invalid_value(&record.matched_bytes_hex, "hex", e.to_string())
            })?;
            if matched_bytes.len() != pattern.len() || !pattern.matches(&matched_bytes) {
                return Err(MemoryError::InvalidState(format!(
                    "saved bytes at {} do not match pattern {}",
                    record.address, record.pattern_text
                )));
            }

            results.push(AobResult {
                address: record.address,
                pattern,
                matched_bytes,
            });
        }
        Ok(results)
    }

    pub fn to_json(&self) -> MemoryResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> MemoryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the session as JSON to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> MemoryResult<()> {
        fs::write(path.as_ref(), self.to_json()?)?;
        info!(path = %path.as_ref().display(), "session saved");
        Ok(())
    }

    /// Read a session written by [`save`](Self::save)
    pub fn load<P: AsRef<Path>>(path: P) -> MemoryResult<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }
}
