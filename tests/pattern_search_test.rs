//! Integration tests for array-of-bytes search

use std::sync::Arc;

use memscope::config::PatternConfig;
use memscope::memory::{FilterCriteria, ProtectionFlags};
use memscope::*;
use pretty_assertions::assert_eq;

fn code_memory() -> BufferMemory {
    let mut text = vec![0xCCu8; 0x3000];
    // mov rax, [rip+disp32]
    text[0x100..0x107].copy_from_slice(&[0x48, 0x8B, 0x05, 0x11, 0x22, 0x33, 0x44]);
    text[0x2FFC..0x3000].copy_from_slice(&[0x48, 0x8B, 0x0D, 0x99]);

    let mut data = vec![0u8; 0x1000];
    data[0x40..0x44].copy_from_slice(&[0x48, 0x8B, 0x00, 0x00]);

    BufferMemory::new()
        .with_region(Address::new(0x140001000), text, ProtectionFlags::execute_read())
        .unwrap()
        .with_region(Address::new(0x140010000), data, ProtectionFlags::read_write())
        .unwrap()
}

fn matcher(memory: BufferMemory) -> PatternMatcher {
    PatternMatcher::new(
        Arc::new(memory),
        PatternConfig {
            chunk_size: 0x1000,
            ..PatternConfig::default()
        },
    )
}

#[test]
fn test_compile_and_verify() {
    let matcher = matcher(code_memory());
    let pattern = PatternMatcher::compile("48 8B ?? ??").unwrap();
    assert_eq!(pattern.len(), 4);

    assert!(matcher.verify_at(Address::new(0x140001100), &pattern));
    assert!(!matcher.verify_at(Address::new(0x140001101), &pattern));
}

#[test]
fn test_search_all_regions_in_order() {
    let matcher = matcher(code_memory());
    let pattern = BytePattern::compile("48 8B ?? ??").unwrap();

    let results = matcher.search_all(&pattern, FilterCriteria::new(), 100).unwrap();
    let found: Vec<u64> = results.iter().map(|r| r.address.as_u64()).collect();
    assert_eq!(found, vec![0x140001100, 0x140003FFC, 0x140010040]);
    assert!(results
        .iter()
        .all(|r| r.matched_bytes.len() == pattern.len() && pattern.matches(&r.matched_bytes)));
}

#[test]
fn test_search_executable_only() {
    let matcher = matcher(code_memory());
    let pattern = BytePattern::compile("48 8B").unwrap();

    let results = matcher
        .search_all(&pattern, FilterCriteria::new().executable(), 100)
        .unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn test_signature_round_trip() {
    let matcher = matcher(code_memory());
    let text = matcher
        .pattern_from_address(Address::new(0x140001100), 7, &[3, 4, 5, 6])
        .unwrap();
    assert_eq!(text, "48 8B 05 ?? ?? ?? ??");

    let pattern = BytePattern::compile(&text).unwrap();
    let results = matcher.search_all(&pattern, FilterCriteria::new(), 10).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].address, Address::new(0x140001100));
}

#[test]
fn test_parse_errors() {
    for text in ["", "4", "48 8", "48 XY", "48?"] {
        let err = BytePattern::compile(text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse, "pattern {text:?}");
    }
}
