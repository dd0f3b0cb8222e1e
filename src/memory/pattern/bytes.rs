//! Wildcard byte patterns

use std::fmt;
use std::str::FromStr;

use crate::core::types::{MemoryError, MemoryResult};

/// One position of a byte pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternToken {
    Byte(u8),
    Wildcard,
}

impl PatternToken {
    #[inline]
    pub fn matches(&self, byte: u8) -> bool {
        match self {
            PatternToken::Byte(expected) => *expected == byte,
            PatternToken::Wildcard => true,
        }
    }
}

/// Immutable ordered sequence of literal bytes and wildcards
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BytePattern {
    tokens: Vec<PatternToken>,
}

impl BytePattern {
    /// Parse pattern text such as `"48 8B ?? ?? 89"`.
    ///
    /// Whitespace only separates groups; a group may hold several hex pairs
    /// (`"488B??"`). `??` and a lone `?` are wildcards. Errors name the
    /// offending group and the token position it starts at.
    pub fn compile(text: &str) -> MemoryResult<Self> {
        let mut tokens = Vec::new();

        for group in text.split_whitespace() {
            let position = tokens.len();
            if group == "?" {
                tokens.push(PatternToken::Wildcard);
                continue;
            }
            if group.len() % 2 != 0 {
                return Err(MemoryError::invalid_pattern(
                    group,
                    position,
                    "odd number of digits",
                ));
            }

            let raw = group.as_bytes();
            for (i, pair) in raw.chunks(2).enumerate() {
                let token = match pair {
                    b"??" => PatternToken::Wildcard,
                    _ => {
                        let digits = std::str::from_utf8(pair).map_err(|_| {
                            MemoryError::invalid_pattern(group, position + i, "not a hex pair")
                        })?;
                        // from_str_radix alone would take "+F" as 0x0F
                        if !pair.iter().all(u8::is_ascii_hexdigit) {
                            return Err(MemoryError::invalid_pattern(
                                digits,
                                position + i,
                                "not a hex pair",
                            ));
                        }
                        let byte = u8::from_str_radix(digits, 16).map_err(|_| {
                            MemoryError::invalid_pattern(digits, position + i, "not a hex pair")
                        })?;
                        PatternToken::Byte(byte)
                    }
                };
                tokens.push(token);
            }
        }

        if tokens.is_empty() {
            return Err(MemoryError::invalid_pattern(text, 0, "empty pattern"));
        }
        Ok(BytePattern { tokens })
    }

    /// Exact pattern with no wildcards
    pub fn from_bytes(bytes: &[u8]) -> MemoryResult<Self> {
        if bytes.is_empty() {
            return Err(MemoryError::invalid_pattern("", 0, "empty pattern"));
        }
        Ok(BytePattern {
            tokens: bytes.iter().copied().map(PatternToken::Byte).collect(),
        })
    }

    /// UTF-8 text followed by a NUL terminator
    pub fn from_text(text: &str) -> MemoryResult<Self> {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        Self::from_bytes(&bytes)
    }

    /// UTF-16LE text followed by a wide NUL terminator
    pub fn from_wide_text(text: &str) -> MemoryResult<Self> {
        let bytes: Vec<u8> = text
            .encode_utf16()
            .chain(std::iter::once(0))
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        Self::from_bytes(&bytes)
    }

    pub fn tokens(&self) -> &[PatternToken] {
        &self.tokens
    }

    /// Token count; never zero
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether `window` matches at its start. Short windows never match.
    #[inline]
    pub fn matches(&self, window: &[u8]) -> bool {
        window.len() >= self.tokens.len()
            && self
                .tokens
                .iter()
                .zip(window)
                .all(|(token, byte)| token.matches(*byte))
    }

    /// Offsets of every match within `data`, windows fully inside `data`
    pub fn find_in<'a>(&'a self, data: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
        data.windows(self.tokens.len())
            .enumerate()
            .filter(move |(_, window)| self.matches(window))
            .map(|(offset, _)| offset)
    }
}

impl FromStr for BytePattern {
    type Err = MemoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BytePattern::compile(s)
    }
}

impl fmt::Display for BytePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match token {
                PatternToken::Byte(b) => write!(f, "{:02X}", b)?,
                PatternToken::Wildcard => f.write_str("??")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ErrorKind;

    #[test]
    fn test_compile_with_wildcards() {
        let pattern = BytePattern::compile("48 8B ?? ?? 89").unwrap();
        assert_eq!(pattern.len(), 5);
        assert_eq!(pattern.tokens()[0], PatternToken::Byte(0x48));
        assert_eq!(pattern.tokens()[1], PatternToken::Byte(0x8B));
        assert_eq!(pattern.tokens()[2], PatternToken::Wildcard);
        assert_eq!(pattern.tokens()[4], PatternToken::Byte(0x89));
        assert_eq!(pattern.to_string(), "48 8B ?? ?? 89");
    }

    #[test]
    fn test_compile_is_whitespace_insensitive() {
        let packed = BytePattern::compile("488B????89").unwrap();
        let spaced = BytePattern::compile("  48 8b\t?? ?\n?? 89 ").unwrap();
        assert_eq!(packed.len(), 5);
        assert_eq!(spaced.len(), 6);
        assert_eq!(packed, BytePattern::compile("48 8B ?? ?? 89").unwrap());
    }

    #[test]
    fn test_compile_errors_name_token_and_position() {
        let err = BytePattern::compile("48 8B GG").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        match err {
            MemoryError::InvalidPattern { token, position, .. } => {
                assert_eq!(token, "GG");
                assert_eq!(position, 2);
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = BytePattern::compile("48 8B0").unwrap_err();
        assert!(matches!(err, MemoryError::InvalidPattern { position: 1, .. }));

        assert!(BytePattern::compile("").is_err());
        assert!(BytePattern::compile("   ").is_err());
        assert!(BytePattern::compile("4?").is_err());

        let err = BytePattern::compile("48 +F").unwrap_err();
        assert!(matches!(err, MemoryError::InvalidPattern { position: 1, .. }));
        assert!(BytePattern::compile("-1").is_err());
    }

    #[test]
    fn test_text_patterns() {
        assert_eq!(BytePattern::from_text("test").unwrap().len(), 5);
        // "test" in UTF-16 + wide NUL
        assert_eq!(BytePattern::from_wide_text("test").unwrap().len(), 10);
        assert!(BytePattern::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_matches_and_find_in() {
        let pattern = BytePattern::compile("48 8B ?? ?? 89").unwrap();
        assert!(pattern.matches(&[0x48, 0x8B, 0xC1, 0xFF, 0x89]));
        assert!(!pattern.matches(&[0x48, 0x8C, 0xC1, 0xFF, 0x89]));
        assert!(!pattern.matches(&[0x48, 0x8B, 0xC1, 0xFF]));

        let data = [0xAA, 0x48, 0x8B, 0, 0, 0x89, 0x48, 0x8B, 1, 2];
        let found: Vec<usize> = pattern.find_in(&data).collect();
        assert_eq!(found, vec![1]);
    }
}
