//! Typed memory values and the data types that decode them

use super::error::{MemoryError, MemoryResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Decode width and representation of a scanned value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "len", rename_all = "snake_case")]
pub enum DataType {
    Int32,
    Int64,
    Float32,
    Float64,
    /// NUL-terminated string read from a window of at most `max_len` bytes
    FixedString(usize),
    /// Exact byte sequence of `len` bytes
    RawBytes(usize),
}

impl DataType {
    /// Number of bytes read for one value of this type
    pub fn width(&self) -> usize {
        match self {
            DataType::Int32 | DataType::Float32 => 4,
            DataType::Int64 | DataType::Float64 => 8,
            DataType::FixedString(max_len) => *max_len,
            DataType::RawBytes(len) => *len,
        }
    }

    /// True for the fixed-width numeric types
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Int32 | DataType::Int64 | DataType::Float32 | DataType::Float64
        )
    }

    /// Rejects zero-width string and byte types
    pub fn validate(&self) -> MemoryResult<()> {
        if self.width() == 0 {
            return Err(MemoryError::InvalidValueType(format!(
                "{} has zero width",
                self
            )));
        }
        Ok(())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int32 => write!(f, "int32"),
            DataType::Int64 => write!(f, "int64"),
            DataType::Float32 => write!(f, "float32"),
            DataType::Float64 => write!(f, "float64"),
            DataType::FixedString(max_len) => write!(f, "string({})", max_len),
            DataType::RawBytes(len) => write!(f, "bytes({})", len),
        }
    }
}

/// A decoded value tagged with its representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum MemoryValue {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl MemoryValue {
    /// Parses a user-supplied literal for `data_type`.
    ///
    /// Integers accept decimal or `0x`-prefixed hex (two's complement bit
    /// pattern). Raw bytes are hex, whitespace-insensitive, and must be exactly
    /// the declared length.
    pub fn parse(literal: &str, data_type: DataType) -> MemoryResult<Self> {
        let text = literal.trim();
        let bad = |reason: String| MemoryError::invalid_value(literal, data_type, reason);

        match data_type {
            DataType::Int32 => {
                let value = match strip_hex_prefix(text) {
                    Some(hex) => hex_digits(hex).and_then(|hex| {
                        u32::from_str_radix(hex, 16)
                            .map(|v| v as i32)
                            .map_err(|e| e.to_string())
                    }),
                    None => text.parse::<i32>().map_err(|e| e.to_string()),
                };
                value.map(MemoryValue::Int32).map_err(bad)
            }
            DataType::Int64 => {
                let value = match strip_hex_prefix(text) {
                    Some(hex) => hex_digits(hex).and_then(|hex| {
                        u64::from_str_radix(hex, 16)
                            .map(|v| v as i64)
                            .map_err(|e| e.to_string())
                    }),
                    None => text.parse::<i64>().map_err(|e| e.to_string()),
                };
                value.map(MemoryValue::Int64).map_err(bad)
            }
            DataType::Float32 => text
                .parse::<f32>()
                .map(MemoryValue::Float32)
                .map_err(|e| bad(e.to_string())),
            DataType::Float64 => text
                .parse::<f64>()
                .map(MemoryValue::Float64)
                .map_err(|e| bad(e.to_string())),
            DataType::FixedString(max_len) => {
                // Strings are taken verbatim, surrounding whitespace included
                if literal.is_empty() {
                    return Err(bad("empty string".to_string()));
                }
                if literal.len() > max_len {
                    return Err(bad(format!(
                        "{} bytes exceeds the {} byte bound",
                        literal.len(),
                        max_len
                    )));
                }
                if literal.contains('\0') {
                    return Err(bad("embedded NUL".to_string()));
                }
                Ok(MemoryValue::String(literal.to_string()))
            }
            DataType::RawBytes(len) => {
                let compact: String = text.split_whitespace().collect();
                let bytes = hex::decode(&compact).map_err(|e| bad(e.to_string()))?;
                if bytes.len() != len {
                    return Err(bad(format!("expected {} bytes, got {}", len, bytes.len())));
                }
                Ok(MemoryValue::Bytes(bytes))
            }
        }
    }

    /// Decodes a value of `data_type` from the start of `bytes`.
    ///
    /// Returns `None` when fewer than `data_type.width()` bytes are available.
    /// Strings are the exception: they decode from whatever is available up
    /// to their bound, stopping at the first NUL.
    pub fn decode(bytes: &[u8], data_type: DataType) -> Option<Self> {
        let width = data_type.width();
        let window = match data_type {
            DataType::FixedString(_) if !bytes.is_empty() => bytes.get(..width.min(bytes.len()))?,
            _ => bytes.get(..width)?,
        };

        Some(match data_type {
            DataType::Int32 => MemoryValue::Int32(i32::from_le_bytes(window.try_into().ok()?)),
            DataType::Int64 => MemoryValue::Int64(i64::from_le_bytes(window.try_into().ok()?)),
            DataType::Float32 => {
                MemoryValue::Float32(f32::from_le_bytes(window.try_into().ok()?))
            }
            DataType::Float64 => {
                MemoryValue::Float64(f64::from_le_bytes(window.try_into().ok()?))
            }
            DataType::FixedString(_) => {
                let end = window.iter().position(|&b| b == 0).unwrap_or(window.len());
                MemoryValue::String(String::from_utf8_lossy(&window[..end]).into_owned())
            }
            DataType::RawBytes(_) => MemoryValue::Bytes(window.to_vec()),
        })
    }

    /// Converts the value to its little-endian byte representation
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            MemoryValue::Int32(v) => v.to_le_bytes().to_vec(),
            MemoryValue::Int64(v) => v.to_le_bytes().to_vec(),
            MemoryValue::Float32(v) => v.to_le_bytes().to_vec(),
            MemoryValue::Float64(v) => v.to_le_bytes().to_vec(),
            MemoryValue::String(s) => s.as_bytes().to_vec(),
            MemoryValue::Bytes(b) => b.clone(),
        }
    }

    /// Encodes the value for writing as `data_type`.
    ///
    /// Strings shorter than the bound get a NUL terminator; strings whose
    /// UTF-8 form exceeds the bound are rejected.
    pub fn encode(&self, data_type: DataType) -> MemoryResult<Vec<u8>> {
        if !self.matches_type(data_type) {
            return Err(MemoryError::InvalidValueType(format!(
                "{} value cannot be written as {}",
                self.type_name(),
                data_type
            )));
        }

        let mut bytes = self.to_bytes();
        if let DataType::FixedString(max_len) = data_type {
            if bytes.len() > max_len {
                return Err(MemoryError::InvalidValueType(format!(
                    "{} byte string does not fit {}",
                    bytes.len(),
                    data_type
                )));
            }
            if bytes.len() < max_len {
                bytes.push(0);
            }
        }
        Ok(bytes)
    }

    /// Whether this value could have been decoded as `data_type`.
    ///
    /// Strings are bounded by character count: lossy decoding turns each
    /// invalid byte into a multi-byte replacement character, so a decoded
    /// string may be longer in UTF-8 than the bytes it came from.
    pub fn matches_type(&self, data_type: DataType) -> bool {
        match (self, data_type) {
            (MemoryValue::Int32(_), DataType::Int32)
            | (MemoryValue::Int64(_), DataType::Int64)
            | (MemoryValue::Float32(_), DataType::Float32)
            | (MemoryValue::Float64(_), DataType::Float64) => true,
            (MemoryValue::String(s), DataType::FixedString(max_len)) => {
                s.chars().count() <= max_len
            }
            (MemoryValue::Bytes(b), DataType::RawBytes(len)) => b.len() == len,
            _ => false,
        }
    }

    /// Short name of the representation
    pub fn type_name(&self) -> &'static str {
        match self {
            MemoryValue::Int32(_) => "int32",
            MemoryValue::Int64(_) => "int64",
            MemoryValue::Float32(_) => "float32",
            MemoryValue::Float64(_) => "float64",
            MemoryValue::String(_) => "string",
            MemoryValue::Bytes(_) => "bytes",
        }
    }

    /// Orders two values of the same representation.
    ///
    /// Returns `None` for mismatched representations and for NaN floats.
    pub fn compare(&self, other: &MemoryValue) -> Option<Ordering> {
        match (self, other) {
            (MemoryValue::Int32(a), MemoryValue::Int32(b)) => Some(a.cmp(b)),
            (MemoryValue::Int64(a), MemoryValue::Int64(b)) => Some(a.cmp(b)),
            (MemoryValue::Float32(a), MemoryValue::Float32(b)) => a.partial_cmp(b),
            (MemoryValue::Float64(a), MemoryValue::Float64(b)) => a.partial_cmp(b),
            (MemoryValue::String(a), MemoryValue::String(b)) => Some(a.cmp(b)),
            (MemoryValue::Bytes(a), MemoryValue::Bytes(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// `self + delta` for numeric values; integers wrap
    pub fn checked_add(&self, delta: &MemoryValue) -> Option<MemoryValue> {
        match (self, delta) {
            (MemoryValue::Int32(a), MemoryValue::Int32(b)) => {
                Some(MemoryValue::Int32(a.wrapping_add(*b)))
            }
            (MemoryValue::Int64(a), MemoryValue::Int64(b)) => {
                Some(MemoryValue::Int64(a.wrapping_add(*b)))
            }
            (MemoryValue::Float32(a), MemoryValue::Float32(b)) => Some(MemoryValue::Float32(a + b)),
            (MemoryValue::Float64(a), MemoryValue::Float64(b)) => Some(MemoryValue::Float64(a + b)),
            _ => None,
        }
    }

    /// `self - delta` for numeric values; integers wrap
    pub fn checked_sub(&self, delta: &MemoryValue) -> Option<MemoryValue> {
        match (self, delta) {
            (MemoryValue::Int32(a), MemoryValue::Int32(b)) => {
                Some(MemoryValue::Int32(a.wrapping_sub(*b)))
            }
            (MemoryValue::Int64(a), MemoryValue::Int64(b)) => {
                Some(MemoryValue::Int64(a.wrapping_sub(*b)))
            }
            (MemoryValue::Float32(a), MemoryValue::Float32(b)) => Some(MemoryValue::Float32(a - b)),
            (MemoryValue::Float64(a), MemoryValue::Float64(b)) => Some(MemoryValue::Float64(a - b)),
            _ => None,
        }
    }
}

fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

/// `from_str_radix` tolerates a leading sign; hex literals must be digits only
fn hex_digits(text: &str) -> Result<&str, String> {
    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(text)
    } else {
        Err(format!("'{}' is not a hex number", text))
    }
}

impl fmt::Display for MemoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryValue::Int32(v) => write!(f, "{}", v),
            MemoryValue::Int64(v) => write!(f, "{}", v),
            MemoryValue::Float32(v) => write!(f, "{}", v),
            MemoryValue::Float64(v) => write!(f, "{}", v),
            MemoryValue::String(s) => write!(f, "\"{}\"", s),
            MemoryValue::Bytes(b) => write!(f, "{}", hex::encode_upper(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_width() {
        assert_eq!(DataType::Int32.width(), 4);
        assert_eq!(DataType::Int64.width(), 8);
        assert_eq!(DataType::Float32.width(), 4);
        assert_eq!(DataType::Float64.width(), 8);
        assert_eq!(DataType::FixedString(32).width(), 32);
        assert_eq!(DataType::RawBytes(3).width(), 3);
        assert!(DataType::RawBytes(0).validate().is_err());
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(
            MemoryValue::parse("100", DataType::Int32).unwrap(),
            MemoryValue::Int32(100)
        );
        assert_eq!(
            MemoryValue::parse("-7", DataType::Int64).unwrap(),
            MemoryValue::Int64(-7)
        );
        assert_eq!(
            MemoryValue::parse("0xFFFFFFFF", DataType::Int32).unwrap(),
            MemoryValue::Int32(-1)
        );
        assert_eq!(
            MemoryValue::parse("1.5", DataType::Float32).unwrap(),
            MemoryValue::Float32(1.5)
        );
        assert_eq!(
            MemoryValue::parse("de ad BE EF", DataType::RawBytes(4)).unwrap(),
            MemoryValue::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF])
        );
        assert_eq!(
            MemoryValue::parse("hp", DataType::FixedString(8)).unwrap(),
            MemoryValue::String("hp".to_string())
        );
    }

    #[test]
    fn test_parse_rejects_bad_literals() {
        let err = MemoryValue::parse("abc", DataType::Int32).unwrap_err();
        assert_eq!(err.kind(), crate::core::types::ErrorKind::Parse);

        assert!(MemoryValue::parse("4294967296", DataType::Int32).is_err());
        assert!(MemoryValue::parse("x", DataType::Float64).is_err());
        assert!(MemoryValue::parse("DEAD", DataType::RawBytes(4)).is_err());
        assert!(MemoryValue::parse("DEA", DataType::RawBytes(2)).is_err());
        assert!(MemoryValue::parse("", DataType::FixedString(4)).is_err());
        assert!(MemoryValue::parse("too long", DataType::FixedString(4)).is_err());
        assert!(MemoryValue::parse("0x+1", DataType::Int32).is_err());
        assert!(MemoryValue::parse("0x-1", DataType::Int64).is_err());
        assert!(MemoryValue::parse("0x", DataType::Int32).is_err());
    }

    #[test]
    fn test_decode() {
        let bytes = 0x12345678i32.to_le_bytes();
        assert_eq!(
            MemoryValue::decode(&bytes, DataType::Int32),
            Some(MemoryValue::Int32(0x12345678))
        );
        assert_eq!(MemoryValue::decode(&bytes[..3], DataType::Int32), None);
        assert_eq!(MemoryValue::decode(&bytes, DataType::Int64), None);
    }

    #[test]
    fn test_decode_string_stops_at_nul_and_is_lenient() {
        let bytes = b"abc\0def";
        assert_eq!(
            MemoryValue::decode(bytes, DataType::FixedString(7)),
            Some(MemoryValue::String("abc".to_string()))
        );

        let invalid = [b'o', 0xFF, b'k', 0];
        match MemoryValue::decode(&invalid, DataType::FixedString(4)) {
            Some(MemoryValue::String(s)) => {
                assert!(s.starts_with('o'));
                assert!(s.ends_with('k'));
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn test_decode_string_from_short_window() {
        assert_eq!(
            MemoryValue::decode(b"hp", DataType::FixedString(8)),
            Some(MemoryValue::String("hp".to_string()))
        );
        assert_eq!(MemoryValue::decode(b"", DataType::FixedString(8)), None);
    }

    #[test]
    fn test_lossy_string_still_matches_its_type() {
        let decoded = MemoryValue::decode(&[0xFF; 4], DataType::FixedString(4)).unwrap();
        assert!(decoded.to_bytes().len() > 4);
        assert!(decoded.matches_type(DataType::FixedString(4)));
        assert!(!decoded.matches_type(DataType::FixedString(3)));
        assert!(decoded.encode(DataType::FixedString(4)).is_err());
    }

    #[test]
    fn test_encode() {
        assert_eq!(
            MemoryValue::Int32(0x12345678).encode(DataType::Int32).unwrap(),
            vec![0x78, 0x56, 0x34, 0x12]
        );
        assert_eq!(
            MemoryValue::String("Hi".to_string())
                .encode(DataType::FixedString(4))
                .unwrap(),
            vec![b'H', b'i', 0]
        );
        assert_eq!(
            MemoryValue::String("Hi".to_string())
                .encode(DataType::FixedString(2))
                .unwrap(),
            vec![b'H', b'i']
        );
        assert!(MemoryValue::Int32(1).encode(DataType::Int64).is_err());
    }

    #[test]
    fn test_compare_dispatch() {
        use std::cmp::Ordering;

        assert_eq!(
            MemoryValue::Int32(1).compare(&MemoryValue::Int32(2)),
            Some(Ordering::Less)
        );
        assert_eq!(MemoryValue::Int32(1).compare(&MemoryValue::Int64(1)), None);
        assert_eq!(
            MemoryValue::Float32(f32::NAN).compare(&MemoryValue::Float32(1.0)),
            None
        );
        assert_eq!(
            MemoryValue::String("b".into()).compare(&MemoryValue::String("a".into())),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_arithmetic_wraps() {
        assert_eq!(
            MemoryValue::Int32(i32::MAX).checked_add(&MemoryValue::Int32(1)),
            Some(MemoryValue::Int32(i32::MIN))
        );
        assert_eq!(
            MemoryValue::Int64(10).checked_sub(&MemoryValue::Int64(3)),
            Some(MemoryValue::Int64(7))
        );
        assert_eq!(
            MemoryValue::String("a".into()).checked_add(&MemoryValue::String("b".into())),
            None
        );
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&MemoryValue::Int32(5)).unwrap();
        assert_eq!(json, r#"{"type":"Int32","value":5}"#);

        let json = serde_json::to_string(&DataType::FixedString(16)).unwrap();
        assert_eq!(json, r#"{"kind":"fixed_string","len":16}"#);
        let back: DataType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DataType::FixedString(16));

        let back: DataType = serde_json::from_str(r#"{"kind":"int32"}"#).unwrap();
        assert_eq!(back, DataType::Int32);
    }
}
