//! Typed comparisons evaluated against scanned values

use std::cmp::Ordering;

use crate::core::types::{CompareMode, DataType, MemoryError, MemoryResult, MemoryValue};

/// A [`CompareMode`] with its literals parsed for one data type
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Exact(MemoryValue),
    BiggerThan(MemoryValue),
    SmallerThan(MemoryValue),
    Between(MemoryValue, MemoryValue),
    Increased,
    IncreasedBy(MemoryValue),
    Decreased,
    DecreasedBy(MemoryValue),
    Changed,
    Unchanged,
}

impl Comparison {
    /// Parses the mode's literals for `data_type`.
    ///
    /// Fails before any memory is touched: bad literals are parse errors,
    /// an inverted `Between` and arithmetic on non-numeric types are state
    /// errors.
    pub fn compile(mode: &CompareMode, data_type: DataType) -> MemoryResult<Self> {
        let parse = |literal: &str| MemoryValue::parse(literal, data_type);

        Ok(match mode {
            CompareMode::Exact(v) => Comparison::Exact(parse(v)?),
            CompareMode::BiggerThan(v) => Comparison::BiggerThan(parse(v)?),
            CompareMode::SmallerThan(v) => Comparison::SmallerThan(parse(v)?),
            CompareMode::Between(low, high) => {
                let low_value = parse(low)?;
                let high_value = parse(high)?;
                match low_value.compare(&high_value) {
                    Some(Ordering::Less | Ordering::Equal) => {}
                    _ => {
                        return Err(MemoryError::InvalidRange {
                            low: low.clone(),
                            high: high.clone(),
                        })
                    }
                }
                Comparison::Between(low_value, high_value)
            }
            CompareMode::Increased => Comparison::Increased,
            CompareMode::Decreased => Comparison::Decreased,
            CompareMode::Changed => Comparison::Changed,
            CompareMode::Unchanged => Comparison::Unchanged,
            CompareMode::IncreasedBy(v) => {
                require_numeric(mode, data_type)?;
                Comparison::IncreasedBy(parse(v)?)
            }
            CompareMode::DecreasedBy(v) => {
                require_numeric(mode, data_type)?;
                Comparison::DecreasedBy(parse(v)?)
            }
        })
    }

    /// Whether evaluation needs the candidate's stored value
    pub fn needs_history(&self) -> bool {
        matches!(
            self,
            Comparison::Increased
                | Comparison::IncreasedBy(_)
                | Comparison::Decreased
                | Comparison::DecreasedBy(_)
                | Comparison::Changed
                | Comparison::Unchanged
        )
    }

    /// Evaluates the comparison for a fresh reading.
    ///
    /// History modes never match without a `previous` value.
    pub fn matches(&self, current: &MemoryValue, previous: Option<&MemoryValue>) -> bool {
        match self {
            Comparison::Exact(target) => current.compare(target) == Some(Ordering::Equal),
            Comparison::BiggerThan(target) => current.compare(target) == Some(Ordering::Greater),
            Comparison::SmallerThan(target) => current.compare(target) == Some(Ordering::Less),
            Comparison::Between(low, high) => {
                matches!(
                    current.compare(low),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(current.compare(high), Some(Ordering::Less | Ordering::Equal))
            }
            Comparison::Increased => {
                previous.and_then(|p| current.compare(p)) == Some(Ordering::Greater)
            }
            Comparison::Decreased => {
                previous.and_then(|p| current.compare(p)) == Some(Ordering::Less)
            }
            // Changed/unchanged look at the raw representation so NaN and
            // signed zeros behave like the bytes in memory
            Comparison::Changed => previous.is_some_and(|p| p.to_bytes() != current.to_bytes()),
            Comparison::Unchanged => previous.is_some_and(|p| p.to_bytes() == current.to_bytes()),
            Comparison::IncreasedBy(delta) => previous
                .and_then(|p| p.checked_add(delta))
                .is_some_and(|expected| current.compare(&expected) == Some(Ordering::Equal)),
            Comparison::DecreasedBy(delta) => previous
                .and_then(|p| p.checked_sub(delta))
                .is_some_and(|expected| current.compare(&expected) == Some(Ordering::Equal)),
        }
    }
}

fn require_numeric(mode: &CompareMode, data_type: DataType) -> MemoryResult<()> {
    if !data_type.is_numeric() {
        return Err(MemoryError::InvalidValueType(format!(
            "'{}' needs a numeric type, not {}",
            mode, data_type
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ErrorKind;

    fn compile(mode: CompareMode, data_type: DataType) -> Comparison {
        Comparison::compile(&mode, data_type).unwrap()
    }

    #[test]
    fn test_literal_modes() {
        let exact = compile(CompareMode::Exact("100".into()), DataType::Int32);
        assert!(exact.matches(&MemoryValue::Int32(100), None));
        assert!(!exact.matches(&MemoryValue::Int32(99), None));

        let bigger = compile(CompareMode::BiggerThan("10".into()), DataType::Int64);
        assert!(bigger.matches(&MemoryValue::Int64(11), None));
        assert!(!bigger.matches(&MemoryValue::Int64(10), None));

        let smaller = compile(CompareMode::SmallerThan("1.5".into()), DataType::Float32);
        assert!(smaller.matches(&MemoryValue::Float32(1.0), None));
        assert!(!smaller.matches(&MemoryValue::Float32(f32::NAN), None));

        let between = compile(CompareMode::Between("10".into(), "20".into()), DataType::Int32);
        assert!(between.matches(&MemoryValue::Int32(10), None));
        assert!(between.matches(&MemoryValue::Int32(20), None));
        assert!(!between.matches(&MemoryValue::Int32(21), None));
    }

    #[test]
    fn test_between_inverted_is_state_error() {
        let err = Comparison::compile(
            &CompareMode::Between("20".into(), "10".into()),
            DataType::Int32,
        )
        .unwrap_err();
        assert!(matches!(err, MemoryError::InvalidRange { .. }));
        assert_eq!(err.kind(), ErrorKind::State);

        assert!(Comparison::compile(
            &CompareMode::Between("5".into(), "5".into()),
            DataType::Int32
        )
        .is_ok());
    }

    #[test]
    fn test_bad_literal_is_parse_error() {
        let err = Comparison::compile(&CompareMode::Exact("abc".into()), DataType::Int32)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_history_modes() {
        let old = MemoryValue::Int32(100);
        let new = MemoryValue::Int32(150);

        assert!(Comparison::Increased.matches(&new, Some(&old)));
        assert!(!Comparison::Decreased.matches(&new, Some(&old)));
        assert!(Comparison::Changed.matches(&new, Some(&old)));
        assert!(!Comparison::Unchanged.matches(&new, Some(&old)));
        assert!(Comparison::Unchanged.matches(&old, Some(&old)));
        assert!(!Comparison::Increased.matches(&new, None));

        let by = compile(CompareMode::IncreasedBy("50".into()), DataType::Int32);
        assert!(by.matches(&new, Some(&old)));
        let by = compile(CompareMode::DecreasedBy("50".into()), DataType::Int32);
        assert!(by.matches(&old, Some(&new)));
        assert!(!by.matches(&new, Some(&old)));
    }

    #[test]
    fn test_arithmetic_modes_need_numeric_types() {
        let err = Comparison::compile(
            &CompareMode::IncreasedBy("1".into()),
            DataType::FixedString(4),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::State);
    }

    #[test]
    fn test_strings_and_bytes() {
        let exact = compile(CompareMode::Exact("hp".into()), DataType::FixedString(8));
        assert!(exact.matches(&MemoryValue::String("hp".into()), None));
        assert!(!exact.matches(&MemoryValue::String("hpx".into()), None));

        let bytes = compile(CompareMode::Exact("DEADBEEF".into()), DataType::RawBytes(4));
        assert!(bytes.matches(&MemoryValue::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]), None));
        assert!(!bytes.matches(&MemoryValue::Bytes(vec![0xDE, 0xAD, 0xBE, 0xEE]), None));
    }
}
