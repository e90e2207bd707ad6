//! Partition-count arithmetic and plan reporting.
//!
//! Bounds arrive in whatever numeric representation the driver reported.
//! All operands are promoted to [`BigDecimal`] before dividing, so wide
//! `NUMBER` keys lose no precision through `f64` or a fixed-width decimal.

mod report;

pub use report::{PartitionReport, ReportRow};

use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};

use crate::core::value::SqlValue;
use crate::error::{PlannerError, Result};

/// Number of stride-wide chunks needed to cover `[lo, hi]`.
///
/// Returns `ceil((hi - lo) / stride)` with a floor of 1. An exact multiple
/// does not add a trailing partial chunk.
///
/// A zero stride yields a single partition.
///
/// # Errors
///
/// - `PlannerError::NotSupported` if any operand is not numeric (dates,
///   timestamps, text, NULL) or is a non-finite float.
/// - `PlannerError::InvalidRange` if `hi < lo`, the stride is negative, or
///   the count does not fit a `u128`.
///
/// # Examples
///
/// ```
/// use jdbc_read_planner::core::value::SqlValue;
/// use jdbc_read_planner::partition::num_partitions;
///
/// let n = num_partitions(&SqlValue::Int(1), &SqlValue::Int(105), &SqlValue::Int(10)).unwrap();
/// assert_eq!(n, 11);
/// ```
pub fn num_partitions(lo: &SqlValue, hi: &SqlValue, stride: &SqlValue) -> Result<u128> {
    let lower = to_big_decimal(lo)?;
    let upper = to_big_decimal(hi)?;
    let step = to_big_decimal(stride)?;

    let invalid = || PlannerError::invalid_range(lo.to_string(), hi.to_string(), stride.to_string());

    let zero = BigDecimal::from(0);
    if upper < lower || step < zero {
        return Err(invalid());
    }
    if step == zero {
        return Ok(1);
    }

    let span = upper - lower;
    let remainder = span.clone() % step.clone();
    // `span - remainder` is an exact multiple of the step
    let whole = ((span - remainder.clone()) / step).with_scale(0);
    let count = if remainder == zero {
        whole
    } else {
        whole + BigDecimal::from(1)
    };

    let (digits, _) = count.with_scale(0).into_bigint_and_exponent();
    Ok(digits.to_u128().ok_or_else(invalid)?.max(1))
}

fn to_big_decimal(value: &SqlValue) -> Result<BigDecimal> {
    let unparsable = |text: String| {
        PlannerError::NotSupported(format!("Cannot partition over value {}", text))
    };
    match value {
        SqlValue::Int(v) => Ok(BigDecimal::from(*v)),
        SqlValue::BigDecimal(d) => Ok(d.clone()),
        SqlValue::Decimal(d) => {
            let text = d.to_string();
            BigDecimal::from_str(&text).map_err(|_| unparsable(text))
        }
        // The shortest round-trip text is the value the driver meant
        SqlValue::Float(f) if f.is_finite() => {
            let text = f.to_string();
            BigDecimal::from_str(&text).map_err(|_| unparsable(text))
        }
        SqlValue::Float(f) => Err(PlannerError::NotSupported(format!(
            "Cannot partition over non-finite value {}",
            f
        ))),
        other => Err(PlannerError::NotSupported(format!(
            "Partitioning over {} values is not supported: {}",
            other.kind(),
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn dec(s: &str) -> SqlValue {
        SqlValue::Decimal(Decimal::from_str(s).unwrap())
    }

    fn n(lo: SqlValue, hi: SqlValue, stride: SqlValue) -> u128 {
        num_partitions(&lo, &hi, &stride).unwrap()
    }

    // =========================================================================
    // Integer bounds
    // =========================================================================

    #[test]
    fn test_integer_bounds() {
        assert_eq!(n(1.into(), 100.into(), 10.into()), 10);
        assert_eq!(n(1.into(), 105.into(), 10.into()), 11);
        assert_eq!(n((-99).into(), 1.into(), 10.into()), 10);
    }

    #[test]
    fn test_exact_multiple_has_no_partial_chunk() {
        assert_eq!(n(0.into(), 100.into(), 10.into()), 10);
        assert_eq!(n(0.into(), 101.into(), 10.into()), 11);
    }

    #[test]
    fn test_minimum_one_partition() {
        assert_eq!(n(5.into(), 5.into(), 10.into()), 1);
        assert_eq!(n(1.into(), 2.into(), 1_000_000.into()), 1);
        assert_eq!(n(1.into(), 100.into(), 0.into()), 1);
    }

    #[test]
    fn test_extreme_i64_bounds() {
        assert_eq!(
            n(SqlValue::Int(i64::MIN), SqlValue::Int(i64::MAX), SqlValue::Int(i64::MAX)),
            3
        );
    }

    // =========================================================================
    // Float, decimal and mixed bounds
    // =========================================================================

    #[test]
    fn test_float_bounds() {
        assert_eq!(n(1.0.into(), 100.0.into(), 10.0.into()), 10);
        assert_eq!(n(1.5.into(), 105.5.into(), 10.0.into()), 11);
    }

    #[test]
    fn test_decimal_bounds() {
        assert_eq!(n(dec("1"), dec("100"), dec("10")), 10);
        assert_eq!(n(dec("0.5"), dec("10.5"), dec("2.5")), 4);
    }

    #[test]
    fn test_big_decimal_bounds() {
        assert_eq!(
            n(
                dec("1"),
                dec("9999999999999999999"),
                dec("1000000000000000000")
            ),
            10
        );
    }

    fn big(s: &str) -> SqlValue {
        SqlValue::BigDecimal(BigDecimal::from_str(s).unwrap())
    }

    #[test]
    fn test_bounds_beyond_fixed_decimal_range() {
        assert_eq!(n(0.0.into(), 1e30.into(), 1e29.into()), 10);
        assert_eq!(n((-1e30).into(), 1e30.into(), 1e29.into()), 20);
        assert_eq!(
            n(dec("-50000000000000000000000000000"), dec("50000000000000000000000000000"), 1_000_000.into()),
            100_000_000_000_000_000_000_000
        );
        assert_eq!(
            n(
                big("1"),
                big("99999999999999999999999999999999999999"),
                big("10000000000000000000000000000000000000")
            ),
            10
        );
        assert_eq!(
            n(SqlValue::Int(0), big("100000000000000000000000000000000001"), dec("1000000000000000000000000000")),
            100_000_001
        );
    }

    #[test]
    fn test_count_beyond_u128_is_invalid() {
        let err = num_partitions(&0.into(), &big("1e60"), &1.into()).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidRange { .. }));
    }

    #[test]
    fn test_mixed_operand_types() {
        assert_eq!(n(SqlValue::Int(1), dec("100"), SqlValue::Float(10.0)), 10);
        assert_eq!(n(SqlValue::Float(-99.0), SqlValue::Int(1), dec("10")), 10);
        assert_eq!(n(dec("1"), SqlValue::Int(105), SqlValue::Int(10)), 11);
    }

    #[test]
    fn test_matches_ceiling_over_grid() {
        for lo in [-50i64, -7, 0, 3] {
            for hi in [lo, lo + 1, lo + 9, lo + 10, lo + 11, lo + 1000] {
                for stride in [1i64, 3, 10, 999] {
                    let span = hi - lo;
                    let expected = ((span + stride - 1) / stride).max(1) as u128;
                    assert_eq!(
                        n(lo.into(), hi.into(), stride.into()),
                        expected,
                        "lo={lo} hi={hi} stride={stride}"
                    );
                }
            }
        }
    }

    // =========================================================================
    // Unsupported domains and invalid ranges
    // =========================================================================

    #[test]
    fn test_datetime_not_supported() {
        let lo = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let hi = NaiveDate::from_ymd_opt(2020, 1, 20).unwrap();

        let err = num_partitions(&lo.into(), &hi.into(), &2.into()).unwrap_err();
        assert!(matches!(err, PlannerError::NotSupported(_)));

        let err = num_partitions(
            &lo.and_hms_opt(0, 0, 0).unwrap().into(),
            &hi.and_hms_opt(0, 0, 0).unwrap().into(),
            &2.into(),
        )
        .unwrap_err();
        assert!(matches!(err, PlannerError::NotSupported(_)));
    }

    #[test]
    fn test_other_domains_not_supported() {
        let text = num_partitions(&"a".into(), &"z".into(), &1.into()).unwrap_err();
        assert!(matches!(text, PlannerError::NotSupported(_)));
        let null = num_partitions(&SqlValue::Null, &1.into(), &1.into()).unwrap_err();
        assert!(matches!(null, PlannerError::NotSupported(_)));
        let nan = num_partitions(&f64::NAN.into(), &1.into(), &1.into()).unwrap_err();
        assert!(matches!(nan, PlannerError::NotSupported(_)));
    }

    #[test]
    fn test_reversed_range_fails() {
        let err = num_partitions(&100.into(), &1.into(), &10.into()).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidRange { .. }));
    }

    #[test]
    fn test_negative_stride_fails() {
        let err = num_partitions(&1.into(), &100.into(), &(-10).into()).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidRange { .. }));
    }
}
