//! Scalar values returned by catalog and bound queries.
//!
//! Catalog lookups only ever need a single row of a few scalars, so values are
//! always owned. Numeric variants keep the representation the driver reported
//! so partition bounds can be handed back to the reader unchanged.

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single column value from a query result row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Integer value (any width up to 64 bits).
    Int(i64),

    /// Binary floating point value.
    Float(f64),

    /// Exact decimal value (NUMBER, DECIMAL, NUMERIC).
    Decimal(Decimal),

    /// Exact decimal value outside the 96-bit range of [`Decimal`],
    /// such as a wide `NUMBER(38)` key.
    BigDecimal(BigDecimal),

    /// Character data.
    Text(String),

    /// Calendar date.
    Date(NaiveDate),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),
}

impl SqlValue {
    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Check if this value belongs to a numeric domain.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlValue::Int(_)
                | SqlValue::Float(_)
                | SqlValue::Decimal(_)
                | SqlValue::BigDecimal(_)
        )
    }

    /// Short name of the value's domain, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "boolean",
            SqlValue::Int(_) => "integer",
            SqlValue::Float(_) => "float",
            SqlValue::Decimal(_) | SqlValue::BigDecimal(_) => "decimal",
            SqlValue::Text(_) => "text",
            SqlValue::Date(_) => "date",
            SqlValue::DateTime(_) => "datetime",
        }
    }

    /// Borrow the value as a string slice if it holds text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interpret the value as a non-negative row count.
    ///
    /// Drivers report `COUNT(*)` as integers or as scale-0 decimals
    /// depending on the engine, so both are accepted.
    pub fn as_count(&self) -> Option<u64> {
        match self {
            SqlValue::Int(v) => u64::try_from(*v).ok(),
            SqlValue::Decimal(d) if d.fract().is_zero() && !d.is_sign_negative() => {
                d.to_u64()
            }
            SqlValue::BigDecimal(d) if d.is_integer() && d >= &BigDecimal::from(0) => {
                d.with_scale(0).into_bigint_and_exponent().0.to_u64()
            }
            SqlValue::Float(f) if f.is_finite() && *f >= 0.0 && f.fract() == 0.0 => {
                Some(*f as u64)
            }
            SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Parse an exact numeric literal without losing digits.
    ///
    /// Literals that fit [`Decimal`] become `Decimal`; wider ones become
    /// `BigDecimal`. Returns `None` for anything that is not a number.
    ///
    /// # Examples
    ///
    /// ```
    /// use jdbc_read_planner::core::value::SqlValue;
    ///
    /// assert_eq!(SqlValue::parse_decimal("12.50").map(|v| v.kind()), Some("decimal"));
    /// assert!(SqlValue::parse_decimal("2020-01-01").is_none());
    /// ```
    pub fn parse_decimal(text: &str) -> Option<SqlValue> {
        let text = text.trim();
        match Decimal::from_str_exact(text) {
            Ok(d) => Some(SqlValue::Decimal(d)),
            Err(_) => BigDecimal::from_str(text).ok().map(SqlValue::BigDecimal),
        }
    }

    /// Convert NULL into `None`, keeping every other value.
    pub fn non_null(self) -> Option<SqlValue> {
        if self.is_null() {
            None
        } else {
            Some(self)
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(v) => write!(f, "{}", v),
            SqlValue::Int(v) => write!(f, "{}", v),
            SqlValue::Float(v) => write!(f, "{}", v),
            SqlValue::Decimal(v) => write!(f, "{}", v),
            SqlValue::BigDecimal(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "{}", v),
            SqlValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            SqlValue::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<Decimal> for SqlValue {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<BigDecimal> for SqlValue {
    fn from(v: BigDecimal) -> Self {
        SqlValue::BigDecimal(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_is_numeric() {
        assert!(SqlValue::Int(1).is_numeric());
        assert!(SqlValue::Float(1.5).is_numeric());
        assert!(SqlValue::Decimal(Decimal::ONE).is_numeric());
        assert!(!SqlValue::Text("1".into()).is_numeric());
        assert!(!SqlValue::Null.is_numeric());
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        assert!(!SqlValue::Date(date).is_numeric());
    }

    #[test]
    fn test_as_count() {
        assert_eq!(SqlValue::Int(42).as_count(), Some(42));
        assert_eq!(SqlValue::Int(-1).as_count(), None);
        assert_eq!(
            SqlValue::Decimal(Decimal::from_str("1000").unwrap()).as_count(),
            Some(1000)
        );
        assert_eq!(
            SqlValue::Decimal(Decimal::from_str("10.5").unwrap()).as_count(),
            None
        );
        assert_eq!(SqlValue::Text(" 7 ".into()).as_count(), Some(7));
        assert_eq!(SqlValue::Null.as_count(), None);
    }

    #[test]
    fn test_display_keeps_original_representation() {
        assert_eq!(SqlValue::Int(-99).to_string(), "-99");
        assert_eq!(
            SqlValue::Decimal(Decimal::from_str("9999999999999999999").unwrap()).to_string(),
            "9999999999999999999"
        );
        let ts = NaiveDate::from_ymd_opt(2020, 1, 20)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(SqlValue::DateTime(ts).to_string(), "2020-01-20 12:30:00");
    }

    #[test]
    fn test_parse_decimal_keeps_every_digit() {
        assert_eq!(
            SqlValue::parse_decimal(" 9999999999999999999 "),
            Some(SqlValue::Decimal(Decimal::from_str("9999999999999999999").unwrap()))
        );

        // NUMBER(38) maximum, beyond the Decimal range
        let wide = "99999999999999999999999999999999999999";
        assert_eq!(
            SqlValue::parse_decimal(wide),
            Some(SqlValue::BigDecimal(BigDecimal::from_str(wide).unwrap()))
        );
        assert!(SqlValue::BigDecimal(BigDecimal::from_str(wide).unwrap()).is_numeric());

        assert_eq!(SqlValue::parse_decimal("abc"), None);
        assert_eq!(SqlValue::parse_decimal(""), None);
    }

    #[test]
    fn test_big_decimal_as_count() {
        let big = |s: &str| SqlValue::BigDecimal(BigDecimal::from_str(s).unwrap());
        assert_eq!(big("1000").as_count(), Some(1000));
        assert_eq!(big("-1").as_count(), None);
        assert_eq!(big("1.5").as_count(), None);
        assert_eq!(big("1e30").as_count(), None);
    }

    #[test]
    fn test_non_null() {
        assert_eq!(SqlValue::Null.non_null(), None);
        assert_eq!(SqlValue::Int(0).non_null(), Some(SqlValue::Int(0)));
    }
}
