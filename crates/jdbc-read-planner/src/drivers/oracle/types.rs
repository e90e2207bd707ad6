//! Oracle data type normalisation.
//!
//! `all_tab_columns.data_type` reports fractional-second precision inline
//! for timestamp and interval types, so `TIMESTAMP(3)` and `TIMESTAMP(6)`
//! would otherwise compare as different types.

use once_cell::sync::Lazy;
use regex::Regex;

/// Single-digit precision qualifier such as `(6)`.
static PRECISION_QUALIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([0-9]\)").expect("precision qualifier pattern is valid"));

/// Type class accepted for range partitioning.
pub const NUMBER: &str = "NUMBER";

/// Strip precision noise from `TIMESTAMP*` and `INTERVAL DAY*` types.
///
/// Every other type string is returned unchanged. Removal repeats until no
/// qualifier is left, so applying the function twice gives the same result
/// as applying it once.
///
/// # Examples
///
/// ```
/// use jdbc_read_planner::drivers::oracle::normalise_data_type;
///
/// assert_eq!(normalise_data_type("TIMESTAMP(3) WITH TIME ZONE"), "TIMESTAMP WITH TIME ZONE");
/// assert_eq!(normalise_data_type("NUMBER"), "NUMBER");
/// ```
pub fn normalise_data_type(data_type: &str) -> String {
    if data_type.starts_with("TIMESTAMP") || data_type.starts_with("INTERVAL DAY") {
        let mut normalised = data_type.to_string();
        while PRECISION_QUALIFIER.is_match(&normalised) {
            normalised = PRECISION_QUALIFIER.replace_all(&normalised, "").into_owned();
        }
        normalised
    } else {
        data_type.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_precision_removed() {
        assert_eq!(normalise_data_type("TIMESTAMP(0)"), "TIMESTAMP");
        assert_eq!(normalise_data_type("TIMESTAMP(6)"), "TIMESTAMP");
        assert_eq!(
            normalise_data_type("TIMESTAMP(3) WITH TIME ZONE"),
            "TIMESTAMP WITH TIME ZONE"
        );
        assert_eq!(
            normalise_data_type("TIMESTAMP(9) WITH LOCAL TIME ZONE"),
            "TIMESTAMP WITH LOCAL TIME ZONE"
        );
    }

    #[test]
    fn test_interval_precision_removed() {
        assert_eq!(
            normalise_data_type("INTERVAL DAY(5) TO SECOND(1)"),
            "INTERVAL DAY TO SECOND"
        );
        assert_eq!(
            normalise_data_type("INTERVAL DAY(2) TO SECOND(6)"),
            "INTERVAL DAY TO SECOND"
        );
    }

    #[test]
    fn test_other_types_unchanged() {
        for t in [
            "NUMBER",
            "VARCHAR2",
            "DATE",
            "FLOAT(126)",
            "INTERVAL YEAR(2) TO MONTH",
            "timestamp(6)",
            "RAW(16)",
        ] {
            assert_eq!(normalise_data_type(t), t);
        }
    }

    #[test]
    fn test_normalise_is_idempotent() {
        for t in [
            "TIMESTAMP(0)",
            "TIMESTAMP(3) WITH TIME ZONE",
            "INTERVAL DAY(5) TO SECOND(1)",
            "TIMESTAMP((1))",
            "TIMESTAMP((1)2)",
            "TIMESTAMP(12)",
            "NUMBER",
            "",
        ] {
            let once = normalise_data_type(t);
            assert_eq!(normalise_data_type(&once), once, "input {t:?}");
        }
    }
}
