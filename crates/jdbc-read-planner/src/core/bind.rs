//! Named bind parameters.
//!
//! Catalog statements are written with Oracle-style `:name` placeholders.
//! Executors whose driver only understands positional markers use
//! [`to_positional`] to rewrite the statement and order the values.

use crate::error::{PlannerError, Result};

use super::value::SqlValue;

/// A value bound to a named placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct BindParam<'a> {
    /// Placeholder name without the leading colon.
    pub name: &'a str,
    /// Bound value.
    pub value: SqlValue,
}

impl<'a> BindParam<'a> {
    /// Bind a value to `name`.
    pub fn new(name: &'a str, value: impl Into<SqlValue>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}

/// Rewrite `:name` placeholders to `?` and return values in marker order.
///
/// Placeholders inside single-quoted literals and double-quoted identifiers
/// are left alone. A placeholder may appear more than once; its value is
/// repeated for each occurrence.
///
/// # Errors
///
/// Returns `PlannerError::Query` if the statement references a placeholder
/// that has no bound value.
pub fn to_positional<'p>(
    sql: &str,
    params: &'p [BindParam<'_>],
) -> Result<(String, Vec<&'p SqlValue>)> {
    let mut out = String::with_capacity(sql.len());
    let mut values = Vec::new();
    let mut chars = sql.char_indices().peekable();
    let mut quote: Option<char> = None;

    while let Some((idx, c)) = chars.next() {
        match quote {
            Some(q) => {
                out.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c == '\'' || c == '"' => {
                quote = Some(c);
                out.push(c);
            }
            None if c == ':' => {
                let starts_name = matches!(
                    chars.peek(),
                    Some((_, next)) if next.is_ascii_alphabetic() || *next == '_'
                );
                if !starts_name {
                    out.push(c);
                    continue;
                }
                let start = idx + 1;
                let mut end = start;
                while let Some((i, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || *next == '_' {
                        end = i + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let name = &sql[start..end];
                let param = params
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(name))
                    .ok_or_else(|| {
                        PlannerError::query(sql, format!("no value bound for :{}", name))
                    })?;
                out.push('?');
                values.push(&param.value);
            }
            None => out.push(c),
        }
    }

    Ok((out, values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_positional_rewrites_in_order() {
        let params = [BindParam::new("tab", "JOBS"), BindParam::new("own", "HR")];
        let (sql, values) = to_positional(
            "SELECT 1 FROM all_tables WHERE owner = :own AND table_name = :tab",
            &params,
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT 1 FROM all_tables WHERE owner = ? AND table_name = ?"
        );
        assert_eq!(
            values,
            vec![&SqlValue::Text("HR".into()), &SqlValue::Text("JOBS".into())]
        );
    }

    #[test]
    fn test_to_positional_skips_literals() {
        let params = [BindParam::new("own", "HR")];
        let (sql, values) = to_positional(
            "SELECT ':own', \"a:b\" FROM t WHERE owner = :own AND x NOT LIKE 'DR$%'",
            &params,
        )
        .unwrap();
        assert_eq!(
            sql,
            "SELECT ':own', \"a:b\" FROM t WHERE owner = ? AND x NOT LIKE 'DR$%'"
        );
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn test_to_positional_repeats_values() {
        let params = [BindParam::new("b1", "hr")];
        let (sql, values) =
            to_positional("SELECT :b1 FROM dual WHERE UPPER(x) = UPPER(:b1)", &params).unwrap();
        assert_eq!(sql, "SELECT ? FROM dual WHERE UPPER(x) = UPPER(?)");
        assert_eq!(values.len(), 2);
    }

    #[test]
    fn test_to_positional_missing_param() {
        let err = to_positional("SELECT * FROM t WHERE a = :missing", &[]).unwrap_err();
        assert!(err.to_string().contains(":missing"));
    }

    #[test]
    fn test_to_positional_ignores_bare_colons() {
        let (sql, values) = to_positional("SELECT '12:30' AS t, a :: int FROM x", &[]).unwrap();
        assert_eq!(sql, "SELECT '12:30' AS t, a :: int FROM x");
        assert!(values.is_empty());
    }
}
