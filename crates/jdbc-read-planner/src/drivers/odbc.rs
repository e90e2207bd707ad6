//! ODBC-backed query executor.
//!
//! **Requirements:**
//! - The `odbc` feature must be enabled
//! - An ODBC driver manager (unixODBC on Linux/macOS) and a driver for the
//!   target engine, e.g. Oracle Instant Client ODBC or MySQL Connector/ODBC
//!
//! Values are fetched as text and converted using the column types the
//! driver reports, so numeric bounds keep their exact decimal digits.

use chrono::{NaiveDate, NaiveDateTime};
use odbc_api::buffers::TextRowSet;
use odbc_api::parameter::InputParameter;
use odbc_api::{
    Connection, ConnectionOptions, Cursor, DataType, Environment, IntoParameter, ResultSetMetadata,
};
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::core::bind::{to_positional, BindParam};
use crate::core::traits::{QueryExecutor, QuerySession, Row};
use crate::core::value::SqlValue;
use crate::error::{PlannerError, Result};
use crate::orchestrator::Connector;

/// Rows fetched per round trip. Catalog queries return few rows.
const BATCH_SIZE: usize = 256;

/// Upper bound on the text buffer for a single value.
const MAX_TEXT_LEN: usize = 4096;

static ENVIRONMENT: OnceCell<Environment> = OnceCell::new();

fn environment() -> Result<&'static Environment> {
    ENVIRONMENT
        .get_or_try_init(Environment::new)
        .map_err(PlannerError::from)
}

/// A single ODBC connection used as a [`QueryExecutor`].
///
/// ODBC connections are not safe to share between threads; open one
/// executor per concurrent planning unit.
pub struct OdbcExecutor {
    conn: Connection<'static>,
}

impl OdbcExecutor {
    /// Connect with an ODBC connection string.
    pub fn connect(connection_string: &str) -> Result<Self> {
        let env = environment()?;
        let conn =
            env.connect_with_connection_string(connection_string, ConnectionOptions::default())?;
        info!("Connected via ODBC");
        Ok(Self { conn })
    }
}

impl QueryExecutor for OdbcExecutor {
    fn session(&self) -> Result<Box<dyn QuerySession + '_>> {
        Ok(Box::new(OdbcSession { conn: &self.conn }))
    }
}

struct OdbcSession<'a> {
    conn: &'a Connection<'static>,
}

impl QuerySession for OdbcSession<'_> {
    fn query(&mut self, sql: &str, params: &[BindParam<'_>]) -> Result<Vec<Row>> {
        let (positional, values) = to_positional(sql, params)?;
        debug!("odbc: {}", positional.trim());

        let bound: Vec<Box<dyn InputParameter>> = values
            .into_iter()
            .map(|v| -> Box<dyn InputParameter> {
                match v {
                    SqlValue::Null => Box::new(None::<String>.into_parameter()),
                    other => Box::new(other.to_string().into_parameter()),
                }
            })
            .collect();

        let cursor = self
            .conn
            .execute(&positional, bound.as_slice())
            .map_err(|e| PlannerError::query(sql, e.to_string()))?;

        let Some(mut cursor) = cursor else {
            return Ok(Vec::new());
        };

        let fail = |e: odbc_api::Error| PlannerError::query(sql, e.to_string());

        let num_cols = cursor.num_result_cols().map_err(fail)? as u16;
        let mut types = Vec::with_capacity(num_cols as usize);
        for col in 1..=num_cols {
            types.push(cursor.col_data_type(col).map_err(fail)?);
        }

        let mut buffers =
            TextRowSet::for_cursor(BATCH_SIZE, &mut cursor, Some(MAX_TEXT_LEN)).map_err(fail)?;
        let mut row_cursor = cursor.bind_buffer(&mut buffers).map_err(fail)?;

        let mut rows = Vec::new();
        while let Some(batch) = row_cursor.fetch().map_err(fail)? {
            for row_idx in 0..batch.num_rows() {
                let row = types
                    .iter()
                    .enumerate()
                    .map(|(col_idx, data_type)| {
                        batch
                            .at(col_idx, row_idx)
                            .map(|bytes| convert(&String::from_utf8_lossy(bytes), data_type))
                            .unwrap_or(SqlValue::Null)
                    })
                    .collect();
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

/// Convert a fetched text value using the driver-reported column type.
///
/// Values that do not parse are kept as text.
fn convert(text: &str, data_type: &DataType) -> SqlValue {
    let text = text.trim_end_matches('\0');
    let parsed = match data_type {
        DataType::TinyInt | DataType::SmallInt | DataType::Integer | DataType::BigInt => {
            text.trim().parse().ok().map(SqlValue::Int)
        }
        DataType::Numeric { .. } | DataType::Decimal { .. } => SqlValue::parse_decimal(text),
        DataType::Float { .. } | DataType::Real | DataType::Double => {
            text.trim().parse().ok().map(SqlValue::Float)
        }
        DataType::Bit => match text.trim() {
            "1" => Some(SqlValue::Bool(true)),
            "0" => Some(SqlValue::Bool(false)),
            _ => None,
        },
        DataType::Date => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .ok()
            .map(SqlValue::Date),
        DataType::Timestamp { .. } => {
            NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(SqlValue::DateTime)
        }
        _ => None,
    };
    parsed.unwrap_or_else(|| SqlValue::Text(text.to_string()))
}

/// Opens one [`OdbcExecutor`] per planning unit.
#[derive(Clone)]
pub struct OdbcConnector {
    connection_string: String,
}

impl OdbcConnector {
    pub fn new(connection_string: impl Into<String>) -> Self {
        Self {
            connection_string: connection_string.into(),
        }
    }
}

impl std::fmt::Debug for OdbcConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdbcConnector").finish_non_exhaustive()
    }
}

impl Connector for OdbcConnector {
    type Executor = OdbcExecutor;

    fn connect(&self) -> Result<OdbcExecutor> {
        OdbcExecutor::connect(&self.connection_string)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_convert_numeric_types() {
        assert_eq!(convert("42", &DataType::Integer), SqlValue::Int(42));
        assert_eq!(
            convert("9999999999999999999", &DataType::Decimal { precision: 38, scale: 0 }),
            SqlValue::Decimal(Decimal::from_str("9999999999999999999").unwrap())
        );
        assert_eq!(convert("1.5", &DataType::Double), SqlValue::Float(1.5));
    }

    #[test]
    fn test_convert_wide_number_keeps_every_digit() {
        let wide = "12345678901234567890123456789012345678";
        assert_eq!(
            convert(wide, &DataType::Numeric { precision: 38, scale: 0 }),
            SqlValue::BigDecimal(BigDecimal::from_str(wide).unwrap())
        );
        assert!(convert(wide, &DataType::Numeric { precision: 38, scale: 0 }).is_numeric());
    }

    #[test]
    fn test_convert_temporal_types() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 20).unwrap();
        assert_eq!(convert("2020-01-20", &DataType::Date), SqlValue::Date(date));
        assert_eq!(
            convert("2020-01-20 12:30:00.000", &DataType::Timestamp { precision: 3 }),
            SqlValue::DateTime(date.and_hms_opt(12, 30, 0).unwrap())
        );
    }

    #[test]
    fn test_convert_falls_back_to_text() {
        assert_eq!(convert("abc", &DataType::Integer), SqlValue::Text("abc".into()));
        assert_eq!(convert("HR", &DataType::Unknown), SqlValue::Text("HR".into()));
    }
}
