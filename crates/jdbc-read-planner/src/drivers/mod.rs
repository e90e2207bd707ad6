//! Engine implementations and the manager factory.
//!
//! - [`oracle`]: Oracle Database
//! - [`mysql`]: MySQL/MariaDB (feature `mysql`)
//! - [`odbc`]: ODBC-backed [`QueryExecutor`] (feature `odbc`)
//!
//! # Adding New Engines
//!
//! 1. Create a module under `drivers/` with a type implementing `InputManager`
//! 2. Add a variant to [`InputManagerImpl`] and a tag to [`create`]
//! 3. Gate the engine with a feature flag in `Cargo.toml`

#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "odbc")]
pub mod odbc;
pub mod oracle;

pub use oracle::OracleInputManager;

#[cfg(feature = "mysql")]
pub use mysql::MysqlInputManager;

use crate::core::traits::{
    InputManager, ManagerOptions, ManagerState, QueryExecutor, QuerySession, Row,
};
use crate::core::value::SqlValue;
use crate::error::{PlannerError, Result};

/// Enum-based static dispatch over the supported engines.
///
/// Only the engine primitives are forwarded; discovery and planning come
/// from the provided methods of [`InputManager`].
#[derive(Debug)]
pub enum InputManagerImpl<'c> {
    Oracle(OracleInputManager<'c>),
    #[cfg(feature = "mysql")]
    Mysql(MysqlInputManager<'c>),
}

macro_rules! dispatch {
    ($self:ident, $m:ident => $body:expr) => {
        match $self {
            InputManagerImpl::Oracle($m) => $body,
            #[cfg(feature = "mysql")]
            InputManagerImpl::Mysql($m) => $body,
        }
    };
}

impl InputManager for InputManagerImpl<'_> {
    fn engine(&self) -> &str {
        dispatch!(self, m => m.engine())
    }

    fn default_quote(&self) -> char {
        dispatch!(self, m => m.default_quote())
    }

    fn normalise_data_type(&self, raw_type: &str) -> String {
        dispatch!(self, m => m.normalise_data_type(raw_type))
    }

    fn partitionable_types(&self) -> &[&'static str] {
        dispatch!(self, m => m.partitionable_types())
    }

    fn is_excluded_table(&self, table: &str) -> bool {
        dispatch!(self, m => m.is_excluded_table(table))
    }

    fn executor(&self) -> &dyn QueryExecutor {
        dispatch!(self, m => m.executor())
    }

    fn state(&self) -> &ManagerState {
        dispatch!(self, m => m.state())
    }

    fn state_mut(&mut self) -> &mut ManagerState {
        dispatch!(self, m => m.state_mut())
    }

    fn normalise_schema_filter(
        &self,
        session: &mut dyn QuerySession,
        schema_filter: Option<&str>,
    ) -> Result<String> {
        dispatch!(self, m => m.normalise_schema_filter(session, schema_filter))
    }

    fn list_tables(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        explicit: bool,
    ) -> Result<Vec<String>> {
        dispatch!(self, m => m.list_tables(session, schema, explicit))
    }

    fn primary_key_columns(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
    ) -> Result<Vec<String>> {
        dispatch!(self, m => m.primary_key_columns(session, schema, table))
    }

    fn raw_column_data_type(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>> {
        dispatch!(self, m => m.raw_column_data_type(session, schema, table, column))
    }

    fn table_count_from_stats(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
    ) -> Result<Option<u64>> {
        dispatch!(self, m => m.table_count_from_stats(session, schema, table))
    }

    fn find_column_name(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>> {
        dispatch!(self, m => m.find_column_name(session, schema, table, column))
    }
}

/// Engine tags recognised by [`create`] in this build.
pub fn supported_engines() -> Vec<&'static str> {
    #[allow(unused_mut)]
    let mut engines = vec![oracle::ENGINE];
    #[cfg(feature = "mysql")]
    engines.push(mysql::ENGINE);
    engines
}

/// Create the input manager for `engine_kind`, bound to `executor`.
///
/// The tag is case-sensitive.
///
/// # Errors
///
/// Returns `PlannerError::UnsupportedEngine` for unrecognised tags.
pub fn create<'c>(engine_kind: &str, executor: &'c dyn QueryExecutor) -> Result<InputManagerImpl<'c>> {
    create_with_options(engine_kind, executor, ManagerOptions::default())
}

/// [`create`] with explicit manager options.
pub fn create_with_options<'c>(
    engine_kind: &str,
    executor: &'c dyn QueryExecutor,
    options: ManagerOptions,
) -> Result<InputManagerImpl<'c>> {
    match engine_kind {
        oracle::ENGINE => Ok(InputManagerImpl::Oracle(OracleInputManager::with_options(
            executor, options,
        ))),
        #[cfg(feature = "mysql")]
        mysql::ENGINE => Ok(InputManagerImpl::Mysql(MysqlInputManager::with_options(
            executor, options,
        ))),
        other => Err(PlannerError::UnsupportedEngine(other.to_string())),
    }
}

/// First column of every row as text.
pub(crate) fn text_column(rows: Vec<Row>, sql: &str) -> Result<Vec<String>> {
    rows.into_iter()
        .filter_map(|row| row.into_iter().next())
        .map(|value| match value {
            SqlValue::Text(s) => Ok(s),
            other => Err(PlannerError::query(
                sql,
                format!("expected a name, got {} value", other.kind()),
            )),
        })
        .collect()
}

/// A scalar rendered as text, for catalog columns some drivers report as numbers.
pub(crate) fn scalar_text(value: Option<SqlValue>) -> Option<String> {
    match value {
        Some(SqlValue::Text(s)) => Some(s),
        Some(other) => Some(other.to_string()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{row, ScriptedExecutor};

    #[test]
    fn test_create_oracle() {
        let exec = ScriptedExecutor::new();
        let mgr = create("oracle", &exec).unwrap();
        assert_eq!(mgr.engine(), "oracle");
        assert_eq!(mgr.default_quote(), '"');
        assert!(mgr.get_table_list().is_empty());
    }

    #[test]
    fn test_create_is_case_sensitive() {
        let exec = ScriptedExecutor::new();
        let err = create("Oracle", &exec).unwrap_err();
        assert!(matches!(err, PlannerError::UnsupportedEngine(ref e) if e == "Oracle"));
        assert_eq!(err.to_string(), "Unsupported SQL engine type: Oracle");
    }

    #[test]
    fn test_create_unknown_engine() {
        let exec = ScriptedExecutor::new();
        assert!(matches!(
            create("sqlserver", &exec),
            Err(PlannerError::UnsupportedEngine(_))
        ));
    }

    #[cfg(not(feature = "mysql"))]
    #[test]
    fn test_mysql_requires_feature() {
        let exec = ScriptedExecutor::new();
        assert!(create("mysql", &exec).is_err());
        assert_eq!(supported_engines(), vec!["oracle"]);
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn test_create_mysql() {
        let exec = ScriptedExecutor::new();
        let mgr = create("mysql", &exec).unwrap();
        assert_eq!(mgr.engine(), "mysql");
        assert_eq!(mgr.enclose_identifier("t", None), "`t`");
        assert_eq!(supported_engines(), vec!["oracle", "mysql"]);
    }

    #[test]
    fn test_dispatch_reaches_engine_and_planner() {
        let exec = ScriptedExecutor::new()
            .on("SELECT USER FROM dual", vec![row("HR")])
            .on("COUNT(*)", vec![row(3)]);
        let mut mgr = create_with_options(
            "oracle",
            &exec,
            ManagerOptions {
                use_table_stats: false,
            },
        )
        .unwrap();
        mgr.set_table_list(vec!["T".into()]);
        assert_eq!(mgr.get_table_list_with_counts().unwrap(), vec![3]);
        assert!(mgr.define_read_partitioning("T", 10).unwrap().plan().is_none());
    }

    #[test]
    fn test_text_column_rejects_non_text() {
        let err = text_column(vec![vec![SqlValue::Int(1)]], "SELECT 1").unwrap_err();
        assert!(matches!(err, PlannerError::Query { .. }));
        assert_eq!(scalar_text(Some(SqlValue::Int(7))).as_deref(), Some("7"));
        assert_eq!(scalar_text(None), None);
    }
}
