//! MySQL input manager.

use crate::core::bind::BindParam;
use crate::core::traits::{InputManager, ManagerOptions, ManagerState, QueryExecutor, QuerySession};
use crate::drivers::{scalar_text, text_column};
use crate::error::{PlannerError, Result};

const CURRENT_DATABASE_SQL: &str = "SELECT DATABASE()";

// CAST to CHAR to handle collations where information_schema returns VARBINARY
const TABLES_SQL: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_SCHEMA = :own AND TABLE_TYPE = 'BASE TABLE'
"#;

const PRIMARY_KEY_SQL: &str = r#"
    SELECT CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME
    FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
    WHERE TABLE_SCHEMA = :own AND TABLE_NAME = :tab AND CONSTRAINT_NAME = 'PRIMARY'
    ORDER BY ORDINAL_POSITION
"#;

const COLUMN_TYPE_SQL: &str = r#"
    SELECT CAST(DATA_TYPE AS CHAR(64))
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = :own AND TABLE_NAME = :tab AND COLUMN_NAME = :col
"#;

const COLUMN_NAME_SQL: &str = r#"
    SELECT CAST(COLUMN_NAME AS CHAR(255))
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = :own AND TABLE_NAME = :tab AND UPPER(COLUMN_NAME) = UPPER(:col)
"#;

const TABLE_STATS_SQL: &str = r#"
    SELECT TABLE_ROWS
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_SCHEMA = :own AND TABLE_NAME = :tab
"#;

const PARTITIONABLE_TYPES: &[&str] = &["int", "bigint", "mediumint"];

/// Lowercase a MySQL type name and drop any display width (`INT(11)`).
pub fn normalise_data_type(data_type: &str) -> String {
    let lower = data_type.trim().to_lowercase();
    match lower.find('(') {
        Some(idx) => {
            let close = lower[idx..].find(')').map(|c| idx + c + 1).unwrap_or(lower.len());
            format!("{}{}", lower[..idx].trim_end(), &lower[close..])
        }
        None => lower,
    }
}

/// Input manager for MySQL and MariaDB.
pub struct MysqlInputManager<'c> {
    executor: &'c dyn QueryExecutor,
    state: ManagerState,
}

impl<'c> MysqlInputManager<'c> {
    pub fn new(executor: &'c dyn QueryExecutor) -> Self {
        Self::with_options(executor, ManagerOptions::default())
    }

    pub fn with_options(executor: &'c dyn QueryExecutor, options: ManagerOptions) -> Self {
        Self {
            executor,
            state: ManagerState::new(options),
        }
    }
}

impl std::fmt::Debug for MysqlInputManager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MysqlInputManager")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl InputManager for MysqlInputManager<'_> {
    fn engine(&self) -> &str {
        super::ENGINE
    }

    fn default_quote(&self) -> char {
        '`'
    }

    fn normalise_data_type(&self, raw_type: &str) -> String {
        normalise_data_type(raw_type)
    }

    fn partitionable_types(&self) -> &[&'static str] {
        PARTITIONABLE_TYPES
    }

    fn executor(&self) -> &dyn QueryExecutor {
        self.executor
    }

    fn state(&self) -> &ManagerState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut ManagerState {
        &mut self.state
    }

    fn normalise_schema_filter(
        &self,
        session: &mut dyn QuerySession,
        schema_filter: Option<&str>,
    ) -> Result<String> {
        let current = scalar_text(session.query_scalar(CURRENT_DATABASE_SQL, &[])?);
        match (current, schema_filter) {
            (Some(db), Some(filter)) if !db.eq_ignore_ascii_case(filter) => {
                Err(PlannerError::SchemaNotFound(format!(
                    "{} (connected database is {})",
                    filter, db
                )))
            }
            (Some(db), _) => Ok(db),
            (None, Some(filter)) => Err(PlannerError::SchemaNotFound(filter.to_string())),
            (None, None) => Err(PlannerError::query(
                CURRENT_DATABASE_SQL,
                "no database selected on the connection",
            )),
        }
    }

    fn list_tables(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        _explicit: bool,
    ) -> Result<Vec<String>> {
        let rows = session.query(TABLES_SQL, &[BindParam::new("own", schema)])?;
        text_column(rows, TABLES_SQL)
    }

    fn primary_key_columns(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
    ) -> Result<Vec<String>> {
        let rows = session.query(
            PRIMARY_KEY_SQL,
            &[BindParam::new("own", schema), BindParam::new("tab", table)],
        )?;
        text_column(rows, PRIMARY_KEY_SQL)
    }

    fn raw_column_data_type(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>> {
        let value = session.query_scalar(
            COLUMN_TYPE_SQL,
            &[
                BindParam::new("own", schema),
                BindParam::new("tab", table),
                BindParam::new("col", column),
            ],
        )?;
        Ok(scalar_text(value))
    }

    fn table_count_from_stats(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
    ) -> Result<Option<u64>> {
        let value = session.query_scalar(
            TABLE_STATS_SQL,
            &[BindParam::new("own", schema), BindParam::new("tab", table)],
        )?;
        Ok(value.and_then(|v| v.as_count()))
    }

    fn find_column_name(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>> {
        let value = session.query_scalar(
            COLUMN_NAME_SQL,
            &[
                BindParam::new("own", schema),
                BindParam::new("tab", table),
                BindParam::new("col", column),
            ],
        )?;
        Ok(scalar_text(value))
    }
}
