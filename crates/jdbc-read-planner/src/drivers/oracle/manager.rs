//! Oracle input manager.
//!
//! Catalog lookups go through the `ALL_*` dictionary views so that schemas
//! other than the connected user's can be planned, given SELECT grants.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::core::bind::BindParam;
use crate::core::identifier::DEFAULT_QUOTE;
use crate::core::traits::{InputManager, ManagerOptions, ManagerState, QueryExecutor, QuerySession};
use crate::drivers::{scalar_text, text_column};
use crate::error::{PlannerError, Result};

use super::types::{normalise_data_type, NUMBER};

/// Oracle Text creates `DR$SUP_TEXT_IDX...` support tables for each text index.
const TEXT_INDEX_EXCLUSION: &str = "table_name NOT LIKE 'DR$SUP_TEXT_IDX%'";

/// Same rule as [`TEXT_INDEX_EXCLUSION`], with LIKE's `_` matching any character.
static TEXT_INDEX_TABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^DR\$SUP.TEXT.IDX").expect("text index pattern is valid"));

const SCHEMA_LOOKUP_SQL: &str =
    "SELECT username FROM all_users WHERE UPPER(username) = UPPER(:b1) ORDER BY username";

const CURRENT_USER_SQL: &str = "SELECT USER FROM dual";

const PRIMARY_KEY_SQL: &str = r#"
    SELECT cols.column_name
    FROM   all_constraints cons
    ,      all_cons_columns cols
    WHERE  cons.owner = :own
    AND    cons.table_name = :tab
    AND    cons.constraint_type = 'P'
    AND    cons.status = 'ENABLED'
    AND    cols.constraint_name = cons.constraint_name
    AND    cols.owner = cons.owner
    AND    cols.table_name = cons.table_name
    ORDER BY cols.position
"#;

const COLUMN_TYPE_SQL: &str = r#"
    SELECT data_type
    FROM   all_tab_columns
    WHERE  owner = :own
    AND    table_name = :tab
    AND    column_name = :col
"#;

const COLUMN_NAME_SQL: &str = r#"
    SELECT column_name
    FROM   all_tab_columns
    WHERE  owner = :own
    AND    table_name = :tab
    AND    UPPER(column_name) = UPPER(:col)
"#;

const TABLE_STATS_SQL: &str = r#"
    SELECT num_rows
    FROM   all_tables
    WHERE  owner = :own
    AND    table_name = :tab
"#;

const PARTITIONABLE_TYPES: &[&str] = &[NUMBER];

/// Input manager for Oracle Database.
pub struct OracleInputManager<'c> {
    executor: &'c dyn QueryExecutor,
    state: ManagerState,
}

impl<'c> OracleInputManager<'c> {
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

impl std::fmt::Debug for OracleInputManager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleInputManager")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl InputManager for OracleInputManager<'_> {
    fn engine(&self) -> &str {
        super::ENGINE
    }

    fn default_quote(&self) -> char {
        DEFAULT_QUOTE
    }

    fn normalise_data_type(&self, raw_type: &str) -> String {
        normalise_data_type(raw_type)
    }

    fn partitionable_types(&self) -> &[&'static str] {
        PARTITIONABLE_TYPES
    }

    fn is_excluded_table(&self, table: &str) -> bool {
        TEXT_INDEX_TABLE.is_match(table)
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
        match schema_filter {
            Some(filter) => {
                // Assumes no two schemas differ only by case.
                let found = session.query_scalar(SCHEMA_LOOKUP_SQL, &[BindParam::new("b1", filter)])?;
                scalar_text(found).ok_or_else(|| PlannerError::SchemaNotFound(filter.to_string()))
            }
            None => {
                let user = session.query_scalar(CURRENT_USER_SQL, &[])?;
                scalar_text(user).ok_or_else(|| {
                    PlannerError::query(CURRENT_USER_SQL, "connected user could not be resolved")
                })
            }
        }
    }

    fn list_tables(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        explicit: bool,
    ) -> Result<Vec<String>> {
        let (sql, rows) = if explicit {
            let sql = format!(
                "SELECT table_name FROM all_tables WHERE owner = :own AND {}",
                TEXT_INDEX_EXCLUSION
            );
            let rows = session.query(&sql, &[BindParam::new("own", schema)])?;
            (sql, rows)
        } else {
            let sql = format!(
                "SELECT table_name FROM user_tables WHERE {}",
                TEXT_INDEX_EXCLUSION
            );
            let rows = session.query(&sql, &[])?;
            (sql, rows)
        };
        debug!("oracle: {} tables listed for {}", rows.len(), schema);
        text_column(rows, &sql)
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
