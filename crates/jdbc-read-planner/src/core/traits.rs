//! Core traits for catalog discovery and read partitioning.
//!
//! - [`QueryExecutor`]: borrowed handle that hands out scoped query sessions
//! - [`QuerySession`]: executes one statement at a time and returns rows
//! - [`InputManager`]: discovery, metadata and planning capabilities of one engine
//!
//! # Design Patterns
//!
//! - **Template Method**: `InputManager` provides the shared planning
//!   algorithm; engines supply only catalog queries and type rules.
//! - **Abstract Factory**: [`crate::drivers::create`] selects the engine variant.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{PlannerError, Result};
use crate::partition::num_partitions;

use super::bind::BindParam;
use super::identifier::{enclose_identifier, validate_identifier};
use super::schema::{PartitionDecision, PartitioningPlan, PrimaryKeyMap};
use super::value::SqlValue;

/// One result row.
pub type Row = Vec<SqlValue>;

/// Executes SQL statements on an open connection.
///
/// A session lives for the duration of a single manager call and is
/// released when dropped.
pub trait QuerySession {
    /// Execute `sql` with named binds and return every row.
    fn query(&mut self, sql: &str, params: &[BindParam<'_>]) -> Result<Vec<Row>>;

    /// Execute `sql` and return the first row, if any.
    fn query_one(&mut self, sql: &str, params: &[BindParam<'_>]) -> Result<Option<Row>> {
        Ok(self.query(sql, params)?.into_iter().next())
    }

    /// Execute `sql` and return the first column of the first row.
    ///
    /// NULL is reported as `None`.
    fn query_scalar(&mut self, sql: &str, params: &[BindParam<'_>]) -> Result<Option<SqlValue>> {
        Ok(self
            .query_one(sql, params)?
            .and_then(|row| row.into_iter().next())
            .and_then(SqlValue::non_null))
    }
}

/// Caller-owned database handle.
///
/// Managers borrow an executor for their whole lifetime but only hold a
/// session while a single call runs.
pub trait QueryExecutor {
    /// Acquire a scoped session.
    fn session(&self) -> Result<Box<dyn QuerySession + '_>>;
}

/// Options that change how a manager resolves row counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManagerOptions {
    /// Consult optimizer statistics before running `COUNT(*)`.
    pub use_table_stats: bool,
}

/// Working state owned by one manager instance.
#[derive(Debug, Clone, Default)]
pub struct ManagerState {
    /// Resolved schema, set by discovery or schema normalisation.
    pub schema: Option<String>,
    /// Working table list in caller order.
    pub table_list: Vec<String>,
    /// Primary keys for the working table list, built on first use.
    pub primary_keys: Option<PrimaryKeyMap>,
    pub options: ManagerOptions,
}

impl ManagerState {
    pub fn new(options: ManagerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

/// Discovery, metadata and planning capabilities of one SQL engine family.
///
/// Engines implement the required catalog primitives; everything else is a
/// provided method shared by all engines.
pub trait InputManager {
    // ===== Engine identity and rules =====

    /// Engine tag (e.g. "oracle").
    fn engine(&self) -> &str;

    /// Character used to enclose identifiers in this dialect.
    fn default_quote(&self) -> char;

    /// Canonicalise a catalog type string so type classes compare equal.
    fn normalise_data_type(&self, raw_type: &str) -> String;

    /// Normalised data types accepted as partition columns.
    fn partitionable_types(&self) -> &[&'static str];

    /// Whether a discovered table is a system-generated auxiliary object.
    fn is_excluded_table(&self, _table: &str) -> bool {
        false
    }

    // ===== Owned resources =====

    /// The borrowed executor.
    fn executor(&self) -> &dyn QueryExecutor;

    fn state(&self) -> &ManagerState;

    fn state_mut(&mut self) -> &mut ManagerState;

    // ===== Engine catalog primitives =====

    /// Resolve `schema_filter` to its real case, or the connected user's
    /// schema when no filter is given.
    fn normalise_schema_filter(
        &self,
        session: &mut dyn QuerySession,
        schema_filter: Option<&str>,
    ) -> Result<String>;

    /// List tables in `schema`. `explicit` is true when the caller named
    /// the schema rather than defaulting to the connected user.
    fn list_tables(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        explicit: bool,
    ) -> Result<Vec<String>>;

    /// Enabled primary key columns of a table, ordered by key position.
    fn primary_key_columns(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
    ) -> Result<Vec<String>>;

    /// Declared type of a column exactly as the catalog reports it.
    fn raw_column_data_type(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>>;

    /// Row count recorded by the optimizer's statistics.
    fn table_count_from_stats(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
    ) -> Result<Option<u64>>;

    /// Real name of a column matched case-insensitively.
    fn find_column_name(
        &self,
        session: &mut dyn QuerySession,
        schema: &str,
        table: &str,
        column: &str,
    ) -> Result<Option<String>>;

    // ===== Naming =====

    /// Enclose an identifier in `quote`, or the dialect's default.
    fn enclose_identifier(&self, name: &str, quote: Option<char>) -> String {
        enclose_identifier(name, Some(quote.unwrap_or_else(|| self.default_quote())))
    }

    /// Render `schema.table`, enclosing both parts when `enclosed` is set.
    fn qualified_name(&self, schema: &str, table: &str, enclosed: bool) -> String {
        if enclosed {
            format!(
                "{}.{}",
                self.enclose_identifier(schema, None),
                self.enclose_identifier(table, None)
            )
        } else {
            format!("{}.{}", schema, table)
        }
    }

    // ===== SQL builders =====

    /// `SELECT COUNT(*)` for a table in `schema`.
    fn count_sql(&self, schema: &str, table: &str) -> Result<String> {
        validate_identifier(schema)?;
        validate_identifier(table)?;
        Ok(format!(
            "SELECT COUNT(*) FROM {}",
            self.qualified_name(schema, table, true)
        ))
    }

    /// `SELECT MIN(column)` over non-null values.
    fn min_sql(&self, schema: &str, table: &str, column: &str) -> Result<String> {
        self.aggregate_sql("MIN", schema, table, column)
    }

    /// `SELECT MAX(column)` over non-null values.
    fn max_sql(&self, schema: &str, table: &str, column: &str) -> Result<String> {
        self.aggregate_sql("MAX", schema, table, column)
    }

    #[doc(hidden)]
    fn aggregate_sql(&self, func: &str, schema: &str, table: &str, column: &str) -> Result<String> {
        validate_identifier(schema)?;
        validate_identifier(table)?;
        validate_identifier(column)?;
        let col = self.enclose_identifier(column, None);
        Ok(format!(
            "SELECT {func}({col}) FROM {} WHERE {col} IS NOT NULL",
            self.qualified_name(schema, table, true)
        ))
    }

    // ===== Session helpers =====

    /// Run `f` inside a freshly acquired session.
    fn with_session<T, F>(&self, f: F) -> Result<T>
    where
        Self: Sized,
        F: FnOnce(&mut dyn QuerySession) -> Result<T>,
    {
        let mut session = self.executor().session()?;
        f(session.as_mut())
    }

    /// The working schema, falling back to the connected user's schema.
    fn current_schema(&self) -> Result<String>
    where
        Self: Sized,
    {
        match &self.state().schema {
            Some(schema) => Ok(schema.clone()),
            None => self.with_session(|s| self.normalise_schema_filter(s, None)),
        }
    }

    // ===== Discovery =====

    /// Resolve the schema and list its tables, filtered by `table_filter`.
    ///
    /// Sets the manager's schema and working table list.
    fn build_table_list(
        &mut self,
        schema_filter: Option<&str>,
        table_filter: Option<&[String]>,
    ) -> Result<(String, Vec<String>)>
    where
        Self: Sized,
    {
        let schema_filter = schema_filter.filter(|s| !s.is_empty());
        let (schema, discovered) = self.with_session(|s| {
            let schema = self.normalise_schema_filter(s, schema_filter)?;
            let tables = self.list_tables(s, &schema, schema_filter.is_some())?;
            Ok((schema, tables))
        })?;

        let discovered: Vec<String> = discovered
            .into_iter()
            .filter(|t| !self.is_excluded_table(t))
            .collect();
        let tables = filter_table_list(discovered, table_filter);

        info!(
            "{}: discovered {} tables in schema {}",
            self.engine(),
            tables.len(),
            schema
        );

        let state = self.state_mut();
        state.schema = Some(schema.clone());
        state.table_list = tables.clone();
        state.primary_keys = None;
        Ok((schema, tables))
    }

    /// Resolve and store the working schema.
    fn normalise_schema(&mut self, schema_filter: Option<&str>) -> Result<String>
    where
        Self: Sized,
    {
        let filter = schema_filter.filter(|s| !s.is_empty());
        let schema = self.with_session(|s| self.normalise_schema_filter(s, filter))?;
        self.state_mut().schema = Some(schema.clone());
        Ok(schema)
    }

    fn get_schema(&self) -> Option<&str> {
        self.state().schema.as_deref()
    }

    /// Replace the working table list.
    fn set_table_list(&mut self, table_list: Vec<String>) {
        let state = self.state_mut();
        state.table_list = table_list;
        state.primary_keys = None;
    }

    fn get_table_list(&self) -> &[String] {
        &self.state().table_list
    }

    // ===== Metadata =====

    /// Exact row count of a table.
    fn get_table_count(&self, table: &str) -> Result<u64>
    where
        Self: Sized,
    {
        let schema = self.current_schema()?;
        let sql = self.count_sql(&schema, table)?;
        debug!("{}: {}", self.engine(), sql);
        let value = self.with_session(|s| s.query_scalar(&sql, &[]))?;
        match value {
            None => Ok(0),
            Some(v) => v.as_count().ok_or_else(|| {
                PlannerError::query(&sql, format!("unexpected row count value: {}", v))
            }),
        }
    }

    /// Row count from optimizer statistics, if gathered.
    fn get_table_count_from_stats(&self, table: &str) -> Result<Option<u64>>
    where
        Self: Sized,
    {
        let schema = self.current_schema()?;
        self.with_session(|s| self.table_count_from_stats(s, &schema, table))
    }

    /// Row counts for the working table list, in table-list order.
    fn get_table_list_with_counts(&self) -> Result<Vec<u64>>
    where
        Self: Sized,
    {
        self.get_table_list()
            .iter()
            .map(|table| self.get_table_count(table))
            .collect()
    }

    /// Primary keys for every table in the working table list.
    ///
    /// Built on first use and kept until the table list changes.
    fn get_primary_keys(&mut self) -> Result<&PrimaryKeyMap>
    where
        Self: Sized,
    {
        if self.state().primary_keys.is_none() {
            let schema = self.current_schema()?;
            let map = self.with_session(|s| {
                let mut map = PrimaryKeyMap::with_capacity(self.get_table_list().len());
                for table in self.get_table_list() {
                    let cols = self.primary_key_columns(s, &schema, table)?;
                    debug!("{}: primary key for {}: {:?}", self.engine(), table, cols);
                    map.insert(table.clone(), (!cols.is_empty()).then_some(cols));
                }
                Ok(map)
            })?;
            self.state_mut().primary_keys = Some(map);
        }
        Ok(self
            .state_mut()
            .primary_keys
            .get_or_insert_with(PrimaryKeyMap::new))
    }

    /// Normalised declared type of a column, or `None` if it does not exist.
    fn get_column_data_type(&self, table: &str, column: &str) -> Result<Option<String>>
    where
        Self: Sized,
    {
        let schema = self.current_schema()?;
        let raw = self.with_session(|s| self.raw_column_data_type(s, &schema, table, column))?;
        Ok(raw.map(|t| self.normalise_data_type(&t)))
    }

    /// Real name of a column matched case-insensitively.
    fn normalise_column_name(&self, table: &str, column: &str) -> Result<Option<String>>
    where
        Self: Sized,
    {
        let schema = self.current_schema()?;
        self.with_session(|s| self.find_column_name(s, &schema, table, column))
    }

    /// Smallest non-null value of a column.
    fn get_table_min(&self, table: &str, column: &str) -> Result<Option<SqlValue>>
    where
        Self: Sized,
    {
        let schema = self.current_schema()?;
        let sql = self.min_sql(&schema, table, column)?;
        debug!("{}: {}", self.engine(), sql);
        self.with_session(|s| s.query_scalar(&sql, &[]))
    }

    /// Largest non-null value of a column.
    fn get_table_max(&self, table: &str, column: &str) -> Result<Option<SqlValue>>
    where
        Self: Sized,
    {
        let schema = self.current_schema()?;
        let sql = self.max_sql(&schema, table, column)?;
        debug!("{}: {}", self.engine(), sql);
        self.with_session(|s| s.query_scalar(&sql, &[]))
    }

    // ===== Planning =====

    /// Decide how to partition the read of `table`.
    fn define_read_partitioning(
        &mut self,
        table: &str,
        row_count_threshold: u64,
    ) -> Result<PartitionDecision>
    where
        Self: Sized,
    {
        self.define_read_partitioning_with_column(table, row_count_threshold, None)
    }

    /// Decide how to partition the read of `table`, trying a user-provided
    /// column before the primary key.
    ///
    /// Only the first primary key column is considered, even when it is
    /// not selective for a composite key.
    fn define_read_partitioning_with_column(
        &mut self,
        table: &str,
        row_count_threshold: u64,
        partition_column: Option<&str>,
    ) -> Result<PartitionDecision>
    where
        Self: Sized,
    {
        let row_count = self.resolve_row_count(table, row_count_threshold)?;
        if row_count <= row_count_threshold {
            debug!(
                "{}: {} rows does not exceed threshold {}",
                table, row_count, row_count_threshold
            );
            return Ok(PartitionDecision::BelowThreshold {
                row_count,
                threshold: row_count_threshold,
            });
        }

        if let Some(requested) = partition_column.filter(|c| !c.is_empty()) {
            let Some(column) = self.normalise_column_name(table, requested)? else {
                return Ok(PartitionDecision::ColumnNotFound {
                    column: requested.to_string(),
                });
            };
            let decision =
                self.define_column_partitioning(table, &column, "user provided column", row_count_threshold)?;
            if decision.is_partitioned() {
                return Ok(decision);
            }
            debug!(
                "{}: user provided column {} unusable ({:?}), trying primary key",
                table, column, decision
            );
        }

        let first_pk_column = self
            .get_primary_keys()?
            .get(table)
            .and_then(|cols| cols.as_ref())
            .and_then(|cols| cols.first())
            .cloned();

        match first_pk_column {
            Some(column) => {
                self.define_column_partitioning(table, &column, "primary key column", row_count_threshold)
            }
            None => {
                debug!("{}: no primary key", table);
                Ok(PartitionDecision::NoPrimaryKey)
            }
        }
    }

    /// Plan every table in the working table list.
    ///
    /// `partition_columns` maps table names (matched case-insensitively) to
    /// user-provided partition columns.
    fn define_read_partitioning_all(
        &mut self,
        row_count_threshold: u64,
        partition_columns: &HashMap<String, String>,
    ) -> Result<Vec<(String, PartitionDecision)>>
    where
        Self: Sized,
    {
        let by_upper: HashMap<String, &str> = partition_columns
            .iter()
            .map(|(t, c)| (t.to_uppercase(), c.as_str()))
            .collect();

        let tables = self.get_table_list().to_vec();
        let mut decisions = Vec::with_capacity(tables.len());
        for table in tables {
            let column = by_upper.get(&table.to_uppercase()).copied();
            let decision =
                self.define_read_partitioning_with_column(&table, row_count_threshold, column)?;
            decisions.push((table, decision));
        }
        Ok(decisions)
    }

    #[doc(hidden)]
    fn resolve_row_count(&self, table: &str, row_count_threshold: u64) -> Result<u64>
    where
        Self: Sized,
    {
        if self.state().options.use_table_stats {
            // Stale or missing statistics fall back to an exact count.
            if let Some(n) = self.get_table_count_from_stats(table)? {
                if n > row_count_threshold {
                    return Ok(n);
                }
            }
        }
        self.get_table_count(table)
    }

    #[doc(hidden)]
    fn define_column_partitioning(
        &self,
        table: &str,
        column: &str,
        description: &str,
        row_count_threshold: u64,
    ) -> Result<PartitionDecision>
    where
        Self: Sized,
    {
        let data_type = self.get_column_data_type(table, column)?;
        let data_type = match data_type {
            Some(dt) if self.partitionable_types().contains(&dt.as_str()) => dt,
            other => {
                return Ok(PartitionDecision::UnsupportedColumnType {
                    column: column.to_string(),
                    data_type: other,
                })
            }
        };

        let lower = self.get_table_min(table, column)?;
        let upper = self.get_table_max(table, column)?;
        let (Some(lower_bound), Some(upper_bound)) = (lower, upper) else {
            return Ok(PartitionDecision::NoBounds {
                column: column.to_string(),
            });
        };

        let stride = SqlValue::Decimal(Decimal::from(row_count_threshold));
        let count = num_partitions(&lower_bound, &upper_bound, &stride)?;
        let num_partitions = u64::try_from(count).map_err(|_| {
            PlannerError::invalid_range(&lower_bound, &upper_bound, row_count_threshold)
        })?;

        info!(
            "{}: {} partitions on {} [{} .. {}]",
            table, num_partitions, column, lower_bound, upper_bound
        );

        Ok(PartitionDecision::Partitioned(PartitioningPlan {
            partition_column: column.to_string(),
            num_partitions,
            lower_bound,
            upper_bound,
            comment: format!("Partitioning by {} {}", data_type, description),
        }))
    }
}

/// Keep discovered tables named in `table_filter`, preserving discovery order.
///
/// Names match exactly. An absent or empty filter keeps every table.
pub fn filter_table_list(tables: Vec<String>, table_filter: Option<&[String]>) -> Vec<String> {
    match table_filter {
        Some(filter) if !filter.is_empty() => tables
            .into_iter()
            .filter(|t| filter.iter().any(|f| f == t))
            .collect(),
        _ => tables,
    }
}
