//! Configuration type definitions.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::traits::ManagerOptions;

/// Default row-count threshold above which a table is partitioned.
pub const DEFAULT_ROW_COUNT_THRESHOLD: u64 = 1_000_000;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration.
    pub source: SourceConfig,

    /// Planner behavior configuration.
    #[serde(default)]
    pub planner: PlannerConfig,
}

/// Source database configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Engine tag passed to the manager factory (e.g. "oracle").
    pub engine: String,

    /// ODBC connection string. Carries credentials, so it is never
    /// serialized back out.
    #[serde(skip_serializing, default)]
    pub connection_string: String,

    /// Schema filter; the connected user's schema when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Table filter; every discovered table when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<String>>,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("engine", &self.engine)
            .field("connection_string", &redact_connection_string(&self.connection_string))
            .field("schema", &self.schema)
            .field("tables", &self.tables)
            .finish()
    }
}

/// Replace the value of any `PWD`/`Password` attribute with `[REDACTED]`.
pub fn redact_connection_string(connection_string: &str) -> String {
    connection_string
        .split(';')
        .map(|attr| match attr.split_once('=') {
            Some((key, _))
                if key.trim().eq_ignore_ascii_case("pwd")
                    || key.trim().eq_ignore_ascii_case("password") =>
            {
                format!("{}=[REDACTED]", key)
            }
            _ => attr.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Planner behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Tables with more rows than this are partitioned (default: 1,000,000).
    #[serde(default = "default_row_count_threshold")]
    pub row_count_threshold: u64,

    /// Consult optimizer statistics before running `COUNT(*)` (default: false).
    #[serde(default)]
    pub use_table_stats: bool,

    /// Concurrent planning units, each with its own connection (default: 4).
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// User-provided partition columns by table name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub partition_columns: HashMap<String, String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            row_count_threshold: default_row_count_threshold(),
            use_table_stats: false,
            workers: default_workers(),
            partition_columns: HashMap::new(),
        }
    }
}

impl PlannerConfig {
    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            use_table_stats: self.use_table_stats,
        }
    }
}

fn default_row_count_threshold() -> u64 {
    DEFAULT_ROW_COUNT_THRESHOLD
}

fn default_workers() -> usize {
    4
}
