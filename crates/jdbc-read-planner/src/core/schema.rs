//! Table identity and partitioning plan types.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::identifier::qualified_name;
use super::value::SqlValue;

/// Reader option naming the partition column.
pub const READ_OPTION_PARTITION_COLUMN: &str = "partitionColumn";
/// Reader option carrying the partition count.
pub const READ_OPTION_NUM_PARTITIONS: &str = "numPartitions";
/// Reader option carrying the lower bound.
pub const READ_OPTION_LOWER_BOUND: &str = "lowerBound";
/// Reader option carrying the upper bound.
pub const READ_OPTION_UPPER_BOUND: &str = "upperBound";

/// Comment used for tables that are read without partitioning.
pub const SERIAL_READ_COMMENT: &str = "Serial read";

/// A table name together with its owning schema.
///
/// Both parts keep the case reported by the database.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableIdentifier {
    /// Schema (owner) name.
    pub schema: String,
    /// Table name.
    pub table: String,
}

impl TableIdentifier {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Dotted `schema.table` name, optionally enclosed in double quotes.
    pub fn qualified(&self, enclosed: bool) -> String {
        qualified_name(&self.schema, &self.table, enclosed)
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Primary key columns by table name, ordered by key position.
///
/// `None` means the table has no enabled primary key.
pub type PrimaryKeyMap = HashMap<String, Option<Vec<String>>>;

/// How to split one table's bulk read into range-bounded chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitioningPlan {
    /// Column bounding each chunk.
    pub partition_column: String,
    /// Number of chunks, always at least 1.
    pub num_partitions: u64,
    /// Smallest non-null value of the partition column.
    pub lower_bound: SqlValue,
    /// Largest non-null value of the partition column.
    pub upper_bound: SqlValue,
    /// Human-readable rationale.
    pub comment: String,
}

impl PartitioningPlan {
    /// The four options consumed by the distributed reader.
    pub fn read_options(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            (READ_OPTION_PARTITION_COLUMN, self.partition_column.clone()),
            (READ_OPTION_NUM_PARTITIONS, self.num_partitions.to_string()),
            (READ_OPTION_LOWER_BOUND, self.lower_bound.to_string()),
            (READ_OPTION_UPPER_BOUND, self.upper_bound.to_string()),
        ])
    }
}

/// Outcome of planning a single table.
///
/// Everything except [`PartitionDecision::Partitioned`] means the table is
/// read serially; the variant records why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum PartitionDecision {
    /// The table should be read in parallel using this plan.
    Partitioned(PartitioningPlan),

    /// The table has too few rows to merit partitioning.
    BelowThreshold { row_count: u64, threshold: u64 },

    /// No usable partition column: the table has no enabled primary key.
    NoPrimaryKey,

    /// The candidate column's type is not partitionable.
    UnsupportedColumnType {
        column: String,
        data_type: Option<String>,
    },

    /// The candidate column has no non-null values to bound a range.
    NoBounds { column: String },

    /// A user-provided partition column does not exist on the table.
    ColumnNotFound { column: String },
}

impl PartitionDecision {
    /// The plan, if the table is to be partitioned.
    pub fn plan(&self) -> Option<&PartitioningPlan> {
        match self {
            PartitionDecision::Partitioned(plan) => Some(plan),
            _ => None,
        }
    }

    /// Consume the decision, keeping only a plan.
    pub fn into_plan(self) -> Option<PartitioningPlan> {
        match self {
            PartitionDecision::Partitioned(plan) => Some(plan),
            _ => None,
        }
    }

    pub fn is_partitioned(&self) -> bool {
        matches!(self, PartitionDecision::Partitioned(_))
    }

    /// Report comment for the decision.
    pub fn comment(&self) -> String {
        match self {
            PartitionDecision::Partitioned(plan) => plan.comment.clone(),
            PartitionDecision::ColumnNotFound { column } => {
                format!("{}, column does not exist: {}", SERIAL_READ_COMMENT, column)
            }
            _ => SERIAL_READ_COMMENT.to_string(),
        }
    }
}
