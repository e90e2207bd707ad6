//! Error types for the read partitioning planner.

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for engine or schema resolution errors.
pub const EXIT_DISCOVERY_ERROR: u8 = 2;
/// Exit code for failed catalog or data queries.
pub const EXIT_QUERY_ERROR: u8 = 3;
/// Exit code for partitioning requests outside the supported domain.
pub const EXIT_PARTITIONING_ERROR: u8 = 4;
/// Exit code for planning tasks that panicked or were cancelled.
pub const EXIT_TASK_ERROR: u8 = 5;
/// Exit code for IO errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for planning operations.
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The engine factory received a tag it does not recognise.
    #[error("Unsupported SQL engine type: {0}")]
    UnsupportedEngine(String),

    /// An explicit schema filter matched no schema known to the database.
    #[error("Schema filter does not match any schemas: {0}")]
    SchemaNotFound(String),

    /// Partition arithmetic was requested over a non-numeric domain.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// Partition bounds or stride cannot produce a partition count.
    #[error("Invalid partition range: lower={lower}, upper={upper}, stride={stride}")]
    InvalidRange {
        lower: String,
        upper: String,
        stride: String,
    },

    /// A schema, table or column name cannot be placed in generated SQL.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A statement issued through a query executor failed.
    #[error("Query failed: {message}\n  SQL: {sql}")]
    Query { sql: String, message: String },

    /// A concurrent planning task panicked or was cancelled.
    #[error("Planning task failed: {0}")]
    Task(String),

    /// ODBC driver manager or driver error.
    #[cfg(feature = "odbc")]
    #[error("ODBC error: {0}")]
    Odbc(#[from] odbc_api::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PlannerError {
    /// Create a Query error for a failed statement.
    pub fn query(sql: impl Into<String>, message: impl Into<String>) -> Self {
        PlannerError::Query {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Create an InvalidRange error from displayable operands.
    pub fn invalid_range(
        lower: impl ToString,
        upper: impl ToString,
        stride: impl ToString,
    ) -> Self {
        PlannerError::InvalidRange {
            lower: lower.to_string(),
            upper: upper.to_string(),
            stride: stride.to_string(),
        }
    }

    /// Process exit code for this error family.
    pub fn exit_code(&self) -> u8 {
        match self {
            PlannerError::Config(_) | PlannerError::Yaml(_) | PlannerError::Json(_) => {
                EXIT_CONFIG_ERROR
            }
            PlannerError::UnsupportedEngine(_)
            | PlannerError::SchemaNotFound(_)
            | PlannerError::InvalidIdentifier(_) => EXIT_DISCOVERY_ERROR,
            PlannerError::Query { .. } => EXIT_QUERY_ERROR,
            #[cfg(feature = "odbc")]
            PlannerError::Odbc(_) => EXIT_QUERY_ERROR,
            PlannerError::NotSupported(_) | PlannerError::InvalidRange { .. } => {
                EXIT_PARTITIONING_ERROR
            }
            PlannerError::Task(_) => EXIT_TASK_ERROR,
            PlannerError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for planning operations.
pub type Result<T> = std::result::Result<T, PlannerError>;
