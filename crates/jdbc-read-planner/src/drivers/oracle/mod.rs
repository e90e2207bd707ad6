//! Oracle Database engine.
//!
//! - [`OracleInputManager`]: discovery and planning against the `ALL_*` views
//! - [`normalise_data_type`]: timestamp and interval precision removal
//!
//! Identifiers are enclosed in double quotes and only `NUMBER` columns are
//! range partitioned.

mod manager;
mod types;

pub use manager::OracleInputManager;
pub use types::normalise_data_type;

/// Factory tag for this engine.
pub const ENGINE: &str = "oracle";
