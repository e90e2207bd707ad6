//! # jdbc-read-planner
//!
//! Plans partitioned parallel reads of relational tables.
//!
//! Given a connection to a source database, the planner discovers the
//! tables in a schema and decides for each one whether a distributed JDBC
//! reader should split it into range-bounded chunks:
//!
//! - **Metadata discovery** of schemas, tables, primary keys and column types
//! - **Row counting** via `COUNT(*)` or optimizer statistics
//! - **Partition planning** with exact decimal arithmetic on key bounds
//! - **Concurrent planning** with one connection per worker
//!
//! Engine-specific behaviour lives behind the [`InputManager`] trait; the
//! [`create`] factory picks an implementation from an engine tag.
//!
//! ## Example
//!
//! ```rust,no_run
//! use jdbc_read_planner::{create, InputManager, QueryExecutor};
//!
//! fn plan(executor: &dyn QueryExecutor) -> jdbc_read_planner::Result<()> {
//!     let mut manager = create("oracle", executor)?;
//!     manager.build_table_list(Some("HR"), None)?;
//!     for (table, decision) in manager.define_read_partitioning_all(1_000_000, &Default::default())? {
//!         println!("{}: {}", table, decision.comment());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod partition;

// Re-exports for convenient access
pub use crate::core::{
    InputManager, ManagerOptions, PartitionDecision, PartitioningPlan, QueryExecutor,
    QuerySession, SqlValue, TableIdentifier,
};
pub use config::{Config, PlannerConfig, SourceConfig};
pub use drivers::{create, create_with_options, supported_engines, InputManagerImpl};
pub use error::{PlannerError, Result};
pub use orchestrator::{plan_tables, Connector, Orchestrator, PlanRequest, PlanningResult};
pub use partition::{num_partitions, PartitionReport};
