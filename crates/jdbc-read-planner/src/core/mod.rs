//! Core abstractions shared by every engine.
//!
//! - [`identifier`]: identifier enclosure and qualified names
//! - [`value`]: scalar values returned by queries
//! - [`bind`]: named bind parameters
//! - [`schema`]: table identity, primary keys and partitioning plans
//! - [`traits`]: the query executor boundary and the input manager capability set
//!
//! # Architecture
//!
//! Engine modules under `drivers/` implement [`traits::InputManager`] by
//! supplying catalog queries and type rules. Discovery, metadata collection
//! and planning are provided methods on the trait, so a new engine adds a
//! variant, not new call sites.

pub mod bind;
pub mod identifier;
pub mod schema;
pub mod traits;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use bind::BindParam;
pub use schema::{PartitionDecision, PartitioningPlan, PrimaryKeyMap, TableIdentifier};
pub use traits::{InputManager, ManagerOptions, ManagerState, QueryExecutor, QuerySession, Row};
pub use value::SqlValue;
