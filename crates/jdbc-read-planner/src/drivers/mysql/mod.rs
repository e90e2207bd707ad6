//! MySQL/MariaDB engine.
//!
//! The schema is always the connected database; a schema filter is only
//! checked against it.
//!
//! # Feature Flag
//!
//! This module is only available when the `mysql` feature is enabled:
//!
//! ```toml
//! [dependencies]
//! jdbc-read-planner = { version = "0.1", features = ["mysql"] }
//! ```

mod manager;

pub use manager::{normalise_data_type, MysqlInputManager};

/// Factory tag for this engine.
pub const ENGINE: &str = "mysql";
