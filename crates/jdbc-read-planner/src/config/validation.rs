//! Configuration validation.

use super::Config;
use crate::error::{PlannerError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.engine.is_empty() {
        return Err(PlannerError::Config("source.engine is required".into()));
    }
    if config.source.connection_string.trim().is_empty() {
        return Err(PlannerError::Config(
            "source.connection_string is required".into(),
        ));
    }
    if let Some(schema) = &config.source.schema {
        if schema.trim().is_empty() {
            return Err(PlannerError::Config(
                "source.schema must not be blank when set".into(),
            ));
        }
    }
    if let Some(tables) = &config.source.tables {
        if tables.iter().any(|t| t.trim().is_empty()) {
            return Err(PlannerError::Config(
                "source.tables entries must not be empty".into(),
            ));
        }
    }

    // Planner validation
    if config.planner.workers == 0 {
        return Err(PlannerError::Config(
            "planner.workers must be at least 1".into(),
        ));
    }
    for (table, column) in &config.planner.partition_columns {
        if table.trim().is_empty() || column.trim().is_empty() {
            return Err(PlannerError::Config(format!(
                "planner.partition_columns has an empty entry: '{}' -> '{}'",
                table, column
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlannerConfig, SourceConfig};

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                engine: "oracle".to_string(),
                connection_string: "Driver={Oracle};DBQ=db:1521/XE;UID=hr;PWD=secret".to_string(),
                schema: Some("HR".to_string()),
                tables: None,
            },
            planner: PlannerConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_engine() {
        let mut config = valid_config();
        config.source.engine = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_connection_string() {
        let mut config = valid_config();
        config.source.connection_string = "  ".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("connection_string"));
    }

    #[test]
    fn test_blank_schema() {
        let mut config = valid_config();
        config.source.schema = Some(" ".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_table_filter_entry() {
        let mut config = valid_config();
        config.source.tables = Some(vec!["JOBS".to_string(), "".to_string()]);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_workers() {
        let mut config = valid_config();
        config.planner.workers = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_partition_column() {
        let mut config = valid_config();
        config
            .planner
            .partition_columns
            .insert("JOBS".to_string(), "".to_string());
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_source_config_debug_redacts_password() {
        let config = valid_config();
        let debug_output = format!("{:?}", config.source);
        assert!(
            debug_output.contains("PWD=[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("secret"),
            "Debug output should not contain actual password value"
        );
    }
}
