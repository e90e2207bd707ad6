//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Serialize back to YAML. The connection string is omitted.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlannerError;
    use std::io::Write;

    const FULL_YAML: &str = r#"
source:
  engine: oracle
  connection_string: "Driver={Oracle};DBQ=db:1521/XE;UID=hr;PWD=tiger"
  schema: hr
  tables: [EMPLOYEES, JOBS]
planner:
  row_count_threshold: 500000
  use_table_stats: true
  workers: 8
  partition_columns:
    EMPLOYEES: EMPLOYEE_ID
"#;

    #[test]
    fn test_from_yaml_full() {
        let config = Config::from_yaml(FULL_YAML).unwrap();
        assert_eq!(config.source.engine, "oracle");
        assert_eq!(config.source.schema.as_deref(), Some("hr"));
        assert_eq!(
            config.source.tables,
            Some(vec!["EMPLOYEES".to_string(), "JOBS".to_string()])
        );
        assert_eq!(config.planner.row_count_threshold, 500_000);
        assert!(config.planner.use_table_stats);
        assert!(config.planner.manager_options().use_table_stats);
        assert_eq!(config.planner.workers, 8);
        assert_eq!(
            config.planner.partition_columns.get("EMPLOYEES").map(String::as_str),
            Some("EMPLOYEE_ID")
        );
        assert!(!config.planner.partition_columns.contains_key("JOBS"));
    }

    #[test]
    fn test_from_yaml_defaults() {
        let config = Config::from_yaml(
            "source:\n  engine: oracle\n  connection_string: \"DSN=xe\"\n",
        )
        .unwrap();
        assert_eq!(config.planner.row_count_threshold, DEFAULT_ROW_COUNT_THRESHOLD);
        assert!(!config.planner.use_table_stats);
        assert_eq!(config.planner.workers, 4);
        assert!(config.source.schema.is_none());
        assert!(config.source.tables.is_none());
    }

    #[test]
    fn test_from_yaml_invalid() {
        let err = Config::from_yaml("source: [").unwrap_err();
        assert!(matches!(err, PlannerError::Yaml(_)));

        let err = Config::from_yaml("source:\n  engine: oracle\n").unwrap_err();
        assert!(matches!(err, PlannerError::Config(_)));
    }

    #[test]
    fn test_to_yaml_omits_connection_string() {
        let config = Config::from_yaml(FULL_YAML).unwrap();
        let yaml = config.to_yaml().unwrap();
        assert!(!yaml.contains("tiger"));
        assert!(!yaml.contains("connection_string"));
        assert!(yaml.contains("engine: oracle"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL_YAML.as_bytes()).unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.planner.workers, 8);

        let err = Config::load("/nonexistent/planner.yaml").unwrap_err();
        assert!(matches!(err, PlannerError::Io(_)));
    }
}
