//! jdbc-read-planner CLI - plan partitioned parallel JDBC reads.

use clap::{Parser, Subcommand};
use jdbc_read_planner::drivers::oracle;
use jdbc_read_planner::{num_partitions, Config, PlannerError, SqlValue};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Parser)]
#[command(name = "jdbc-read-planner")]
#[command(about = "Plan partitioned parallel JDBC reads from database metadata")]
#[command(version)]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tables that would be planned
    Tables {
        /// Override source schema
        #[arg(long)]
        schema: Option<String>,

        /// Restrict to these tables (repeatable)
        #[arg(long = "table")]
        tables: Vec<String>,
    },

    /// Show the row count of every table
    Counts {
        /// Override source schema
        #[arg(long)]
        schema: Option<String>,

        /// Restrict to these tables (repeatable)
        #[arg(long = "table")]
        tables: Vec<String>,
    },

    /// Decide the read partitioning of every table
    Plan {
        /// Override source schema
        #[arg(long)]
        schema: Option<String>,

        /// Restrict to these tables (repeatable)
        #[arg(long = "table")]
        tables: Vec<String>,

        /// Override row count threshold
        #[arg(long)]
        threshold: Option<u64>,

        /// Override number of workers
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Test the database connection and resolve the schema
    HealthCheck,

    /// Compute a partition count from bounds and a stride
    Partitions {
        /// Smallest partition column value
        #[arg(long, allow_hyphen_values = true)]
        lower: String,

        /// Largest partition column value
        #[arg(long, allow_hyphen_values = true)]
        upper: String,

        /// Rows per partition
        #[arg(long, allow_hyphen_values = true)]
        stride: String,
    },

    /// Normalise a catalog data type name
    NormaliseType {
        /// Engine whose type names are normalised
        #[arg(long, default_value = oracle::ENGINE)]
        engine: String,

        /// Data type as reported by the catalog
        data_type: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<(), PlannerError> {
    let cli = Cli::parse();

    // Offline commands need neither a config file nor logging
    match &cli.command {
        Commands::Partitions {
            lower,
            upper,
            stride,
        } => {
            let count = num_partitions(&parse_value(lower), &parse_value(upper), &parse_value(stride))?;
            if cli.output_json {
                println!("{{\"num_partitions\":{}}}", count);
            } else {
                println!("{}", count);
            }
            return Ok(());
        }
        Commands::NormaliseType { engine, data_type } => {
            println!("{}", normalise_type(engine, data_type)?);
            return Ok(());
        }
        _ => {}
    }

    setup_logging(&cli.verbosity, &cli.log_format).map_err(PlannerError::Config)?;

    let mut config = Config::load(&cli.config)?;
    info!("Loaded configuration from {:?}", cli.config);

    match &cli.command {
        Commands::Tables { schema, tables }
        | Commands::Counts { schema, tables }
        | Commands::Plan { schema, tables, .. } => {
            if let Some(schema) = schema {
                config.source.schema = Some(schema.clone());
            }
            if !tables.is_empty() {
                config.source.tables = Some(tables.clone());
            }
        }
        _ => {}
    }
    if let Commands::Plan {
        threshold, workers, ..
    } = &cli.command
    {
        if let Some(t) = threshold {
            config.planner.row_count_threshold = *t;
        }
        if let Some(w) = workers {
            config.planner.workers = *w;
        }
    }
    config.validate()?;

    database::run(cli.command, config, cli.output_json).await
}

/// Parse a bound as an exact decimal; anything else stays text.
fn parse_value(raw: &str) -> SqlValue {
    SqlValue::parse_decimal(raw).unwrap_or_else(|| SqlValue::Text(raw.to_string()))
}

fn normalise_type(engine: &str, data_type: &str) -> Result<String, PlannerError> {
    match engine {
        oracle::ENGINE => Ok(oracle::normalise_data_type(data_type)),
        #[cfg(feature = "mysql")]
        jdbc_read_planner::drivers::mysql::ENGINE => {
            Ok(jdbc_read_planner::drivers::mysql::normalise_data_type(data_type))
        }
        other => Err(PlannerError::UnsupportedEngine(other.to_string())),
    }
}

#[cfg(feature = "odbc")]
mod database {
    use super::Commands;
    use jdbc_read_planner::drivers::odbc::OdbcConnector;
    use jdbc_read_planner::{Config, Orchestrator, PlannerError};

    pub async fn run(command: Commands, config: Config, output_json: bool) -> Result<(), PlannerError> {
        let connector = OdbcConnector::new(config.source.connection_string.clone());
        let orchestrator = Orchestrator::new(config, connector);

        match command {
            Commands::HealthCheck => {
                let schema = orchestrator.health_check().await?;
                if output_json {
                    println!("{}", serde_json::json!({ "healthy": true, "schema": schema }));
                } else {
                    println!("Connection OK");
                    println!("  Schema: {}", schema);
                }
            }

            Commands::Tables { .. } => {
                let (schema, tables) = orchestrator.discover().await?;
                if output_json {
                    println!("{}", serde_json::json!({ "schema": schema, "tables": tables }));
                } else {
                    println!("Schema: {}", schema);
                    for table in &tables {
                        println!("  {}", table);
                    }
                    println!("{} tables", tables.len());
                }
            }

            Commands::Counts { .. } => {
                let (schema, counts) = orchestrator.table_counts().await?;
                if output_json {
                    let counts: serde_json::Map<String, serde_json::Value> = counts
                        .into_iter()
                        .map(|(t, c)| (t, serde_json::Value::from(c)))
                        .collect();
                    println!("{}", serde_json::json!({ "schema": schema, "counts": counts }));
                } else {
                    println!("Schema: {}", schema);
                    let width = counts.iter().map(|(t, _)| t.len()).max().unwrap_or(0);
                    for (table, count) in &counts {
                        println!("  {:<width$}  {}", table, count, width = width);
                    }
                }
            }

            Commands::Plan { .. } => {
                let result = orchestrator.run().await?;
                if output_json {
                    println!("{}", result.to_json()?);
                } else {
                    println!("{}", result.report());
                    println!("\nPlanning completed!");
                    println!("  Run ID: {}", result.run_id);
                    println!("  Duration: {:.2}s", result.duration_seconds);
                    println!(
                        "  Partitioned: {}/{}",
                        result.tables_partitioned, result.tables_total
                    );
                    if result.tables_failed > 0 {
                        println!("  Failed tables: {:?}", result.failed_tables());
                    }
                }
            }

            Commands::Partitions { .. } | Commands::NormaliseType { .. } => {}
        }

        Ok(())
    }
}

#[cfg(not(feature = "odbc"))]
mod database {
    use super::Commands;
    use jdbc_read_planner::{Config, PlannerError};

    pub async fn run(_command: Commands, _config: Config, _output_json: bool) -> Result<(), PlannerError> {
        Err(PlannerError::Config(
            "database commands require a build with the `odbc` feature".to_string(),
        ))
    }
}

fn setup_logging(verbosity: &str, format: &str) -> Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Reports go to stdout, so logs stay on stderr
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format: {}", other)),
    }

    Ok(())
}
