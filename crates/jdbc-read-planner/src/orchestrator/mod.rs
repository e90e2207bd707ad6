//! Planning orchestrator - concurrent per-table planning.
//!
//! Managers are synchronous and own no connection, so every planning unit
//! runs on the blocking pool with its own executor from a [`Connector`].
//! A semaphore bounds how many units (and connections) are live at once.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::core::schema::{PartitionDecision, SERIAL_READ_COMMENT};
use crate::core::traits::{InputManager, ManagerOptions, QueryExecutor};
use crate::drivers::{self, InputManagerImpl};
use crate::error::{PlannerError, Result};
use crate::partition::{PartitionReport, ReportRow};

/// Opens a fresh executor for one planning unit.
///
/// Executors are created and dropped on the same blocking thread, so they
/// need not be `Send`.
pub trait Connector: Send + Sync + 'static {
    type Executor: QueryExecutor;

    fn connect(&self) -> Result<Self::Executor>;
}

/// Inputs for [`plan_tables`].
#[derive(Debug, Clone)]
pub struct PlanRequest {
    /// Engine tag passed to the manager factory.
    pub engine: String,
    /// Schema owning every table in `tables`.
    pub schema: String,
    /// Tables to plan, in report order.
    pub tables: Vec<String>,
    pub row_count_threshold: u64,
    /// Maximum concurrent planning units.
    pub workers: usize,
    pub options: ManagerOptions,
    /// User-provided partition columns, matched case-insensitively.
    pub partition_columns: HashMap<String, String>,
}

impl PlanRequest {
    /// Build a request for `tables` in `schema` from the planner settings.
    pub fn from_config(config: &Config, schema: String, tables: Vec<String>) -> Self {
        Self {
            engine: config.source.engine.clone(),
            schema,
            tables,
            row_count_threshold: config.planner.row_count_threshold,
            workers: config.planner.workers,
            options: config.planner.manager_options(),
            partition_columns: config.planner.partition_columns.clone(),
        }
    }

    fn partition_column_for(&self, table: &str) -> Option<&str> {
        self.partition_columns
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(table))
            .map(|(_, c)| c.as_str())
    }
}

/// Planning outcome for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableOutcome {
    pub table: String,

    /// The decision, absent when planning failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<PartitionDecision>,

    /// Why planning failed for this table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub duration_ms: u64,
}

/// Result of a planning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningResult {
    /// Unique run identifier.
    pub run_id: String,

    pub engine: String,

    pub schema: String,

    pub row_count_threshold: u64,

    /// When planning started.
    pub started_at: DateTime<Utc>,

    /// When planning completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    pub tables_total: usize,

    /// Tables that will be read in parallel.
    pub tables_partitioned: usize,

    /// Tables whose planning failed.
    pub tables_failed: usize,

    /// Per-table outcomes in request order.
    pub outcomes: Vec<TableOutcome>,
}

impl PlanningResult {
    /// Names of tables whose planning failed.
    pub fn failed_tables(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.error.is_some())
            .map(|o| o.table.as_str())
            .collect()
    }

    /// Tabular report of every outcome.
    pub fn report(&self) -> PartitionReport {
        PartitionReport {
            rows: self
                .outcomes
                .iter()
                .map(|o| match (&o.decision, &o.error) {
                    (Some(decision), _) => ReportRow::from_decision(&o.table, decision),
                    (None, error) => ReportRow::serial(
                        &o.table,
                        format!(
                            "{}, planning failed: {}",
                            SERIAL_READ_COMMENT,
                            error.as_deref().unwrap_or("unknown error")
                        ),
                    ),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Plan every table in `request` concurrently.
///
/// Each table gets its own connection and manager. `NotSupported` and
/// `InvalidRange` failures are recorded on the table's outcome; any other
/// error aborts the run. Once a unit fails that way no further units are
/// started, units still waiting skip their connection, and the first such
/// error in table order is returned after every started unit has finished.
pub async fn plan_tables<C: Connector>(
    connector: Arc<C>,
    request: PlanRequest,
) -> Result<PlanningResult> {
    let started_at = Utc::now();
    let run_id = uuid::Uuid::new_v4().to_string();
    let workers = request.workers.max(1);
    let request = Arc::new(request);

    info!(
        "Planning run {}: {} tables in {} with {} workers",
        run_id,
        request.tables.len(),
        request.schema,
        workers
    );

    let semaphore = Arc::new(Semaphore::new(workers));
    let aborted = Arc::new(AtomicBool::new(false));
    let mut handles = Vec::with_capacity(request.tables.len());

    for table in request.tables.iter().cloned() {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| PlannerError::Task(e.to_string()))?;
        if aborted.load(Ordering::SeqCst) {
            debug!("Planning run {} aborted, not starting {}", run_id, table);
            break;
        }

        let connector = connector.clone();
        let request = request.clone();
        let aborted = aborted.clone();
        let name = table.clone();

        let handle = tokio::task::spawn_blocking(move || {
            if aborted.load(Ordering::SeqCst) {
                return None;
            }
            let start = Instant::now();
            let result = plan_one(connector.as_ref(), &request, &table);
            if matches!(&result, Err(e) if !is_recorded_failure(e)) {
                aborted.store(true, Ordering::SeqCst);
            }
            drop(permit);
            Some((result, start.elapsed().as_millis() as u64))
        });
        handles.push((name, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    let mut fatal = None;
    for (table, handle) in handles {
        let joined = handle.await.map_err(|e| {
            error!("{}: task panicked - {}", table, e);
            PlannerError::Task(format!("{}: {}", table, e))
        });
        let (result, duration_ms) = match joined {
            Ok(Some(done)) => done,
            Ok(None) => continue,
            Err(e) => {
                fatal.get_or_insert(e);
                continue;
            }
        };

        match result {
            Ok(decision) => {
                debug!("{}: {:?}", table, decision);
                outcomes.push(TableOutcome {
                    table,
                    decision: Some(decision),
                    error: None,
                    duration_ms,
                });
            }
            Err(e) if is_recorded_failure(&e) => {
                warn!("{}: skipped - {}", table, e);
                outcomes.push(TableOutcome {
                    table,
                    decision: None,
                    error: Some(e.to_string()),
                    duration_ms,
                });
            }
            Err(e) => {
                error!("{}: failed - {}", table, e);
                fatal.get_or_insert(e);
            }
        }
    }
    if let Some(e) = fatal {
        return Err(e);
    }

    let completed_at = Utc::now();
    let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
    let tables_partitioned = outcomes
        .iter()
        .filter(|o| o.decision.as_ref().is_some_and(|d| d.is_partitioned()))
        .count();
    let tables_failed = outcomes.iter().filter(|o| o.error.is_some()).count();

    info!(
        "Planning run {} complete: {} partitioned, {} serial, {} failed in {:.2}s",
        run_id,
        tables_partitioned,
        outcomes.len() - tables_partitioned - tables_failed,
        tables_failed,
        duration_seconds
    );

    Ok(PlanningResult {
        run_id,
        engine: request.engine.clone(),
        schema: request.schema.clone(),
        row_count_threshold: request.row_count_threshold,
        started_at,
        completed_at,
        duration_seconds,
        tables_total: outcomes.len(),
        tables_partitioned,
        tables_failed,
        outcomes,
    })
}

/// Failures that leave the table to a serial read instead of aborting the run.
fn is_recorded_failure(e: &PlannerError) -> bool {
    matches!(e, PlannerError::NotSupported(_) | PlannerError::InvalidRange { .. })
}

/// Plan one table on its own connection.
fn plan_one<C: Connector>(
    connector: &C,
    request: &PlanRequest,
    table: &str,
) -> Result<PartitionDecision> {
    let executor = connector.connect()?;
    let mut manager = drivers::create_with_options(&request.engine, &executor, request.options)?;
    manager.normalise_schema(Some(&request.schema))?;
    manager.set_table_list(vec![table.to_string()]);
    manager.define_read_partitioning_with_column(
        table,
        request.row_count_threshold,
        request.partition_column_for(table),
    )
}

/// Runs discovery and planning for one configuration.
pub struct Orchestrator<C: Connector> {
    config: Config,
    connector: Arc<C>,
}

impl<C: Connector> Orchestrator<C> {
    pub fn new(config: Config, connector: C) -> Self {
        Self {
            config,
            connector: Arc::new(connector),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `f` with a fresh manager on the blocking pool.
    async fn with_manager<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut InputManagerImpl<'_>) -> Result<T> + Send + 'static,
    {
        let connector = self.connector.clone();
        let engine = self.config.source.engine.clone();
        let options = self.config.planner.manager_options();
        tokio::task::spawn_blocking(move || {
            let executor = connector.connect()?;
            let mut manager = drivers::create_with_options(&engine, &executor, options)?;
            f(&mut manager)
        })
        .await
        .map_err(|e| PlannerError::Task(e.to_string()))?
    }

    /// Connect and resolve the working schema.
    pub async fn health_check(&self) -> Result<String> {
        let schema = self.config.source.schema.clone();
        let resolved = self
            .with_manager(move |m| m.normalise_schema(schema.as_deref()))
            .await?;
        info!("Health check passed: schema {}", resolved);
        Ok(resolved)
    }

    /// Resolve the schema and list the configured tables.
    pub async fn discover(&self) -> Result<(String, Vec<String>)> {
        let schema = self.config.source.schema.clone();
        let tables = self.config.source.tables.clone();
        self.with_manager(move |m| m.build_table_list(schema.as_deref(), tables.as_deref()))
            .await
    }

    /// Row counts for every discovered table, in discovery order.
    pub async fn table_counts(&self) -> Result<(String, Vec<(String, u64)>)> {
        let schema = self.config.source.schema.clone();
        let tables = self.config.source.tables.clone();
        self.with_manager(move |m| {
            let (schema, tables) = m.build_table_list(schema.as_deref(), tables.as_deref())?;
            let counts = m.get_table_list_with_counts()?;
            Ok((schema, tables.into_iter().zip(counts).collect()))
        })
        .await
    }

    /// Discover tables and plan them concurrently.
    pub async fn run(&self) -> Result<PlanningResult> {
        let (schema, tables) = self.discover().await?;
        if tables.is_empty() {
            warn!("No tables found in schema {}", schema);
        }
        let request = PlanRequest::from_config(&self.config, schema, tables);
        plan_tables(self.connector.clone(), request).await
    }
}
