//! Tabular summary of partitioning decisions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::schema::PartitionDecision;

/// One table's line in a [`PartitionReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub table: String,
    pub partition_column: Option<String>,
    pub num_partitions: Option<u64>,
    pub lower_bound: Option<String>,
    pub upper_bound: Option<String>,
    pub comment: String,
}

impl ReportRow {
    pub fn from_decision(table: &str, decision: &PartitionDecision) -> Self {
        let plan = decision.plan();
        Self {
            table: table.to_string(),
            partition_column: plan.map(|p| p.partition_column.clone()),
            num_partitions: plan.map(|p| p.num_partitions),
            lower_bound: plan.map(|p| p.lower_bound.to_string()),
            upper_bound: plan.map(|p| p.upper_bound.to_string()),
            comment: decision.comment(),
        }
    }

    /// A serial-read row with no plan columns.
    pub fn serial(table: &str, comment: impl Into<String>) -> Self {
        Self {
            table: table.to_string(),
            partition_column: None,
            num_partitions: None,
            lower_bound: None,
            upper_bound: None,
            comment: comment.into(),
        }
    }
}

/// Partitioning decisions for a set of tables, in table-list order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionReport {
    pub rows: Vec<ReportRow>,
}

impl PartitionReport {
    pub fn from_decisions<'a, I>(decisions: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a PartitionDecision)>,
    {
        Self {
            rows: decisions
                .into_iter()
                .map(|(table, decision)| ReportRow::from_decision(table, decision))
                .collect(),
        }
    }

    /// Number of tables that will be read in parallel.
    pub fn partitioned_count(&self) -> usize {
        self.rows.iter().filter(|r| r.num_partitions.is_some()).count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

const HEADERS: [&str; 6] = [
    "table",
    "partition_column",
    "num_partitions",
    "lower_bound",
    "upper_bound",
    "comment",
];

impl fmt::Display for PartitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 6]> = self
            .rows
            .iter()
            .map(|r| {
                [
                    r.table.clone(),
                    r.partition_column.clone().unwrap_or_default(),
                    r.num_partitions.map(|n| n.to_string()).unwrap_or_default(),
                    r.lower_bound.clone().unwrap_or_default(),
                    r.upper_bound.clone().unwrap_or_default(),
                    r.comment.clone(),
                ]
            })
            .collect();

        let mut widths = HEADERS.map(str::len);
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }

        write_line(f, &HEADERS.map(String::from), &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join("  "))?;
        for row in &cells {
            write_line(f, row, &widths)?;
        }
        Ok(())
    }
}

fn write_line(f: &mut fmt::Formatter<'_>, cells: &[String; 6], widths: &[usize; 6]) -> fmt::Result {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
        .collect();
    writeln!(f, "{}", padded.join("  ").trim_end())
}
