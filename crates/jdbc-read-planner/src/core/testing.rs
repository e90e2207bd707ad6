//! Scripted in-memory executor for unit tests.

use std::cell::{Cell, RefCell};

use crate::error::{PlannerError, Result};

use super::bind::BindParam;
use super::traits::{QueryExecutor, QuerySession, Row};
use super::value::SqlValue;

struct Rule {
    fragment: String,
    binds: Vec<(String, SqlValue)>,
    outcome: std::result::Result<Vec<Row>, String>,
}

impl Rule {
    fn matches(&self, sql: &str, params: &[BindParam<'_>]) -> bool {
        sql.contains(&self.fragment)
            && self.binds.iter().all(|(name, value)| {
                params
                    .iter()
                    .any(|p| p.name.eq_ignore_ascii_case(name) && &p.value == value)
            })
    }
}

/// A statement recorded by [`ScriptedExecutor`].
#[derive(Debug, Clone)]
pub struct Issued {
    pub sql: String,
    pub binds: Vec<(String, SqlValue)>,
}

/// Answers queries from canned rows matched by SQL fragment.
///
/// Rules are tried in the order they were added; unmatched statements
/// return no rows.
#[derive(Default)]
pub struct ScriptedExecutor {
    rules: Vec<Rule>,
    issued: RefCell<Vec<Issued>>,
    open_sessions: Cell<usize>,
    sessions_opened: Cell<usize>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `fragment` with `rows`.
    pub fn on(self, fragment: &str, rows: Vec<Row>) -> Self {
        self.on_with(fragment, &[], rows)
    }

    /// Answer statements containing `fragment` whose binds include `binds`.
    pub fn on_with(mut self, fragment: &str, binds: &[(&str, &str)], rows: Vec<Row>) -> Self {
        self.rules.push(Rule {
            fragment: fragment.to_string(),
            binds: binds
                .iter()
                .map(|(n, v)| (n.to_string(), SqlValue::from(*v)))
                .collect(),
            outcome: Ok(rows),
        });
        self
    }

    /// Fail statements containing `fragment`.
    pub fn fail_on(mut self, fragment: &str, message: &str) -> Self {
        self.rules.push(Rule {
            fragment: fragment.to_string(),
            binds: Vec::new(),
            outcome: Err(message.to_string()),
        });
        self
    }

    pub fn issued(&self) -> Vec<Issued> {
        self.issued.borrow().clone()
    }

    /// Statements issued so far containing `fragment`.
    pub fn count_issued(&self, fragment: &str) -> usize {
        self.issued
            .borrow()
            .iter()
            .filter(|i| i.sql.contains(fragment))
            .count()
    }

    pub fn open_sessions(&self) -> usize {
        self.open_sessions.get()
    }

    pub fn sessions_opened(&self) -> usize {
        self.sessions_opened.get()
    }
}

impl QueryExecutor for ScriptedExecutor {
    fn session(&self) -> Result<Box<dyn QuerySession + '_>> {
        self.open_sessions.set(self.open_sessions.get() + 1);
        self.sessions_opened.set(self.sessions_opened.get() + 1);
        Ok(Box::new(ScriptedSession { exec: self }))
    }
}

struct ScriptedSession<'a> {
    exec: &'a ScriptedExecutor,
}

impl QuerySession for ScriptedSession<'_> {
    fn query(&mut self, sql: &str, params: &[BindParam<'_>]) -> Result<Vec<Row>> {
        self.exec.issued.borrow_mut().push(Issued {
            sql: sql.to_string(),
            binds: params
                .iter()
                .map(|p| (p.name.to_string(), p.value.clone()))
                .collect(),
        });
        match self.exec.rules.iter().find(|r| r.matches(sql, params)) {
            Some(rule) => rule
                .outcome
                .clone()
                .map_err(|message| PlannerError::query(sql, message)),
            None => Ok(Vec::new()),
        }
    }
}

impl Drop for ScriptedSession<'_> {
    fn drop(&mut self) {
        self.exec
            .open_sessions
            .set(self.exec.open_sessions.get().saturating_sub(1));
    }
}

/// A single-column row.
pub fn row(value: impl Into<SqlValue>) -> Row {
    vec![value.into()]
}

/// Rows of one text column each.
pub fn text_rows(values: &[&str]) -> Vec<Row> {
    values.iter().map(|v| row(*v)).collect()
}
