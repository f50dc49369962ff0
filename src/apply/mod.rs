//! Diffing every slave against the master and applying the result.
//!
//! Slaves are handled strictly one after another, in the order given. The
//! master snapshot is read once and shared by every comparison.

use crate::catalog::CatalogSource;
use crate::diff::{compute_diff_with_options, DiffOptions, DiffResult};
use crate::model::Snapshot;
use crate::snapshot::build_snapshot;
use crate::util::{ExecutionError, Result};
use serde::Serialize;
use tracing::{info, warn};

/// A slave database that can be inspected and altered.
#[allow(async_fn_in_trait)]
pub trait SyncTarget: CatalogSource {
    fn host(&self) -> &str;

    fn database_name(&self) -> &str;

    /// Runs one statement outside of any transaction.
    async fn execute(&self, statement: &str) -> std::result::Result<(), ExecutionError>;

    fn label(&self) -> String {
        format!("{} :: {}", self.host(), self.database_name())
    }
}

/// The diff computed for one slave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetDiff {
    pub host: String,
    pub database: String,
    pub master_fingerprint: String,
    pub slave_fingerprint: String,
    #[serde(flatten)]
    pub diff: DiffResult,
}

impl TargetDiff {
    pub fn label(&self) -> String {
        format!("{} :: {}", self.host, self.database)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementFailure {
    pub statement: String,
    pub message: String,
}

/// Outcome of applying the diff to one slave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlaveRun {
    pub label: String,
    /// Empty when every statement applied.
    pub failures: Vec<StatementFailure>,
}

/// One entry per slave, in the order the slaves were given. Labels may repeat.
pub type RunReport = Vec<SlaveRun>;

pub async fn diff_targets<M, S>(
    master: &M,
    slaves: &[S],
    schema: &str,
    options: &DiffOptions,
) -> Result<Vec<TargetDiff>>
where
    M: CatalogSource,
    S: SyncTarget,
{
    let master_snapshot = build_snapshot(master, schema).await?;

    let mut diffs = Vec::with_capacity(slaves.len());
    for slave in slaves {
        diffs.push(diff_target(&master_snapshot, slave, schema, options).await?);
    }

    Ok(diffs)
}

async fn diff_target<S: SyncTarget>(
    master: &Snapshot,
    slave: &S,
    schema: &str,
    options: &DiffOptions,
) -> Result<TargetDiff> {
    let slave_snapshot = build_snapshot(slave, schema).await?;
    let diff = compute_diff_with_options(master, &slave_snapshot, schema, options);
    if diff.is_empty() {
        info!(slave = %slave.label(), schema, "already in sync");
    }

    Ok(TargetDiff {
        host: slave.host().to_string(),
        database: slave.database_name().to_string(),
        master_fingerprint: master.fingerprint(),
        slave_fingerprint: slave_snapshot.fingerprint(),
        diff,
    })
}

/// Executes each statement in order, recording failures and carrying on.
pub async fn apply_statements<S: SyncTarget>(
    slave: &S,
    statements: &[String],
) -> Vec<StatementFailure> {
    let mut failures = Vec::new();
    for (index, statement) in statements.iter().enumerate() {
        if let Err(err) = slave.execute(statement).await {
            warn!(
                slave = %slave.label(),
                statement_index = index,
                error = %err,
                "statement failed"
            );
            failures.push(StatementFailure {
                statement: statement.clone(),
                message: err.message,
            });
        }
    }
    failures
}

pub async fn run_targets<M, S>(
    master: &M,
    slaves: &[S],
    schema: &str,
    options: &DiffOptions,
) -> Result<RunReport>
where
    M: CatalogSource,
    S: SyncTarget,
{
    let master_snapshot = build_snapshot(master, schema).await?;

    let mut report = RunReport::with_capacity(slaves.len());
    for slave in slaves {
        let target = diff_target(&master_snapshot, slave, schema, options).await?;
        let failures = apply_statements(slave, &target.diff.statements).await;
        info!(
            slave = %slave.label(),
            statements = target.diff.statements.len(),
            failed = failures.len(),
            "applied"
        );
        report.push(SlaveRun {
            label: slave.label(),
            failures,
        });
    }

    Ok(report)
}
