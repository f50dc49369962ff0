//! High-level API mirroring the CLI commands.
//!
//! Each function connects to the master and every slave, reads the target
//! schema from each and compares slave by slave, in the order given.
//!
//! # Example
//!
//! ```no_run
//! use pgdbsync::api::{summary_blocking, SyncOptions};
//!
//! let text = summary_blocking(SyncOptions::new(
//!     "postgres://sync@master/app",
//!     vec!["postgres://sync@replica-1/app".into()],
//!     "public",
//! ))
//! .unwrap();
//! print!("{text}");
//! ```
//!
//! Blocking variants create a new tokio runtime per call.

mod error;
mod options;

pub use error::Error;
pub use options::{Endpoint, SyncOptions};

use crate::apply::{diff_targets, run_targets, RunReport, TargetDiff};
use crate::pg::connection::PgConnection;
use crate::report::{render_diff, render_summary};
use crate::util::sanitize_url;

async fn connect(endpoint: &Endpoint) -> Result<PgConnection, Error> {
    let connection = match endpoint {
        Endpoint::Url(url) => PgConnection::new(url).await,
        Endpoint::Config(config) => PgConnection::connect_with(config.connect_options()).await,
    };
    connection.map_err(|e| Error::connection(e.to_string()))
}

fn describe(endpoint: &Endpoint) -> String {
    match endpoint {
        Endpoint::Url(url) => sanitize_url(url),
        Endpoint::Config(config) => config.label(),
    }
}

async fn connect_all(options: &SyncOptions) -> Result<(PgConnection, Vec<PgConnection>), Error> {
    if options.schema.trim().is_empty() {
        return Err(Error::configuration("no schema name supplied"));
    }
    if options.slaves.is_empty() {
        return Err(Error::configuration("at least one slave is required"));
    }

    tracing::debug!(master = %describe(&options.master), "connecting");
    let master = connect(&options.master).await?;

    let mut slaves = Vec::with_capacity(options.slaves.len());
    for endpoint in &options.slaves {
        tracing::debug!(slave = %describe(endpoint), "connecting");
        slaves.push(connect(endpoint).await?);
    }

    Ok((master, slaves))
}

/// Per-slave statements and summaries, for programmatic consumers.
pub async fn raw(options: SyncOptions) -> Result<Vec<TargetDiff>, Error> {
    let (master, slaves) = connect_all(&options).await?;
    let diffs = diff_targets(&master, &slaves, &options.schema, &options.diff_options()).await?;
    Ok(diffs)
}

/// The DDL each slave needs, as report text.
pub async fn diff(options: SyncOptions) -> Result<String, Error> {
    Ok(render_diff(&raw(options).await?))
}

/// The objects each slave would have changed, as report text.
pub async fn summary(options: SyncOptions) -> Result<String, Error> {
    Ok(render_summary(&raw(options).await?))
}

/// Apply the DDL to every slave, collecting failed statements per slave.
pub async fn run(options: SyncOptions) -> Result<RunReport, Error> {
    let (master, slaves) = connect_all(&options).await?;
    let report = run_targets(&master, &slaves, &options.schema, &options.diff_options()).await?;
    Ok(report)
}

fn create_runtime() -> Result<tokio::runtime::Runtime, Error> {
    tokio::runtime::Runtime::new().map_err(|e| Error::runtime(e.to_string()))
}

/// Blocking variant of [`raw`].
pub fn raw_blocking(options: SyncOptions) -> Result<Vec<TargetDiff>, Error> {
    create_runtime()?.block_on(raw(options))
}

/// Blocking variant of [`diff`].
pub fn diff_blocking(options: SyncOptions) -> Result<String, Error> {
    create_runtime()?.block_on(diff(options))
}

/// Blocking variant of [`summary`].
pub fn summary_blocking(options: SyncOptions) -> Result<String, Error> {
    create_runtime()?.block_on(summary(options))
}

/// Blocking variant of [`run`].
pub fn run_blocking(options: SyncOptions) -> Result<RunReport, Error> {
    create_runtime()?.block_on(run(options))
}
