//! Convenient re-exports for common pgdbsync usage.

// Async functions
pub use crate::api::{diff, raw, run, summary};

// Blocking functions
pub use crate::api::{diff_blocking, raw_blocking, run_blocking, summary_blocking};

// Options and errors
pub use crate::api::{Endpoint, Error, SyncOptions};

// Results
pub use crate::apply::{RunReport, SlaveRun, StatementFailure, TargetDiff};
pub use crate::diff::{Action, DiffResult, ObjectKind, Summary};

// Core types
pub use crate::model::Snapshot;
