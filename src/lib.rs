//! pgdbsync - keep slave PostgreSQL schemas structurally in line with a master.
//!
//! The master's schema is read into a [`model::Snapshot`], compared against a
//! snapshot of each slave, and the differences are rendered as DDL. The DDL
//! can be printed, summarized, or applied statement by statement.
//!
//! # Quick Start
//!
//! ```no_run
//! use pgdbsync::prelude::*;
//!
//! let text = diff_blocking(SyncOptions::new(
//!     "postgres://sync@master/app",
//!     vec!["postgres://sync@replica-1/app".into()],
//!     "public",
//! ))
//! .unwrap();
//! print!("{text}");
//! ```
//!
//! # Modules
//!
//! - [`api`] - High-level API mirroring CLI commands
//! - [`snapshot`] - Building snapshots from catalog rows
//! - [`diff`] - Snapshot comparison
//! - [`apply`] - Per-slave diffing and statement execution
//! - [`report`] - Text reports

pub mod api;
pub mod apply;
pub mod catalog;
pub mod config;
pub mod diff;
pub mod model;
pub mod pg;
pub mod prelude;
pub mod report;
pub mod snapshot;
pub mod util;
