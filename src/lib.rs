//! Mail date report.
//!
//! Pulls the last few days of messages from one folder of a Microsoft 365
//! mailbox, keeps the ones matching an optional keyword, finds calendar
//! dates mentioned in their bodies and writes one CSV row per message.
//!
//! The pipeline is synchronous and single-threaded:
//! [`graph::folders`] resolves the folder path, [`graph::messages`] pages
//! through the listing, [`mail`] normalizes and filters, [`dates`] extracts,
//! and [`report`] assembles rows and writes them atomically.

pub mod auth;
pub mod config;
pub mod dates;
pub mod domain;
pub mod error;
pub mod graph;
pub mod mail;
pub mod report;

pub use auth::{StaticToken, TokenProvider};
pub use config::{AuthConfig, RunConfig};
pub use error::{Error, ErrorCategory, Result};
pub use report::{
    CsvReportWriter, LogReporter, ReportFormat, ReportRow, ReportWriter, Reporter, RunSummary,
    XlsxReportWriter, run_report,
};
