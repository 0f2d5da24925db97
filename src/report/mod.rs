//! Turning a folder's recent messages into a report file.

pub mod assembler;
pub mod writer;

use chrono::{DateTime, Utc};
use log::info;

use crate::auth::TokenProvider;
use crate::config::RunConfig;
use crate::error::Result;
use crate::graph::http::{HttpRetryClient, Transport};
use crate::graph::retry::Sleeper;

pub use assembler::ReportAssembler;
pub use writer::{CsvReportWriter, ReportFormat, ReportWriter, XlsxReportWriter};

/// One output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub subject: String,
    pub received_local: String,
    pub extracted_dates: Vec<String>,
    pub sender_name: String,
    pub sender_email: String,
    pub permalink: String,
}

impl ReportRow {
    pub fn dates_joined(&self) -> String {
        self.extracted_dates.join(", ")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Messages retrieved from the folder.
    pub scanned: usize,
    /// Messages that passed the keyword filter and became rows.
    pub kept: usize,
    pub pages: usize,
}

/// Progress sink for a run.
pub trait Reporter {
    /// Called once per completed page.
    fn progress(&self, scanned: usize, kept: usize);
    fn finished(&self, summary: &RunSummary);
}

/// Reports through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn progress(&self, scanned: usize, kept: usize) {
        info!("scanned {scanned} messages, kept {kept}");
    }

    fn finished(&self, summary: &RunSummary) {
        info!(
            "done: {} messages over {} pages, {} kept",
            summary.scanned, summary.pages, summary.kept
        );
    }
}

/// Acquire a token, collect every row, then write the report in one go.
///
/// Nothing is written unless every page was fetched; `now` anchors both the
/// lookback window and relative dates in message text.
pub fn run_report<T: Transport, S: Sleeper>(
    config: &RunConfig,
    tokens: &dyn TokenProvider,
    http: &HttpRetryClient<T, S>,
    writer: &dyn ReportWriter,
    reporter: &dyn Reporter,
    now: DateTime<Utc>,
) -> Result<RunSummary> {
    let token = tokens.acquire(&config.scopes)?;
    let assembler = ReportAssembler::new(http, config, &token, reporter);
    let (rows, summary) = assembler.assemble(now)?;
    writer.write_atomically(&rows, &config.output_path)?;
    reporter.finished(&summary);
    Ok(summary)
}
