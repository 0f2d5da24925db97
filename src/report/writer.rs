use std::io::{self, Write};
use std::path::Path;

use chrono_tz::Tz;
use log::debug;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::report::ReportRow;

/// Destination for a finished report.
pub trait ReportWriter {
    /// Replace `path` with a report holding exactly `rows`, or leave it untouched.
    fn write_atomically(&self, rows: &[ReportRow], path: &Path) -> Result<()>;
}

/// Output file format, picked from the destination's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Xlsx,
    Csv,
}

impl ReportFormat {
    /// `.csv` (any case) is CSV; everything else is an Excel workbook.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ReportFormat::Csv,
            _ => ReportFormat::Xlsx,
        }
    }

    pub fn writer(self, timezone: Tz) -> Box<dyn ReportWriter> {
        match self {
            ReportFormat::Xlsx => Box::new(XlsxReportWriter::new(timezone)),
            ReportFormat::Csv => Box::new(CsvReportWriter::new(timezone)),
        }
    }
}

fn header(timezone: Tz) -> [String; 6] {
    [
        "Subject".to_string(),
        format!("Received ({})", timezone.name()),
        "Extracted Dates".to_string(),
        "Sender Name".to_string(),
        "Sender Email".to_string(),
        "Link".to_string(),
    ]
}

fn cells(row: &ReportRow) -> [String; 6] {
    [
        row.subject.clone(),
        row.received_local.clone(),
        row.dates_joined(),
        row.sender_name.clone(),
        row.sender_email.clone(),
        row.permalink.clone(),
    ]
}

/// Writes into a temp file beside `path`, then renames it over `path`.
/// On any failure the temp file is dropped, which deletes it.
fn replace_atomically<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut std::fs::File) -> io::Result<()>,
{
    let output_err = |source: io::Error| Error::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    // same directory as the destination so the final rename stays on one filesystem
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir).map_err(output_err)?;
    debug!("writing report to {}", tmp.path().display());

    fill(tmp.as_file_mut()).map_err(output_err)?;
    tmp.as_file().sync_all().map_err(output_err)?;

    tmp.persist(path).map_err(|e| output_err(e.error))?;
    Ok(())
}

/// CSV with a header row; the received column is labelled with its timezone.
#[derive(Debug, Clone, Copy)]
pub struct CsvReportWriter {
    timezone: Tz,
}

impl CsvReportWriter {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn header(&self) -> [String; 6] {
        header(self.timezone)
    }

    fn write_rows<W: Write>(&self, out: W, rows: &[ReportRow]) -> io::Result<()> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(self.header())?;
        for row in rows {
            wtr.write_record(cells(row))?;
        }
        wtr.flush()
    }
}

impl ReportWriter for CsvReportWriter {
    fn write_atomically(&self, rows: &[ReportRow], path: &Path) -> Result<()> {
        debug!("{} rows as csv", rows.len());
        replace_atomically(path, |file| self.write_rows(file, rows))
    }
}

/// Single-sheet Excel workbook with a bold header row.
#[derive(Debug, Clone, Copy)]
pub struct XlsxReportWriter {
    timezone: Tz,
}

impl XlsxReportWriter {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn workbook_bytes(&self, rows: &[ReportRow]) -> std::result::Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Report")?;

        for (col, title) in (0u16..).zip(header(self.timezone)) {
            sheet.write_string_with_format(0, col, title, &bold)?;
        }
        for (r, row) in (1u32..).zip(rows) {
            for (col, value) in (0u16..).zip(cells(row)) {
                sheet.write_string(r, col, value)?;
            }
        }
        sheet.set_freeze_panes(1, 0)?;

        workbook.save_to_buffer()
    }
}

impl ReportWriter for XlsxReportWriter {
    fn write_atomically(&self, rows: &[ReportRow], path: &Path) -> Result<()> {
        debug!("{} rows as xlsx", rows.len());
        replace_atomically(path, |file| {
            let bytes = self
                .workbook_bytes(rows)
                .map_err(|e| io::Error::other(e.to_string()))?;
            file.write_all(&bytes)
        })
    }
}
