use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use mail_date_report::graph::http::{HttpRetryClient, RawResponse, Transport};
use mail_date_report::graph::retry::Sleeper;
use mail_date_report::{
    CsvReportWriter, Error, Reporter, Result, RunConfig, RunSummary, StaticToken, TokenProvider,
    run_report,
};

const BASE: &str = "https://graph.test/v1.0";
const TOP: &str = "https://graph.test/v1.0/me/mailFolders";
const INBOX_CHILDREN: &str = "https://graph.test/v1.0/me/mailFolders('inbox-id')/childFolders";
const MESSAGES: &str = "https://graph.test/v1.0/me/mailFolders('invoices-id')/messages";

#[derive(Default)]
struct StubGraph {
    routes: HashMap<String, RawResponse>,
    calls: RefCell<Vec<String>>,
}

impl StubGraph {
    fn mailbox(messages_page: serde_json::Value) -> Self {
        let mut routes = HashMap::new();
        routes.insert(
            TOP.to_string(),
            RawResponse::new(200, json!({"value": [{"id": "inbox-id", "displayName": "Inbox"}]}).to_string()),
        );
        routes.insert(
            INBOX_CHILDREN.to_string(),
            RawResponse::new(
                200,
                json!({"value": [{"id": "invoices-id", "displayName": "Invoices", "parentFolderId": "inbox-id"}]})
                    .to_string(),
            ),
        );
        routes.insert(MESSAGES.to_string(), RawResponse::new(200, messages_page.to_string()));
        Self {
            routes,
            calls: RefCell::default(),
        }
    }

    fn calls_to(&self, url: &str) -> usize {
        self.calls.borrow().iter().filter(|u| *u == url).count()
    }
}

impl Transport for StubGraph {
    fn get(&self, url: &str, _token: &str, _query: &[(String, String)]) -> Result<RawResponse> {
        self.calls.borrow_mut().push(url.to_string());
        Ok(self
            .routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| RawResponse::new(404, r#"{"error":{"code":"ErrorItemNotFound"}}"#)))
    }
}

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

#[derive(Default)]
struct Recorder {
    finished: RefCell<Option<RunSummary>>,
}

impl Reporter for Recorder {
    fn progress(&self, _scanned: usize, _kept: usize) {}

    fn finished(&self, summary: &RunSummary) {
        *self.finished.borrow_mut() = Some(*summary);
    }
}

struct RejectingTokens;

impl TokenProvider for RejectingTokens {
    fn acquire(&self, _scopes: &[String]) -> Result<String> {
        Err(Error::auth("no cached credential"))
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 20, 9, 0, 0).unwrap()
}

fn invoice_page() -> serde_json::Value {
    json!({
        "value": [{
            "id": "m1",
            "subject": "Invoice 42 for January",
            "receivedDateTime": "2025-01-18T04:30:00Z",
            "from": {"emailAddress": {"name": "Acme Billing", "address": "billing@acme.test"}},
            "body": {"contentType": "html", "content": "<html><body><p>Hello,</p><p>Payment due <b>15 Jan 2025</b>.</p></body></html>"},
            "webLink": "https://outlook.test/m1"
        }]
    })
}

fn config(keyword: &str, out: &Path) -> RunConfig {
    RunConfig::builder()
        .folder_path("Inbox/Invoices")
        .keyword(Some(keyword))
        .output_path(out)
        .graph_base(BASE)
        .build()
        .unwrap()
}

fn run(config: &RunConfig, http: &HttpRetryClient<StubGraph, NoSleep>) -> Result<RunSummary> {
    let writer = CsvReportWriter::new(config.timezone);
    run_report(
        config,
        &StaticToken("token".into()),
        http,
        &writer,
        &Recorder::default(),
        now(),
    )
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn keyword_in_subject_yields_row_with_extracted_date() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.csv");
    let cfg = config("invoice", &out);
    let http = HttpRetryClient::new(StubGraph::mailbox(invoice_page()), NoSleep);

    let writer = CsvReportWriter::new(cfg.timezone);
    let recorder = Recorder::default();
    let summary = run_report(
        &cfg,
        &StaticToken("token".into()),
        &http,
        &writer,
        &recorder,
        now(),
    )
    .unwrap();

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.kept, 1);
    assert_eq!(*recorder.finished.borrow(), Some(summary));

    let mut reader = csv::Reader::from_path(&out).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["Subject", "Received (Asia/Kolkata)", "Extracted Dates", "Sender Name", "Sender Email", "Link"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].iter().collect::<Vec<_>>(),
        vec![
            "Invoice 42 for January",
            "2025-01-18 10:00",
            "2025-01-15",
            "Acme Billing",
            "billing@acme.test",
            "https://outlook.test/m1",
        ]
    );
}

#[test]
fn unmatched_keyword_writes_empty_table_over_previous_report() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.csv");
    fs::write(&out, "Subject\nstale row from an earlier run\n").unwrap();

    let cfg = config("refund", &out);
    let http = HttpRetryClient::new(StubGraph::mailbox(invoice_page()), NoSleep);
    let summary = run(&cfg, &http).unwrap();

    assert_eq!(summary.scanned, 1);
    assert_eq!(summary.kept, 0);
    let written = fs::read_to_string(&out).unwrap();
    assert!(!written.contains("stale"));
    assert_eq!(written.lines().count(), 1);
    assert_eq!(entries(dir.path()), vec!["report.csv"]);
}

#[test]
fn listing_without_continuation_link_is_fetched_once() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.csv");
    let cfg = config("invoice", &out);
    let http = HttpRetryClient::new(StubGraph::mailbox(invoice_page()), NoSleep);

    let summary = run(&cfg, &http).unwrap();

    assert_eq!(summary.pages, 1);
    assert_eq!(http.transport().calls_to(MESSAGES), 1);
    assert_eq!(http.transport().calls.borrow().len(), 3);
}

#[test]
fn unwritable_destination_is_left_untouched() {
    let dir = tempfile::tempdir().unwrap();
    // a non-empty directory at the destination stands in for a locked file
    let out = dir.path().join("report.csv");
    fs::create_dir(&out).unwrap();
    fs::write(out.join("owner.lock"), "in use").unwrap();

    let cfg = config("invoice", &out);
    let http = HttpRetryClient::new(StubGraph::mailbox(invoice_page()), NoSleep);
    let err = run(&cfg, &http).unwrap_err();

    assert!(matches!(err, Error::OutputWrite { .. }));
    assert!(err.to_string().contains("close it and re-run"));
    assert_eq!(entries(dir.path()), vec!["report.csv"]);
    assert_eq!(fs::read_to_string(out.join("owner.lock")).unwrap(), "in use");
}

#[test]
fn missing_subfolder_aborts_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.csv");
    let mut cfg = config("invoice", &out);
    cfg.folder_path = "Inbox/Receipts".to_string();
    let http = HttpRetryClient::new(StubGraph::mailbox(invoice_page()), NoSleep);

    let err = run(&cfg, &http).unwrap_err();
    match err {
        Error::FolderNotFound { segment, parent } => {
            assert_eq!(segment, "Receipts");
            assert_eq!(parent.as_deref(), Some("Inbox"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!out.exists());
    assert_eq!(http.transport().calls_to(MESSAGES), 0);
}

#[test]
fn token_failure_makes_no_requests() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.csv");
    let cfg = config("invoice", &out);
    let http = HttpRetryClient::new(StubGraph::mailbox(invoice_page()), NoSleep);
    let writer = CsvReportWriter::new(cfg.timezone);

    let err = run_report(&cfg, &RejectingTokens, &http, &writer, &Recorder::default(), now()).unwrap_err();

    assert!(matches!(err, Error::Auth { .. }));
    assert!(http.transport().calls.borrow().is_empty());
    assert!(!out.exists());
}
