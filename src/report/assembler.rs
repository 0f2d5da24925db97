use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use log::debug;

use crate::config::RunConfig;
use crate::dates::DateExtractor;
use crate::domain::email::NormalizedMessage;
use crate::error::Result;
use crate::graph::folders::FolderResolver;
use crate::graph::http::{HttpRetryClient, Transport};
use crate::graph::messages::MessagePaginator;
use crate::graph::retry::Sleeper;
use crate::mail::filter::KeywordFilter;
use crate::mail::normalize::normalize_message;
use crate::report::{ReportRow, Reporter, RunSummary};

const RECEIVED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Folder path in, report rows out.
pub struct ReportAssembler<'a, T, S> {
    http: &'a HttpRetryClient<T, S>,
    config: &'a RunConfig,
    token: &'a str,
    reporter: &'a dyn Reporter,
}

impl<'a, T: Transport, S: Sleeper> ReportAssembler<'a, T, S> {
    pub fn new(
        http: &'a HttpRetryClient<T, S>,
        config: &'a RunConfig,
        token: &'a str,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            http,
            config,
            token,
            reporter,
        }
    }

    /// Rows for every message received in the last `lookback_days` before
    /// `now` that passes the keyword filter, in server order.
    pub fn assemble(&self, now: DateTime<Utc>) -> Result<(Vec<ReportRow>, RunSummary)> {
        let base = self.config.graph_base.as_str();
        let folder_id = FolderResolver::new(self.http, base, self.token).resolve(&self.config.folder_path)?;

        let since = now - Duration::days(i64::from(self.config.lookback_days));
        let tz = self.config.timezone;
        let extractor = DateExtractor::new(now.with_timezone(&tz).date_naive());
        let filter = KeywordFilter::new(self.config.keyword.as_deref());

        let pager = MessagePaginator::new(self.http, base, self.token);
        let mut messages = pager.fetch(&folder_id, since)?;

        let mut seen = HashSet::new();
        let mut rows = Vec::new();
        let mut summary = RunSummary::default();

        while let Some(message) = messages.next() {
            let message = message?;
            // a page boundary was crossed to produce this message
            if messages.pages_fetched() > summary.pages {
                if summary.pages > 0 {
                    self.reporter.progress(summary.scanned, summary.kept);
                }
                summary.pages = messages.pages_fetched();
            }

            if !seen.insert(message.id.clone()) {
                debug!("skipping duplicate message {}", message.id);
                continue;
            }
            summary.scanned += 1;

            let message = normalize_message(message);
            if !filter.matches(&message) {
                continue;
            }
            rows.push(build_row(message, &extractor, tz));
            summary.kept += 1;
        }
        summary.pages = messages.pages_fetched();
        if summary.scanned > 0 {
            self.reporter.progress(summary.scanned, summary.kept);
        }

        Ok((rows, summary))
    }
}

pub fn build_row(message: NormalizedMessage, extractor: &DateExtractor, tz: Tz) -> ReportRow {
    let received_local = message
        .received_at
        .map(|at| at.with_timezone(&tz).format(RECEIVED_FORMAT).to_string())
        .unwrap_or_default();
    ReportRow {
        extracted_dates: extractor.extract(&message.text),
        subject: message.subject,
        received_local,
        sender_name: message.sender.name,
        sender_email: message.sender.email_address,
        permalink: message.permalink,
    }
}
