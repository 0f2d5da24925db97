//! Calendar dates mentioned in free text.
//!
//! Two independent stages produce candidate sets that are merged, deduplicated
//! and sorted:
//!
//! - [`PhraseSearch`]: natural-language phrases ("March 5", "3 days ago",
//!   "last Friday"), with partial dates resolved toward the past.
//! - [`PatternScan`]: three rigid surface forms (`15/01/2025`, `15 Jan 2025`,
//!   `Wed, 15 Jan`). Always runs.
//!
//! Any hit from either stage is accepted as-is; a candidate that does not
//! form a real calendar date is dropped silently.

pub mod patterns;
pub mod phrases;

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};

pub use patterns::PatternScan;
pub use phrases::PhraseSearch;

pub(crate) const MONTH: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|\
aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

pub(crate) const WEEKDAY: &str =
    "mon(?:day)?|tue(?:s|sday)?|wed(?:nesday)?|thu(?:r|rs|rsday)?|fri(?:day)?|sat(?:urday)?|sun(?:day)?";

/// One extraction stage.
pub trait DateSearch {
    fn search(&self, text: &str) -> BTreeSet<NaiveDate>;
}

pub struct DateExtractor {
    phrases: Option<Box<dyn DateSearch>>,
    patterns: PatternScan,
}

impl DateExtractor {
    /// Both stages, with `reference` as "today".
    pub fn new(reference: NaiveDate) -> Self {
        Self {
            phrases: Some(Box::new(PhraseSearch::new(reference))),
            patterns: PatternScan::new(reference),
        }
    }

    pub fn patterns_only(reference: NaiveDate) -> Self {
        Self {
            phrases: None,
            patterns: PatternScan::new(reference),
        }
    }

    pub fn with_phrase_search(mut self, search: Box<dyn DateSearch>) -> Self {
        self.phrases = Some(search);
        self
    }

    /// Ascending, duplicate-free ISO-8601 dates.
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut hits = self
            .phrases
            .as_ref()
            .map(|p| p.search(text))
            .unwrap_or_default();
        hits.extend(self.patterns.search(text));
        hits.into_iter().map(|d| d.format("%Y-%m-%d").to_string()).collect()
    }
}

pub(crate) fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.trim_end_matches('.').to_ascii_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

pub(crate) fn weekday_from_name(name: &str) -> Option<Weekday> {
    let lower = name.to_ascii_lowercase();
    let day = match lower.get(..3)? {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

/// Two-digit years pivot at 70; four-digit years pass through.
pub(crate) fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    match raw.len() {
        2 if year < 70 => Some(2000 + year),
        2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
    }
}

/// A month/day without a year is the most recent such date on or before
/// `reference`.
pub(crate) fn most_recent(month: u32, day: u32, reference: NaiveDate) -> Option<NaiveDate> {
    // Feb 29 may be up to 8 years back across a skipped century leap year
    (0..=8)
        .filter_map(|back| NaiveDate::from_ymd_opt(reference.year() - back, month, day))
        .find(|d| *d <= reference)
}
