use std::collections::BTreeSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use super::{DateSearch, MONTH, WEEKDAY, expand_year, month_from_name, most_recent};

// 15/01/2025, 5-1-25
static NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})\b").expect("valid regex")
});

// 15 Jan 2025, 3 September 24
static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(\d{{1,2}})\s+({MONTH})\b\.?\s+(\d{{2,4}})\b")).expect("valid regex")
});

// Wed, 15 Jan
static WEEKDAY_DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b(?:{WEEKDAY})\b\.?,\s*(\d{{1,2}})\s+({MONTH})\b")).expect("valid regex")
});

/// Rigid surface forms, scanned independently of the phrase stage.
#[derive(Debug, Clone, Copy)]
pub struct PatternScan {
    reference: NaiveDate,
}

impl PatternScan {
    pub fn new(reference: NaiveDate) -> Self {
        Self { reference }
    }
}

/// Day-first; month-first only when day-first is not a calendar date.
fn numeric(first: &str, second: &str, year: &str) -> Option<NaiveDate> {
    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    let year = expand_year(year)?;
    NaiveDate::from_ymd_opt(year, second, first).or_else(|| NaiveDate::from_ymd_opt(year, first, second))
}

fn day_month_year(day: &str, month: &str, year: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(expand_year(year)?, month_from_name(month)?, day.parse().ok()?)
}

impl DateSearch for PatternScan {
    fn search(&self, text: &str) -> BTreeSet<NaiveDate> {
        let numeric_hits = NUMERIC
            .captures_iter(text)
            .filter_map(|c| numeric(&c[1], &c[2], &c[3]));

        let textual_hits = DAY_MONTH_YEAR
            .captures_iter(text)
            .filter_map(|c| day_month_year(&c[1], &c[2], &c[3]));

        let weekday_hits = WEEKDAY_DAY_MONTH.captures_iter(text).filter_map(|c| {
            let day = c[1].parse().ok()?;
            most_recent(month_from_name(&c[2])?, day, self.reference)
        });

        numeric_hits.chain(textual_hits).chain(weekday_hits).collect()
    }
}
