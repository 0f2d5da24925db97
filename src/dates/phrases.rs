use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::{Captures, Regex};

use super::{DateSearch, MONTH, WEEKDAY, expand_year, month_from_name, most_recent, weekday_from_name};

static ISO: LazyLock<Regex> = LazyLock::new(|| {
    // a `T` may follow directly: 2025-01-07T10:00:00Z
    Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})(?:\b|T)").expect("valid regex")
});

// "March 5", "Mar. 5th, 2025"
static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTH})\b\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("valid regex")
});

// "5 March", "5th of March, 2025", "15 Jan 25"
static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTH})\b\.?(?:,?\s+(\d{{4}}|\d{{2}})\b)?"
    ))
    .expect("valid regex")
});

static RELATIVE_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(today|yesterday|tomorrow)\b").expect("valid regex"));

static AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s+(day|week)s?\s+ago\b").expect("valid regex")
});

static LAST_WEEKDAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\blast\s+({WEEKDAY})\b")).expect("valid regex")
});

/// Natural-language date phrases. Anything without an explicit year is read
/// as the most recent matching day on or before the reference date.
#[derive(Debug, Clone, Copy)]
pub struct PhraseSearch {
    reference: NaiveDate,
}

impl PhraseSearch {
    pub fn new(reference: NaiveDate) -> Self {
        Self { reference }
    }

    fn calendar(&self, month: u32, day: u32, year: Option<&str>) -> Option<NaiveDate> {
        match year {
            Some(year) => NaiveDate::from_ymd_opt(expand_year(year)?, month, day),
            None => most_recent(month, day, self.reference),
        }
    }

    fn iso(&self, caps: &Captures) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
    }

    fn month_day(&self, caps: &Captures) -> Option<NaiveDate> {
        let month = month_from_name(&caps[1])?;
        let day = caps[2].parse().ok()?;
        self.calendar(month, day, caps.get(3).map(|m| m.as_str()))
    }

    fn day_month(&self, caps: &Captures) -> Option<NaiveDate> {
        let day = caps[1].parse().ok()?;
        let month = month_from_name(&caps[2])?;
        self.calendar(month, day, caps.get(3).map(|m| m.as_str()))
    }

    fn relative_day(&self, caps: &Captures) -> Option<NaiveDate> {
        match caps[1].to_ascii_lowercase().as_str() {
            "today" => Some(self.reference),
            "yesterday" => self.reference.checked_sub_days(Days::new(1)),
            "tomorrow" => self.reference.checked_add_days(Days::new(1)),
            _ => None,
        }
    }

    fn ago(&self, caps: &Captures) -> Option<NaiveDate> {
        let n: u64 = caps[1].parse().ok()?;
        let days = if caps[2].eq_ignore_ascii_case("week") { n * 7 } else { n };
        self.reference.checked_sub_days(Days::new(days))
    }

    /// Strictly before the reference: "last Monday" said on a Monday is a week ago.
    fn last_weekday(&self, caps: &Captures) -> Option<NaiveDate> {
        let target = weekday_from_name(&caps[1])?;
        let today = self.reference.weekday().num_days_from_monday();
        let wanted = target.num_days_from_monday();
        let back = match (today + 7 - wanted) % 7 {
            0 => 7,
            n => n,
        };
        self.reference.checked_sub_days(Days::new(u64::from(back)))
    }
}

impl DateSearch for PhraseSearch {
    fn search(&self, text: &str) -> BTreeSet<NaiveDate> {
        let mut hits = BTreeSet::new();

        // spans read as day-month; "15 Jan 25" must not also yield "Jan 25"
        let mut taken: Vec<Range<usize>> = Vec::new();
        for caps in DAY_MONTH.captures_iter(text) {
            taken.extend(caps.get(0).map(|m| m.range()));
            hits.extend(self.day_month(&caps));
        }
        for caps in MONTH_DAY.captures_iter(text) {
            let Some(m) = caps.get(0) else { continue };
            if taken.iter().any(|r| r.start < m.end() && m.start() < r.end) {
                continue;
            }
            hits.extend(self.month_day(&caps));
        }

        let rules: [(&Regex, fn(&Self, &Captures) -> Option<NaiveDate>); 4] = [
            (&*ISO, Self::iso),
            (&*RELATIVE_DAY, Self::relative_day),
            (&*AGO, Self::ago),
            (&*LAST_WEEKDAY, Self::last_weekday),
        ];
        for (regex, parse) in rules {
            for caps in regex.captures_iter(text) {
                if let Some(date) = parse(self, &caps) {
                    hits.insert(date);
                }
            }
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // a Monday
    fn search(text: &str) -> Vec<String> {
        PhraseSearch::new(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
            .search(text)
            .into_iter()
            .map(|d| d.to_string())
            .collect()
    }

    #[test]
    fn test_iso_dates() {
        assert_eq!(search("deployed 2025-01-07, rolled back 2025-1-9"), vec!["2025-01-07", "2025-01-09"]);
        assert!(search("build 2025-13-40").is_empty());
    }

    #[test]
    fn test_iso_timestamps() {
        assert_eq!(search("at 2025-01-07T10:00:00Z"), vec!["2025-01-07"]);
        assert_eq!(search("window 2025-02-01T00:00Z/2025-02-03T12:00Z"), vec!["2025-02-01", "2025-02-03"]);
    }

    #[test]
    fn test_month_first_phrases() {
        assert_eq!(search("due March 5th, 2024"), vec!["2024-03-05"]);
        assert_eq!(search("call on Feb. 2"), vec!["2025-02-02"]);
        // later in the year than the reference: last year's
        assert_eq!(search("party on December 24"), vec!["2024-12-24"]);
    }

    #[test]
    fn test_day_first_phrases() {
        assert_eq!(search("the 3rd of March"), vec!["2025-03-03"]);
        assert_eq!(search("on 21 Sept. 2023"), vec!["2023-09-21"]);
        assert_eq!(search("by 15 Jan 2025"), vec!["2025-01-15"]);
    }

    #[test]
    fn test_two_digit_year_is_not_read_as_a_day() {
        assert_eq!(search("Payment due 15 Jan 25"), vec!["2025-01-15"]);
        assert_eq!(search("Contract signed 15 Jan 19"), vec!["2019-01-15"]);
        assert_eq!(search("from 3rd of March, 24"), vec!["2024-03-03"]);
    }

    #[test]
    fn test_month_year_alone_is_not_a_date() {
        assert!(search("statement for Jan 2025").is_empty());
    }

    #[test]
    fn test_month_needs_whole_word() {
        assert!(search("the Mayor 12 said").is_empty());
    }

    #[test]
    fn test_relative_phrases() {
        assert_eq!(search("Yesterday and today"), vec!["2025-03-09", "2025-03-10"]);
        assert_eq!(search("ready tomorrow"), vec!["2025-03-11"]);
        assert_eq!(search("sent 3 days ago, reminded 1 week ago"), vec!["2025-03-03", "2025-03-07"]);
    }

    #[test]
    fn test_last_weekday() {
        assert_eq!(search("last Friday"), vec!["2025-03-07"]);
        assert_eq!(search("last monday"), vec!["2025-03-03"]);
    }
}
