//! Tag and date predicates over a loaded dataset.

use chrono::{Days, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::Arc;

use crate::dataset::{Dataset, RecordView};

/// Tag picker entry meaning "do not filter by tag".
pub const NO_TAG_FILTER: &str = "(no filter)";

/// Inclusive day range on `taken_dt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Build a range; reversed bounds are swapped.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }

    /// Half-open timestamp bounds `[start 00:00, end + 1 day 00:00)`.
    pub fn bounds(&self) -> (NaiveDateTime, NaiveDateTime) {
        let start = self.start.and_time(chrono::NaiveTime::MIN);
        let end = self
            .end
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .and_time(chrono::NaiveTime::MIN);
        (start, end)
    }

    pub fn contains(&self, taken: Option<NaiveDateTime>) -> bool {
        let (start, end) = self.bounds();
        matches!(taken, Some(dt) if dt >= start && dt < end)
    }
}

/// Active filters. `None` means the filter is off.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterConfig {
    pub tag: Option<String>,
    pub date_range: Option<DateRange>,
}

impl FilterConfig {
    /// Map a tag picker choice to a filter, treating [`NO_TAG_FILTER`] and
    /// blank input as "no tag filter".
    pub fn with_tag_choice(mut self, choice: &str) -> Self {
        let choice = choice.trim();
        self.tag = if choice.is_empty() || choice == NO_TAG_FILTER {
            None
        } else {
            Some(choice.to_string())
        };
        self
    }

    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.date_range.is_none()
    }
}

/// Whole-token matcher over a record's comma-separated tags.
///
/// Filtering on `lyon` matches `"lyon, france"` but not `"lyonnais"`.
#[derive(Debug, Clone)]
pub struct TagMatcher {
    pattern: Regex,
}

impl TagMatcher {
    /// Fails only when the tag is too long for the compiled pattern size
    /// limit.
    pub fn new(tag: &str) -> Result<Self, regex::Error> {
        let needle = regex::escape(&tag.trim().to_lowercase());
        let pattern = Regex::new(&format!(r"(^|,)\s*{}\s*(,|$)", needle))?;
        Ok(Self { pattern })
    }

    pub fn matches(&self, tags: &str) -> bool {
        self.pattern.is_match(&tags.to_lowercase())
    }
}

/// Result of applying filters: the surviving rows and the unfiltered size.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub view: RecordView,
    pub total: usize,
}

impl FilterOutcome {
    pub fn filtered(&self) -> usize {
        self.view.len()
    }

    /// The row-count feedback line shown above the map.
    pub fn summary(&self) -> String {
        format!(
            "Rows after filters: {} (from {})",
            format_count(self.filtered()),
            format_count(self.total)
        )
    }
}

/// Apply the configured filters. Absent filters pass everything through; the
/// date filter is skipped when the dataset has no `taken_dt` column.
pub fn apply_filters(dataset: &Arc<Dataset>, config: &FilterConfig) -> Result<FilterOutcome, regex::Error> {
    let mut view = RecordView::full(Arc::clone(dataset));

    if let Some(ref tag) = config.tag {
        let matcher = TagMatcher::new(tag)?;
        view = view.retain(|r| matcher.matches(&r.tags));
    }

    if let Some(range) = config.date_range {
        if dataset.has_taken_dt {
            view = view.retain(|r| range.contains(r.taken_dt));
        }
    }

    tracing::debug!(
        tag = ?config.tag,
        date_range = ?config.date_range,
        rows = view.len(),
        total = dataset.len(),
        "Filters applied"
    );

    Ok(FilterOutcome {
        view,
        total: dataset.len(),
    })
}

/// Format a count with thousands separators (`12345` -> `12,345`).
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::load_from_reader;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn load(csv: &str) -> Arc<Dataset> {
        Arc::new(load_from_reader(csv.as_bytes(), "filter.csv").unwrap())
    }

    fn ids(outcome: &FilterOutcome) -> Vec<&str> {
        outcome.view.records().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_tag_matches_whole_tokens_only() {
        let matcher = TagMatcher::new("lyon").unwrap();
        assert!(matcher.matches("lyon, france"));
        assert!(matcher.matches("france,Lyon"));
        assert!(matcher.matches("a ,  lyon  , b"));
        assert!(!matcher.matches("lyonnais"));
        assert!(!matcher.matches("vieux lyon"));
        assert!(!matcher.matches(""));
    }

    #[test]
    fn test_tag_with_regex_characters_is_literal() {
        let matcher = TagMatcher::new("c++").unwrap();
        assert!(matcher.matches("rust,c++"));
        assert!(!matcher.matches("cc"));
    }

    #[test]
    fn test_oversized_tag_is_an_error() {
        let tag = "a".repeat(2_000_000);
        assert!(TagMatcher::new(&tag).is_err());

        let dataset = load("id,title,tags,url,lat,lon\n1,a,lyon,u,45.0,4.0\n");
        let config = FilterConfig::default().with_tag_choice(&tag);
        assert!(apply_filters(&dataset, &config).is_err());
    }

    #[test]
    fn test_end_date_is_inclusive() {
        let range = DateRange::new(date(2020, 1, 1), date(2020, 1, 31));
        let midnight_end = date(2020, 1, 31).and_hms_opt(0, 0, 0).unwrap();
        let late_end = date(2020, 1, 31).and_hms_opt(23, 59, 59).unwrap();
        let next_day = date(2020, 2, 1).and_hms_opt(0, 0, 0).unwrap();

        assert!(range.contains(Some(midnight_end)));
        assert!(range.contains(Some(late_end)));
        assert!(!range.contains(Some(next_day)));
        assert!(!range.contains(None));
    }

    #[test]
    fn test_reversed_range_is_swapped() {
        let range = DateRange::new(date(2021, 5, 1), date(2021, 4, 1));
        assert_eq!(range.start, date(2021, 4, 1));
        assert_eq!(range.end, date(2021, 5, 1));
    }

    #[test]
    fn test_no_filters_is_identity() {
        let dataset = load("id,title,tags,url,lat,lon\n1,a,x,u,1,1\n2,b,y,u,2,2\n");
        let config = FilterConfig::default().with_tag_choice(NO_TAG_FILTER);
        assert!(config.is_empty());

        let outcome = apply_filters(&dataset, &config).unwrap();
        assert_eq!(outcome.view.rows(), &[0, 1]);
        assert_eq!(outcome.total, 2);
    }

    #[test]
    fn test_filters_compose_with_and() {
        let dataset = load(
            "id,title,tags,url,lat,lon,taken_dt\n\
             1,a,lyon,u,1,1,2020-01-05 10:00:00\n\
             2,b,lyon,u,1,1,2021-01-05 10:00:00\n\
             3,c,paris,u,1,1,2020-01-06 10:00:00\n\
             4,d,lyon,u,1,1,\n",
        );
        let config = FilterConfig::default()
            .with_tag_choice("Lyon")
            .with_date_range(Some(DateRange::new(date(2020, 1, 1), date(2020, 12, 31))));

        let outcome = apply_filters(&dataset, &config).unwrap();
        assert_eq!(ids(&outcome), vec!["1"]);
    }

    #[test]
    fn test_date_filter_skipped_without_column() {
        let dataset = load("id,title,tags,url,lat,lon\n1,a,x,u,1,1\n");
        let config = FilterConfig::default()
            .with_date_range(Some(DateRange::new(date(2000, 1, 1), date(2000, 1, 2))));

        assert_eq!(apply_filters(&dataset, &config).unwrap().filtered(), 1);
    }

    #[test]
    fn test_lyon_scenario_summary() {
        let dataset = load(
            "id,title,tags,url,lat,lon\n\
             1,a,lyon,u,45.76,4.83\n\
             2,b,\"lyon, france\",u,45.75,4.85\n\
             3,c,paris,u,48.85,2.35\n",
        );
        let config = FilterConfig::default().with_tag_choice("lyon");
        let outcome = apply_filters(&dataset, &config).unwrap();

        assert_eq!(outcome.filtered(), 2);
        assert_eq!(outcome.summary(), "Rows after filters: 2 (from 3)");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }
}
