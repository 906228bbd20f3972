use chrono::format::{Item, StrftimeItems};

use crate::error::ValidationError;
use crate::models::{CategoryStats, JobCountRecord, SeriesPoint};

pub const DEFAULT_LABEL_FORMAT: &str = "%b %-d";

/// strftime pattern for chart labels, checked up front so rendering a label
/// can never fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFormat(String);

impl LabelFormat {
    pub fn new(pattern: &str) -> Result<Self, ValidationError> {
        if pattern.is_empty() || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ValidationError::InvalidLabelFormat(pattern.to_string()));
        }
        Ok(Self(pattern.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self(DEFAULT_LABEL_FORMAT.to_string())
    }
}

/// Oldest-first label/value pairs for charting.
///
/// The records are re-sorted rather than reversed, so equal timestamps come
/// out in ascending id order.
pub fn shape_series(stats: &CategoryStats, format: &LabelFormat) -> Vec<SeriesPoint> {
    let mut records: Vec<&JobCountRecord> = stats.records.iter().collect();
    records.sort_by(|a, b| a.fetched_at.cmp(&b.fetched_at).then_with(|| a.id.cmp(&b.id)));

    records
        .into_iter()
        .map(|r| SeriesPoint {
            label: r.fetched_at.format(format.as_str()).to_string(),
            value: r.count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricType;
    use crate::stats::compute_category_stats;
    use chrono::{TimeZone, Utc};

    fn record(id: i64, count: u64, month: u32, day: u32) -> JobCountRecord {
        JobCountRecord {
            id,
            category: "java".to_string(),
            count,
            fetched_at: Utc.with_ymd_and_hms(2024, month, day, 6, 0, 0).unwrap(),
            location: "all-locations".to_string(),
            metric_type: MetricType::Total,
        }
    }

    #[test]
    fn test_series_is_reverse_of_records() {
        let stats = compute_category_stats(
            "java",
            &[record(1, 100, 1, 1), record(2, 120, 1, 2), record(3, 110, 1, 3)],
        );
        let series = shape_series(&stats, &LabelFormat::default());

        assert_eq!(series.len(), stats.records.len());
        let values: Vec<u64> = series.iter().map(|p| p.value).collect();
        let mut expected: Vec<u64> = stats.records.iter().map(|r| r.count).collect();
        expected.reverse();
        assert_eq!(values, expected);

        let labels: Vec<&str> = series.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan 1", "Jan 2", "Jan 3"]);
    }

    #[test]
    fn test_series_ties_are_ascending_by_id() {
        let stats = compute_category_stats(
            "java",
            &[record(7, 70, 2, 10), record(4, 40, 2, 10), record(1, 10, 2, 9)],
        );
        let series = shape_series(&stats, &LabelFormat::default());
        let values: Vec<u64> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![10, 40, 70]);
    }

    #[test]
    fn test_series_empty() {
        let stats = compute_category_stats("java", &[]);
        assert!(shape_series(&stats, &LabelFormat::default()).is_empty());
    }

    #[test]
    fn test_custom_label_format() {
        let stats = compute_category_stats("java", &[record(1, 5, 12, 24)]);
        let format = LabelFormat::new("%Y-%m-%d").unwrap();
        assert_eq!(shape_series(&stats, &format)[0].label, "2024-12-24");
    }

    #[test]
    fn test_invalid_label_format_rejected() {
        assert!(LabelFormat::new("%Q").is_err());
        assert!(LabelFormat::new("").is_err());
    }
}
