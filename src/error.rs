use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{JobCountRecord, MetricType};

/// Input rejected at the boundary, before any statistics are computed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Validation error: {0} must not be empty")]
    EmptyValue(&'static str),

    #[error("Validation error: unknown {kind} '{value}'")]
    UnknownValue { kind: &'static str, value: String },

    #[error("Validation error: invalid date label pattern '{0}'")]
    InvalidLabelFormat(String),

    #[error("Validation error: start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Validation error: observation #{id} belongs to '{found}', expected '{expected}'")]
    CategoryMismatch {
        id: i64,
        expected: String,
        found: String,
    },

    #[error("Validation error: observation #{id} has metric type {found}, expected {expected}")]
    MetricTypeMismatch {
        id: i64,
        expected: &'static str,
        found: &'static str,
    },
}

/// Checks that a fetched batch matches the query it was fetched for.
/// Duplicate timestamps are allowed; the reducer orders them by id.
pub fn check_observations(
    category: &str,
    metric_type: MetricType,
    records: &[JobCountRecord],
) -> Result<(), ValidationError> {
    if category.trim().is_empty() {
        return Err(ValidationError::EmptyValue("category"));
    }
    for record in records {
        if record.category != category {
            return Err(ValidationError::CategoryMismatch {
                id: record.id,
                expected: category.to_string(),
                found: record.category.clone(),
            });
        }
        if record.metric_type != metric_type {
            return Err(ValidationError::MetricTypeMismatch {
                id: record.id,
                expected: metric_type.as_str(),
                found: record.metric_type.as_str(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: i64, category: &str, metric_type: MetricType) -> JobCountRecord {
        JobCountRecord {
            id,
            category: category.to_string(),
            count: 10,
            fetched_at: Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap(),
            location: "all-locations".to_string(),
            metric_type,
        }
    }

    #[test]
    fn test_check_observations_accepts_matching_batch() {
        let records = vec![
            record(1, "java", MetricType::Remote),
            record(2, "java", MetricType::Remote),
        ];
        assert!(check_observations("java", MetricType::Remote, &records).is_ok());
        assert!(check_observations("java", MetricType::Remote, &[]).is_ok());
    }

    #[test]
    fn test_check_observations_rejects_foreign_category() {
        let records = vec![record(1, "java", MetricType::Total), record(7, "python", MetricType::Total)];
        let err = check_observations("java", MetricType::Total, &records).unwrap_err();
        assert_eq!(
            err,
            ValidationError::CategoryMismatch {
                id: 7,
                expected: "java".to_string(),
                found: "python".to_string(),
            }
        );
        assert!(err.to_string().starts_with("Validation error"));
    }

    #[test]
    fn test_check_observations_rejects_wrong_metric() {
        let records = vec![record(3, "java", MetricType::WithSalary)];
        let err = check_observations("java", MetricType::Total, &records).unwrap_err();
        assert!(matches!(err, ValidationError::MetricTypeMismatch { id: 3, .. }));
    }

    #[test]
    fn test_check_observations_rejects_blank_category() {
        assert_eq!(
            check_observations("  ", MetricType::Total, &[]),
            Err(ValidationError::EmptyValue("category"))
        );
    }
}
