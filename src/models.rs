use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::error::ValidationError;

// --- Facets ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricType {
    #[default]
    #[strum(to_string = "Total")]
    Total,
    #[strum(to_string = "With Salary")]
    WithSalary,
    #[strum(to_string = "Remote")]
    Remote,
    #[strum(to_string = "Remote + Salary")]
    RemoteWithSalary,
}

impl MetricType {
    /// Name used on the wire and in query terms.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Total => "TOTAL",
            MetricType::WithSalary => "WITH_SALARY",
            MetricType::Remote => "REMOTE",
            MetricType::RemoteWithSalary => "REMOTE_WITH_SALARY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExperienceLevel {
    #[strum(to_string = "Junior")]
    Junior,
    #[strum(to_string = "Mid")]
    Mid,
    #[strum(to_string = "Senior")]
    Senior,
}

impl ExperienceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceLevel::Junior => "JUNIOR",
            ExperienceLevel::Mid => "MID",
            ExperienceLevel::Senior => "SENIOR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
pub enum SalaryRange {
    #[serde(rename = "UNDER_25K")]
    #[strum(to_string = "< 25k")]
    Under25k,
    #[serde(rename = "RANGE_25_30K")]
    #[strum(to_string = "25-30k")]
    Range25To30k,
    #[serde(rename = "OVER_30K")]
    #[strum(to_string = "> 30k")]
    Over30k,
}

impl SalaryRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalaryRange::Under25k => "UNDER_25K",
            SalaryRange::Range25To30k => "RANGE_25_30K",
            SalaryRange::Over30k => "OVER_30K",
        }
    }

    /// Monthly salary bounds in PLN; `None` means unbounded on that side.
    pub fn bounds(&self) -> (Option<u32>, Option<u32>) {
        match self {
            SalaryRange::Under25k => (None, Some(25_000)),
            SalaryRange::Range25To30k => (Some(25_000), Some(30_000)),
            SalaryRange::Over30k => (Some(30_000), None),
        }
    }
}

fn parse_wire_name<T>(
    kind: &'static str,
    value: &str,
    name: fn(&T) -> &'static str,
) -> Result<T, ValidationError>
where
    T: IntoEnumIterator,
{
    T::iter()
        .find(|v| name(v).eq_ignore_ascii_case(value.trim()))
        .ok_or_else(|| ValidationError::UnknownValue {
            kind,
            value: value.to_string(),
        })
}

impl FromStr for MetricType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire_name("metric type", s, MetricType::as_str)
    }
}

impl FromStr for ExperienceLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire_name("experience level", s, ExperienceLevel::as_str)
    }
}

impl FromStr for SalaryRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire_name("salary range", s, SalaryRange::as_str)
    }
}

// --- Filter criteria ---

/// Inclusive range of calendar days. Dates are the intended local days, so
/// no time zone is involved when they are serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// The `days` calendar days leading up to and including `today`.
    pub fn last_days(days: u32, today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(chrono::Days::new(u64::from(days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start: Some(start),
            end: Some(today),
        }
    }

    /// Open-ended range from the Unix epoch. Sending an explicit start keeps
    /// the stats API from applying its own look-back window.
    pub fn full_history() -> Self {
        Self {
            start: Some(DateTime::<Utc>::UNIX_EPOCH.date_naive()),
            end: None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub date_range: Option<DateRange>,
    pub metric_type: Option<MetricType>,
    pub city: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub salary_range: Option<SalaryRange>,
}

impl FilterCriteria {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(DateRange {
            start: Some(start),
            end: Some(end),
        }) = self.date_range
        {
            if start > end {
                return Err(ValidationError::InvertedDateRange { start, end });
            }
        }
        if let Some(city) = &self.city {
            if city.trim().is_empty() {
                return Err(ValidationError::EmptyValue("city"));
            }
        }
        Ok(())
    }

    pub fn effective_metric_type(&self) -> MetricType {
        self.metric_type.unwrap_or_default()
    }
}

// --- Observations ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCountRecord {
    pub id: i64,
    pub category: String,
    pub count: u64,
    #[serde(deserialize_with = "deserialize_fetched_at")]
    pub fetched_at: DateTime<Utc>,
    pub location: String,
    pub metric_type: MetricType,
}

// The stats API emits zone-less local date-times; those are read as UTC.
fn deserialize_fetched_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_fetched_at(&raw).map_err(serde::de::Error::custom)
}

fn parse_fetched_at(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid fetchedAt '{}': {}", raw, e))
}

// --- Derived summaries ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: String,
    pub records: Vec<JobCountRecord>, // newest first
    pub latest_count: u64,
    pub previous_count: u64,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestCount {
    pub category: String,
    pub metric_type: MetricType,
    pub count: u64,
    pub fetched_at: Option<DateTime<Utc>>,
    pub change_from_previous: Option<i64>,
    pub percentage_change: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u64,
    pub max: u64,
    pub average: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let arrow = match self {
            Trend::Up => "▲",
            Trend::Down => "▼",
            Trend::Flat => "■",
        };
        write!(f, "{}", arrow)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub category: String,
    pub change_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_jobs: u64,
    pub average_growth: f64,
    pub top_performer: Option<TopPerformer>,
    pub category_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: u64,
}

// --- Reference data ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub active: bool,
}
