use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::models::FilterCriteria;

const DATE_FORMAT: &str = "%Y-%m-%d";

const START_DATE: &str = "startDate";
const END_DATE: &str = "endDate";

/// Canonical query for one category's stats endpoint. Terms are always
/// emitted in the same order, so the serialized form doubles as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterQuery {
    category: String,
    terms: Vec<(&'static str, String)>,
}

impl FilterQuery {
    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn terms(&self) -> &[(&'static str, String)] {
        &self.terms
    }

    pub fn to_query_string(&self) -> String {
        self.terms
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    pub fn endpoint(&self) -> String {
        format!(
            "/api/stats/{}?{}",
            urlencoding::encode(&self.category),
            self.to_query_string()
        )
    }

    pub fn cache_key(&self) -> String {
        format!("{}?{}", self.category, self.to_query_string())
    }
}

/// Category slugs are path segments; blank ones never reach the builder.
pub fn parse_category_slug(raw: &str) -> Result<String, ValidationError> {
    let slug = raw.trim();
    if slug.is_empty() {
        return Err(ValidationError::EmptyValue("category"));
    }
    Ok(slug.to_string())
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn build_filter_query(category: &str, criteria: &FilterCriteria) -> FilterQuery {
    let mut terms: Vec<(&'static str, String)> = Vec::with_capacity(6);

    // Aggregation is undefined without a metric, so one is always sent.
    terms.push(("metricType", criteria.effective_metric_type().as_str().to_string()));

    if let Some(city) = &criteria.city {
        terms.push(("city", city.clone()));
    }
    if let Some(level) = criteria.experience_level {
        terms.push(("experienceLevel", level.as_str().to_string()));
    }
    if let Some(range) = criteria.salary_range {
        terms.push(("salaryRange", range.as_str().to_string()));
    }
    if let Some(dates) = &criteria.date_range {
        if let Some(start) = dates.start {
            terms.push((START_DATE, format_date(start)));
        }
        if let Some(end) = dates.end {
            terms.push((END_DATE, format_date(end)));
        }
    }

    FilterQuery {
        category: category.to_string(),
        terms,
    }
}
