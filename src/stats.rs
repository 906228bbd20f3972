use std::cmp::Ordering;

use crate::models::{CategoryStats, CountRange, JobCountRecord, LatestCount, Trend};

fn newest_first(a: &JobCountRecord, b: &JobCountRecord) -> Ordering {
    b.fetched_at
        .cmp(&a.fetched_at)
        .then_with(|| b.id.cmp(&a.id))
}

fn sorted_newest_first(records: &[JobCountRecord]) -> Vec<JobCountRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(newest_first);
    sorted
}

fn percent_change(latest: u64, previous: u64) -> f64 {
    if previous == 0 {
        return 0.0;
    }
    (latest as f64 - previous as f64) / previous as f64 * 100.0
}

/// Reduces one category's observations into its summary.
///
/// With fewer than two observations the previous count mirrors the latest
/// one, so the change reads as a flat 0% rather than missing. An empty input
/// gives an all-zero summary; check `records` to tell "no data" apart.
pub fn compute_category_stats(category: &str, records: &[JobCountRecord]) -> CategoryStats {
    let records = sorted_newest_first(records);

    let latest_count = records.first().map(|r| r.count).unwrap_or(0);
    let previous_count = records.get(1).map(|r| r.count).unwrap_or(latest_count);

    CategoryStats {
        category: category.to_string(),
        change_percent: percent_change(latest_count, previous_count),
        records,
        latest_count,
        previous_count,
    }
}

/// Projects only the newest observation and its delta.
///
/// Unlike [`compute_category_stats`], a missing previous observation leaves
/// both deltas as `None`.
pub fn compute_latest_count(category: &str, records: &[JobCountRecord]) -> LatestCount {
    let mut newest: Option<&JobCountRecord> = None;
    let mut runner_up: Option<&JobCountRecord> = None;
    for record in records {
        match newest {
            Some(current) if newest_first(record, current) != Ordering::Less => {
                if runner_up.is_none_or(|r| newest_first(record, r) == Ordering::Less) {
                    runner_up = Some(record);
                }
            }
            _ => {
                runner_up = newest;
                newest = Some(record);
            }
        }
    }

    let Some(latest) = newest else {
        return LatestCount {
            category: category.to_string(),
            metric_type: Default::default(),
            count: 0,
            fetched_at: None,
            change_from_previous: None,
            percentage_change: None,
        };
    };

    let (change_from_previous, percentage_change) = match runner_up {
        Some(previous) => (
            Some(latest.count as i64 - previous.count as i64),
            Some(percent_change(latest.count, previous.count)),
        ),
        None => (None, None),
    };

    LatestCount {
        category: category.to_string(),
        metric_type: latest.metric_type,
        count: latest.count,
        fetched_at: Some(latest.fetched_at),
        change_from_previous,
        percentage_change,
    }
}

impl CategoryStats {
    pub fn has_data(&self) -> bool {
        !self.records.is_empty()
    }

    pub fn count_range(&self) -> Option<CountRange> {
        let min = self.records.iter().map(|r| r.count).min()?;
        let max = self.records.iter().map(|r| r.count).max()?;
        let sum: u64 = self.records.iter().map(|r| r.count).sum();
        Some(CountRange {
            min,
            max,
            average: sum as f64 / self.records.len() as f64,
        })
    }

    pub fn trend(&self) -> Trend {
        if self.change_percent > 0.0 {
            Trend::Up
        } else if self.change_percent < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }

    pub fn format_change(&self) -> String {
        let sign = if self.change_percent > 0.0 { "+" } else { "" };
        format!("{}{:.1}%", sign, self.change_percent)
    }
}
