use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::api::JobMarketSource;
use crate::error::check_observations;
use crate::filter::build_filter_query;
use crate::models::{Category, CategoryStats, DashboardSummary, FilterCriteria, TopPerformer};
use crate::stats::compute_category_stats;

/// Fetch, validate and reduce a single category.
pub fn load_category(
    source: &dyn JobMarketSource,
    category: &str,
    criteria: &FilterCriteria,
) -> Result<CategoryStats> {
    let query = build_filter_query(category, criteria);
    let records = source
        .fetch_observations(&query)
        .with_context(|| format!("Failed to fetch observations for '{}'", category))?;
    check_observations(category, criteria.effective_metric_type(), &records)?;
    Ok(compute_category_stats(category, &records))
}

/// Runs the pipeline for every active category in parallel.
///
/// A category whose fetch fails or that has no observations is left out of
/// the result; the others are unaffected.
pub fn load_dashboard(
    source: &dyn JobMarketSource,
    categories: &[Category],
    criteria: &FilterCriteria,
) -> BTreeMap<String, CategoryStats> {
    categories
        .par_iter()
        .filter(|c| c.active)
        .filter_map(|c| match load_category(source, &c.slug, criteria) {
            Ok(stats) if stats.has_data() => Some((c.slug.clone(), stats)),
            Ok(_) => {
                log::info!("No data for category '{}'", c.slug);
                None
            }
            Err(e) => {
                log::warn!("Skipping category '{}': {:#}", c.slug, e);
                None
            }
        })
        .collect()
}

pub fn summarize(stats: &BTreeMap<String, CategoryStats>) -> DashboardSummary {
    let total_jobs = stats.values().map(|s| s.latest_count).sum();

    let average_growth = if stats.is_empty() {
        0.0
    } else {
        stats.values().map(|s| s.change_percent).sum::<f64>() / stats.len() as f64
    };

    let mut top_performer: Option<TopPerformer> = None;
    for (slug, s) in stats {
        if top_performer
            .as_ref()
            .is_none_or(|top| s.change_percent > top.change_percent)
        {
            top_performer = Some(TopPerformer {
                category: slug.clone(),
                change_percent: s.change_percent,
            });
        }
    }

    DashboardSummary {
        total_jobs,
        average_growth,
        top_performer,
        category_count: stats.len(),
    }
}
