mod api;
mod colors;
mod config;
mod dashboard;
mod error;
mod filter;
mod models;
mod series;
mod stats;
mod tui;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use api::{HttpSource, JobMarketSource};
use colors::resolve_color;
use config::Config;
use filter::{build_filter_query, parse_category_slug};
use models::{DateRange, ExperienceLevel, FilterCriteria, MetricType, SalaryRange};
use series::{shape_series, LabelFormat};

#[derive(Parser)]
#[command(name = "jobpulse")]
#[command(about = "Job market trends - counts, changes and charts per category")]
struct Cli {
    /// Stats API base URL (overrides config and JOBPULSE_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// strftime pattern for chart labels
    #[arg(long, global = true)]
    label_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct FacetArgs {
    /// Metric (TOTAL, WITH_SALARY, REMOTE, REMOTE_WITH_SALARY)
    #[arg(short, long)]
    metric: Option<MetricType>,

    /// City slug
    #[arg(short, long)]
    city: Option<String>,

    /// Experience level (JUNIOR, MID, SENIOR)
    #[arg(short, long)]
    experience: Option<ExperienceLevel>,

    /// Salary range (UNDER_25K, RANGE_25_30K, OVER_30K)
    #[arg(short, long)]
    salary: Option<SalaryRange>,
}

impl FacetArgs {
    fn criteria(&self, date_range: DateRange) -> Result<FilterCriteria> {
        let criteria = FilterCriteria {
            date_range: Some(date_range),
            metric_type: self.metric,
            city: self.city.as_deref().map(|c| c.trim().to_string()),
            experience_level: self.experience,
            salary_range: self.salary,
        };
        criteria.validate()?;
        Ok(criteria)
    }
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    #[command(flatten)]
    facets: FacetArgs,

    /// First day to include (YYYY-MM-DD)
    #[arg(long, conflicts_with = "days")]
    from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long, conflicts_with = "days")]
    to: Option<NaiveDate>,

    /// Look back this many days, ending today
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    days: Option<u32>,
}

impl FilterArgs {
    fn criteria(&self, default_days: u32, today: NaiveDate) -> Result<FilterCriteria> {
        let explicit = DateRange {
            start: self.from,
            end: self.to,
        };
        let date_range = match self.days {
            Some(days) => DateRange::last_days(days, today),
            None if explicit.is_unbounded() => DateRange::last_days(default_days, today),
            None => explicit,
        };
        self.facets.criteria(date_range)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List tracked categories
    Categories,

    /// List tracked cities
    Cities,

    /// Show the canonical stats query for a category
    Query {
        #[arg(value_parser = parse_category_slug)]
        category: String,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show trend statistics for a category
    Stats {
        #[arg(value_parser = parse_category_slug)]
        category: String,

        #[command(flatten)]
        filters: FilterArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the latest count and its change, over the full history
    Latest {
        #[arg(value_parser = parse_category_slug)]
        category: String,

        #[command(flatten)]
        facets: FacetArgs,

        #[arg(long)]
        json: bool,
    },

    /// Print the chart series for a category, oldest first
    Series {
        #[arg(value_parser = parse_category_slug)]
        category: String,

        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long)]
        json: bool,
    },

    /// Trend statistics for every active category
    Dashboard {
        #[command(flatten)]
        filters: FilterArgs,

        #[arg(long)]
        json: bool,
    },

    /// Interactive trend chart
    Chart {
        /// Category to open first
        #[arg(value_parser = parse_category_slug)]
        category: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Show a category's color triple
    Color {
        slug: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = &cli.api_url {
        config.set_api_url(url)?;
    }
    if let Some(pattern) = &cli.label_format {
        config.label_format = LabelFormat::new(pattern)?;
    }
    log::debug!("Using stats API at {}", config.api_url);

    let source = HttpSource::new(&config)?;
    let today = Local::now().date_naive();

    match cli.command {
        Commands::Categories => {
            let categories = source.fetch_categories()?;
            if categories.is_empty() {
                println!("No categories found.");
            } else {
                println!("{:<6} {:<16} {:<24} {:<8} {:<8}", "ID", "SLUG", "NAME", "ACTIVE", "COLOR");
                println!("{}", "-".repeat(66));
                for c in categories {
                    println!(
                        "{:<6} {:<16} {:<24} {:<8} {:<8}",
                        c.id,
                        truncate(&c.slug, 14),
                        truncate(&c.name, 22),
                        if c.active { "yes" } else { "no" },
                        resolve_color(&c.slug).primary
                    );
                }
            }
        }

        Commands::Cities => {
            let cities = source.fetch_cities()?;
            if cities.is_empty() {
                println!("No cities found.");
            } else {
                println!("{:<6} {:<20} {:<24} {:<8}", "ID", "SLUG", "NAME", "ACTIVE");
                println!("{}", "-".repeat(60));
                for c in cities {
                    println!(
                        "{:<6} {:<20} {:<24} {:<8}",
                        c.id,
                        truncate(&c.slug, 18),
                        truncate(&c.name, 22),
                        if c.active { "yes" } else { "no" }
                    );
                }
            }
        }

        Commands::Query { category, filters } => {
            let criteria = filters.criteria(config.default_days, today)?;
            let query = build_filter_query(&category, &criteria);
            println!("Category:  {}", query.category());
            println!("Endpoint:  {}", query.endpoint());
            println!("Cache key: {}", query.cache_key());
            for (key, value) in query.terms() {
                println!("  {:<16} {}", key, value);
            }
            if let Some(range) = criteria.salary_range {
                let bound = |b: Option<u32>| b.map(|v| v.to_string()).unwrap_or_default();
                let (min, max) = range.bounds();
                println!("Salary:    {} ({}..{} PLN)", range, bound(min), bound(max));
            }
        }

        Commands::Stats {
            category,
            filters,
            json,
        } => {
            let criteria = filters.criteria(config.default_days, today)?;
            let stats = dashboard::load_category(&source, &category, &criteria)?;
            if json {
                return print_json(&stats);
            }
            if !stats.has_data() {
                println!("No data for '{}' yet.", category);
                return Ok(());
            }

            println!(
                "{} ({})",
                category,
                criteria.effective_metric_type()
            );
            println!("Latest:   {}", stats.latest_count);
            println!("Previous: {}", stats.previous_count);
            println!("Change:   {} {}", stats.trend(), stats.format_change());
            if let Some(range) = stats.count_range() {
                println!(
                    "Points: {}  Min: {}  Max: {}  Avg: {:.0}",
                    stats.records.len(),
                    range.min,
                    range.max,
                    range.average
                );
            }
            println!("\n{:<8} {:<20} {:>8} {:<16}", "ID", "FETCHED", "COUNT", "LOCATION");
            println!("{}", "-".repeat(55));
            for r in &stats.records {
                println!(
                    "{:<8} {:<20} {:>8} {:<16}",
                    r.id,
                    r.fetched_at.format("%Y-%m-%d %H:%M"),
                    r.count,
                    truncate(&r.location, 16)
                );
            }
        }

        Commands::Latest {
            category,
            facets,
            json,
        } => {
            // The stats endpoint falls back to a 30-day window without a start date.
            let criteria = facets.criteria(DateRange::full_history())?;
            let query = build_filter_query(&category, &criteria);
            let records = source.fetch_observations(&query)?;
            error::check_observations(&category, criteria.effective_metric_type(), &records)?;
            let latest = stats::compute_latest_count(&category, &records);
            if json {
                return print_json(&latest);
            }

            match latest.fetched_at {
                Some(fetched_at) => {
                    println!("{} ({})", latest.category, latest.metric_type);
                    println!("Count:   {}", latest.count);
                    println!("Fetched: {}", fetched_at.format("%Y-%m-%d %H:%M"));
                    match (latest.change_from_previous, latest.percentage_change) {
                        (Some(change), Some(pct)) => {
                            println!("Change:  {:+} ({:+.1}%)", change, pct)
                        }
                        _ => println!("Change:  - (no previous observation)"),
                    }
                }
                None => println!("No data for '{}' yet.", category),
            }
        }

        Commands::Series {
            category,
            filters,
            json,
        } => {
            let criteria = filters.criteria(config.default_days, today)?;
            let stats = dashboard::load_category(&source, &category, &criteria)?;
            let series = shape_series(&stats, &config.label_format);
            if json {
                return print_json(&series);
            }
            if series.is_empty() {
                println!("No data for '{}' yet.", category);
            } else {
                println!("{:<16} {:>8}", "DATE", "COUNT");
                println!("{}", "-".repeat(25));
                for point in series {
                    println!("{:<16} {:>8}", truncate(&point.label, 16), point.value);
                }
            }
        }

        Commands::Dashboard { filters, json } => {
            let criteria = filters.criteria(config.default_days, today)?;
            let categories = source.fetch_categories()?;
            let all_stats = dashboard::load_dashboard(&source, &categories, &criteria);
            let summary = dashboard::summarize(&all_stats);
            if json {
                #[derive(Serialize)]
                struct Output<'a> {
                    summary: &'a models::DashboardSummary,
                    categories: &'a std::collections::BTreeMap<String, models::CategoryStats>,
                }
                return print_json(&Output {
                    summary: &summary,
                    categories: &all_stats,
                });
            }

            if all_stats.is_empty() {
                println!("No category has data for this filter.");
                return Ok(());
            }

            println!(
                "{:<16} {:>10} {:>10} {:>9} {:>7}",
                "CATEGORY", "LATEST", "PREVIOUS", "CHANGE", "POINTS"
            );
            println!("{}", "-".repeat(56));
            for (slug, s) in &all_stats {
                println!(
                    "{:<16} {:>10} {:>10} {:>9} {:>7}",
                    truncate(slug, 14),
                    s.latest_count,
                    s.previous_count,
                    format!("{} {}", s.trend(), s.format_change()),
                    s.records.len()
                );
            }

            println!("\nTotal jobs:     {}", summary.total_jobs);
            println!("Average growth: {:+.1}%", summary.average_growth);
            if let Some(top) = &summary.top_performer {
                println!("Top performer:  {} ({:+.1}%)", top.category, top.change_percent);
            }
            println!("Categories:     {}", summary.category_count);
        }

        Commands::Chart { category, filters } => {
            let criteria = filters.criteria(config.default_days, today)?;
            let categories: Vec<_> = source
                .fetch_categories()?
                .into_iter()
                .filter(|c| c.active)
                .collect();
            tui::run_chart(
                &source,
                categories,
                category.as_deref(),
                criteria,
                config.label_format.clone(),
            )?;
        }

        Commands::Color { slug } => {
            let color = resolve_color(&slug);
            println!("Slug:     {}", color.slug);
            println!("Primary:  {}", color.primary);
            println!("Gradient: {}", color.gradient);
            println!("Glow:     {}", color.glow);
            if !colors::known_slugs().any(|known| known == slug) {
                let known: Vec<&str> = colors::known_slugs().collect();
                println!("\n(no palette entry; known: {})", known.join(", "));
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn stats_filters(args: &[&str]) -> FilterArgs {
        let argv = ["jobpulse", "stats", "java"].iter().chain(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Stats { filters, .. } => filters,
            _ => panic!("expected the stats command"),
        }
    }

    #[test]
    fn test_default_window_when_no_dates() {
        let criteria = stats_filters(&[]).criteria(30, today()).unwrap();
        assert_eq!(
            criteria.date_range,
            Some(DateRange {
                start: date(2024, 6, 1),
                end: date(2024, 6, 30),
            })
        );
        assert_eq!(criteria.effective_metric_type(), MetricType::Total);
    }

    #[test]
    fn test_explicit_from_and_to() {
        let criteria = stats_filters(&["--from", "2024-01-01", "--to", "2024-01-31"])
            .criteria(30, today())
            .unwrap();
        assert_eq!(
            criteria.date_range,
            Some(DateRange {
                start: date(2024, 1, 1),
                end: date(2024, 1, 31),
            })
        );
    }

    #[test]
    fn test_open_ended_from() {
        let criteria = stats_filters(&["--from", "2024-05-01"]).criteria(30, today()).unwrap();
        assert_eq!(
            criteria.date_range,
            Some(DateRange {
                start: date(2024, 5, 1),
                end: None,
            })
        );
    }

    #[test]
    fn test_days_window_ends_today() {
        let criteria = stats_filters(&["--days", "7"]).criteria(30, today()).unwrap();
        assert_eq!(
            criteria.date_range,
            Some(DateRange {
                start: date(2024, 6, 24),
                end: date(2024, 6, 30),
            })
        );
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = stats_filters(&["--from", "2024-02-01", "--to", "2024-01-01"])
            .criteria(30, today())
            .unwrap_err();
        assert!(err.to_string().contains("is after end date"));
    }

    #[test]
    fn test_days_conflicts_with_explicit_dates() {
        for dates in [["--to", "2024-01-01"], ["--from", "2024-01-01"]] {
            let argv = ["jobpulse", "stats", "java", "--days", "7"].iter().chain(&dates);
            assert!(Cli::try_parse_from(argv).is_err());
        }
    }

    #[test]
    fn test_zero_days_rejected() {
        assert!(Cli::try_parse_from(["jobpulse", "stats", "java", "--days", "0"]).is_err());
        assert!(Cli::try_parse_from(["jobpulse", "stats", "java", "--days", "1"]).is_ok());
    }

    #[test]
    fn test_city_is_trimmed() {
        let criteria = stats_filters(&["--city", " krakow "]).criteria(30, today()).unwrap();
        assert_eq!(criteria.city.as_deref(), Some("krakow"));

        let err = stats_filters(&["--city", "   "]).criteria(30, today());
        assert!(err.is_err());
    }

    #[test]
    fn test_latest_takes_no_date_flags() {
        for flag in ["--from", "--to", "--days"] {
            let argv = ["jobpulse", "latest", "java", flag, "2024-01-01"];
            assert!(Cli::try_parse_from(argv).is_err(), "{} should be rejected", flag);
        }
    }

    #[test]
    fn test_latest_query_covers_full_history() {
        let argv = ["jobpulse", "latest", "java", "-m", "remote", "-c", "warszawa"];
        let facets = match Cli::try_parse_from(argv).unwrap().command {
            Commands::Latest { facets, .. } => facets,
            _ => panic!("expected the latest command"),
        };
        let criteria = facets.criteria(DateRange::full_history()).unwrap();
        assert_eq!(
            build_filter_query("java", &criteria).endpoint(),
            "/api/stats/java?metricType=REMOTE&city=warszawa&startDate=1970-01-01"
        );
    }

    #[test]
    fn test_chart_category_is_trimmed() {
        match Cli::try_parse_from(["jobpulse", "chart", " java "]).unwrap().command {
            Commands::Chart { category, .. } => assert_eq!(category.as_deref(), Some("java")),
            _ => panic!("expected the chart command"),
        }
        assert!(Cli::try_parse_from(["jobpulse", "chart", "  "]).is_err());
    }
}
