use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, ListState, Paragraph},
};
use std::collections::HashMap;
use std::io::stdout;
use strum::IntoEnumIterator;

use crate::api::JobMarketSource;
use crate::colors::resolve_color;
use crate::dashboard::load_category;
use crate::filter::build_filter_query;
use crate::models::{Category, CategoryStats, FilterCriteria, MetricType, SeriesPoint};
use crate::series::{shape_series, LabelFormat};

struct AppState {
    categories: Vec<Category>,
    selected: usize,
    criteria: FilterCriteria,
    label_format: LabelFormat,
    // keyed by query cache key; errors are kept so a failing category is not refetched
    loaded: HashMap<String, Result<CategoryStats, String>>,
}

impl AppState {
    fn new(categories: Vec<Category>, selected: usize, criteria: FilterCriteria, label_format: LabelFormat) -> Self {
        Self {
            categories,
            selected,
            criteria,
            label_format,
            loaded: HashMap::new(),
        }
    }

    fn current_category(&self) -> Option<&Category> {
        self.categories.get(self.selected)
    }

    fn current_key(&self) -> Option<String> {
        self.current_category()
            .map(|c| build_filter_query(&c.slug, &self.criteria).cache_key())
    }

    fn ensure_loaded(&mut self, source: &dyn JobMarketSource) {
        let Some(key) = self.current_key() else { return };
        if self.loaded.contains_key(&key) {
            return;
        }
        let Some(slug) = self.current_category().map(|c| c.slug.clone()) else { return };
        let result = load_category(source, &slug, &self.criteria).map_err(|e| format!("{:#}", e));
        if let Err(e) = &result {
            log::warn!("Chart load failed for '{}': {}", slug, e);
        }
        self.loaded.insert(key, result);
    }

    fn current_stats(&self) -> Option<&Result<CategoryStats, String>> {
        self.current_key().and_then(|key| self.loaded.get(&key))
    }

    fn next(&mut self) {
        if !self.categories.is_empty() && self.selected < self.categories.len() - 1 {
            self.selected += 1;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
        }
    }

    fn cycle_metric(&mut self) {
        let current = self.criteria.effective_metric_type();
        let next = MetricType::iter()
            .cycle()
            .skip_while(|m| *m != current)
            .nth(1)
            .unwrap_or_default();
        self.criteria.metric_type = Some(next);
    }
}

pub fn run_chart(
    source: &dyn JobMarketSource,
    categories: Vec<Category>,
    initial: Option<&str>,
    criteria: FilterCriteria,
    label_format: LabelFormat,
) -> Result<()> {
    if categories.is_empty() {
        println!("No categories found.");
        return Ok(());
    }

    let selected = initial
        .and_then(|slug| categories.iter().position(|c| c.slug == slug))
        .unwrap_or(0);
    let mut state = AppState::new(categories, selected, criteria, label_format);
    state.ensure_loaded(source);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, source);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    source: &dyn JobMarketSource,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('m') => state.cycle_metric(),
                KeyCode::Char('r') => {
                    if let Some(key) = state.current_key() {
                        state.loaded.remove(&key);
                    }
                }
                _ => {}
            }
            list_state.select(Some(state.selected));
            state.ensure_loaded(source);
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
        .split(rows[0]);

    // Left panel: categories
    let items: Vec<ListItem> = state
        .categories
        .iter()
        .map(|c| {
            let (r, g, b) = resolve_color(&c.slug).primary_rgb();
            ListItem::new(Line::from(vec![
                Span::styled("● ", Style::default().fg(Color::Rgb(r, g, b))),
                Span::raw(c.name.clone()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Categories ({}) ", state.categories.len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: summary line + chart
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(chunks[1]);

    let metric = state.criteria.effective_metric_type();
    match state.current_stats() {
        Some(Ok(stats)) if stats.has_data() => {
            let summary = Paragraph::new(build_summary(stats))
                .block(Block::default().borders(Borders::ALL).title(format!(" {} ", metric)));
            frame.render_widget(summary, right[0]);

            let series = shape_series(stats, &state.label_format);
            draw_series(frame, right[1], &stats.category, &series);
        }
        Some(Ok(_)) => {
            render_message(frame, chunks[1], "No trend data available yet", Color::DarkGray);
        }
        Some(Err(e)) => {
            render_message(frame, chunks[1], &format!("Failed to load: {}", e), Color::Red);
        }
        None => {
            render_message(frame, chunks[1], "Loading...", Color::DarkGray);
        }
    }

    let help = Paragraph::new(" j/k:category  m:metric  r:reload  q:quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[1]);
}

fn render_message(frame: &mut Frame, area: Rect, message: &str, color: Color) {
    let widget = Paragraph::new(Span::styled(message.to_string(), Style::default().fg(color)))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn build_summary(stats: &CategoryStats) -> Line<'static> {
    let trend_color = if stats.change_percent > 0.0 {
        Color::Green
    } else if stats.change_percent < 0.0 {
        Color::Red
    } else {
        Color::Gray
    };

    let mut spans = vec![
        Span::styled(
            format!("{} jobs ", stats.latest_count),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} {} ", stats.trend(), stats.format_change()),
            Style::default().fg(trend_color),
        ),
        Span::raw(format!("| {} points", stats.records.len())),
    ];
    if let Some(range) = stats.count_range() {
        spans.push(Span::raw(format!(
            " | min {} max {} avg {:.0}",
            range.min, range.max, range.average
        )));
    }
    Line::from(spans)
}

fn draw_series(frame: &mut Frame, area: Rect, category: &str, series: &[SeriesPoint]) {
    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, p.value as f64))
        .collect();

    let min = series.iter().map(|p| p.value).min().unwrap_or(0) as f64;
    let max = series.iter().map(|p| p.value).max().unwrap_or(0) as f64;
    let pad = ((max - min) * 0.1).max(1.0);
    let (y_lo, y_hi) = ((min - pad).max(0.0), max + pad);

    let x_labels: Vec<String> = match series {
        [] => Vec::new(),
        [only] => vec![only.label.clone()],
        [first, .., last] => vec![first.label.clone(), last.label.clone()],
    };

    let (r, g, b) = resolve_color(category).primary_rgb();
    let dataset = Dataset::default()
        .name(category.to_string())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Rgb(r, g, b)))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(Block::default().borders(Borders::ALL).title(" Job Count Trends "))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, (points.len().max(2) - 1) as f64])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([y_lo, y_hi])
                .labels(vec![format!("{:.0}", y_lo), format!("{:.0}", y_hi)]),
        );

    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<Category> {
        ["java", "python"]
            .iter()
            .enumerate()
            .map(|(i, slug)| Category {
                id: i as i64 + 1,
                name: slug.to_string(),
                slug: slug.to_string(),
                active: true,
            })
            .collect()
    }

    #[test]
    fn test_navigation_stays_in_bounds() {
        let mut state = AppState::new(categories(), 0, FilterCriteria::default(), LabelFormat::default());
        state.prev();
        assert_eq!(state.selected, 0);
        state.next();
        state.next();
        assert_eq!(state.selected, 1);
        assert_eq!(state.current_category().unwrap().slug, "python");
    }

    #[test]
    fn test_cycle_metric_wraps() {
        let mut state = AppState::new(categories(), 0, FilterCriteria::default(), LabelFormat::default());
        let seen: Vec<MetricType> = (0..4)
            .map(|_| {
                state.cycle_metric();
                state.criteria.effective_metric_type()
            })
            .collect();
        assert_eq!(
            seen,
            vec![
                MetricType::WithSalary,
                MetricType::Remote,
                MetricType::RemoteWithSalary,
                MetricType::Total,
            ]
        );
    }

    #[test]
    fn test_metric_change_changes_cache_key() {
        let mut state = AppState::new(categories(), 0, FilterCriteria::default(), LabelFormat::default());
        let before = state.current_key().unwrap();
        state.cycle_metric();
        assert_ne!(state.current_key().unwrap(), before);
    }
}
