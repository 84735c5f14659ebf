use crate::db::repository;
use crate::error::Result;
use crate::format::format_currency;
use crate::models::donation::{DonationRecord, ZakatType};
use crate::models::report::{
    CategoryAmounts, DateRange, Granularity, LabelLocale, PeriodKey, PeriodSummary,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Modifier, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use std::io;

/// Groups donations into period buckets and sums them per category, newest bucket first.
///
/// Records outside the inclusive `start_date..=end_date` calendar bounds are skipped before
/// bucketing. Never fails; empty input yields an empty list.
pub fn aggregate(
    records: &[DonationRecord],
    granularity: Granularity,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Vec<PeriodSummary> {
    aggregate_with_locale(
        records,
        granularity,
        DateRange::new(start_date, end_date),
        LabelLocale::English,
    )
}

pub fn aggregate_with_locale(
    records: &[DonationRecord],
    granularity: Granularity,
    range: DateRange,
    locale: LabelLocale,
) -> Vec<PeriodSummary> {
    let buckets = records
        .iter()
        .filter(|record| range.contains(record.date.date()))
        .fold(BTreeMap::new(), |mut buckets, record| {
            let key = period_key(record.date, granularity);
            let summary = buckets.entry(key).or_insert_with(|| PeriodSummary {
                key,
                period_label: period_label(key, locale),
                amount_by_category: CategoryAmounts::default(),
                total: Decimal::ZERO,
                transaction_count: 0,
            });
            summary.amount_by_category.add(record.category, record.amount);
            summary.total += record.amount;
            summary.transaction_count += 1;
            buckets
        });

    tracing::debug!(
        records = records.len(),
        buckets = buckets.len(),
        ?granularity,
        "aggregated donations"
    );

    buckets.into_values().rev().collect()
}

pub fn period_key(date: NaiveDateTime, granularity: Granularity) -> PeriodKey {
    let year = date.year();
    match granularity {
        Granularity::Daily => PeriodKey::Day {
            year,
            month: date.month(),
            day: date.day(),
        },
        Granularity::Weekly => PeriodKey::Week {
            year,
            week: week_of_year(date.date()),
        },
        Granularity::Monthly => PeriodKey::Month {
            year,
            month: date.month(),
        },
        Granularity::Yearly => PeriodKey::Year { year },
    }
}

/// Sunday-started week count: `ceil((days_since_jan1 + jan1_weekday + 1) / 7)`.
///
/// Not ISO-8601; week 1 is whatever partial week holds January 1st.
pub fn week_of_year(date: NaiveDate) -> u32 {
    let jan1_weekday = NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .map(|jan1| jan1.weekday().num_days_from_sunday())
        .unwrap_or(0);
    (date.ordinal0() + jan1_weekday + 1).div_ceil(7)
}

pub fn period_label(key: PeriodKey, locale: LabelLocale) -> String {
    match key {
        PeriodKey::Day { year, month, day } => {
            format!("{:02} {} {}", day, locale.month_name(month), year)
        }
        PeriodKey::Week { year, week } => format!("{} {} {}", locale.week_word(), week, year),
        PeriodKey::Month { year, month } => format!("{} {}", locale.month_name(month), year),
        PeriodKey::Year { year } => year.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTotals {
    pub grand_total: Decimal,
    pub transaction_count: usize,
    pub average_per_transaction: Decimal,
    pub by_category: CategoryAmounts,
    pub active_periods: usize,
}

impl ReportTotals {
    pub fn from_summaries(summaries: &[PeriodSummary]) -> Self {
        let mut by_category = CategoryAmounts::default();
        for summary in summaries {
            for (category, amount) in summary.amount_by_category.iter() {
                by_category.add(category, amount);
            }
        }
        let grand_total = summaries.iter().map(|s| s.total).sum::<Decimal>();
        let transaction_count = summaries.iter().map(|s| s.transaction_count).sum::<usize>();
        let average_per_transaction = if transaction_count > 0 {
            (grand_total / Decimal::from(transaction_count)).round_dp(2)
        } else {
            Decimal::ZERO
        };

        Self {
            grand_total,
            transaction_count,
            average_per_transaction,
            by_category,
            active_periods: summaries.len(),
        }
    }

    /// Percentage share per category; zero-valued categories are left out.
    pub fn category_shares(&self) -> Vec<(ZakatType, Decimal, f64)> {
        if self.grand_total <= Decimal::ZERO {
            return Vec::new();
        }
        let total = self.grand_total.to_f64().unwrap_or(0.0);
        self.by_category
            .iter()
            .filter(|(_, amount)| *amount > Decimal::ZERO)
            .map(|(category, amount)| {
                let pct = amount.to_f64().unwrap_or(0.0) / total * 100.0;
                (category, amount, pct)
            })
            .collect()
    }
}

pub fn render_report_text(summaries: &[PeriodSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<22} {:>16} {:>16} {:>16} {:>16} {:>18} {:>6}\n",
        "Period", "Fitrah", "Mal", "Infak", "Other", "Total", "Count"
    ));
    for summary in summaries {
        let amounts = &summary.amount_by_category;
        out.push_str(&format!(
            "{:<22} {:>16} {:>16} {:>16} {:>16} {:>18} {:>6}\n",
            summary.period_label,
            format_currency(amounts.fitrah),
            format_currency(amounts.mal),
            format_currency(amounts.infak),
            format_currency(amounts.other),
            format_currency(summary.total),
            summary.transaction_count
        ));
    }

    let totals = ReportTotals::from_summaries(summaries);
    out.push_str(&format!(
        "\nTotal: {}  Donations: {}  Average: {}  Periods: {}\n",
        format_currency(totals.grand_total),
        totals.transaction_count,
        format_currency(totals.average_per_transaction),
        totals.active_periods
    ));
    for (category, amount, pct) in totals.category_shares() {
        out.push_str(&format!(
            "  {:<8} {:>18} {:>6.1}%\n",
            category.label(),
            format_currency(amount),
            pct
        ));
    }
    out
}

pub fn load_report(
    conn: &Connection,
    granularity: Granularity,
    range: DateRange,
    locale: LabelLocale,
) -> Result<Vec<PeriodSummary>> {
    let donations = repository::get_donations_in_range(conn, range.start, range.end)?;
    Ok(aggregate_with_locale(&donations, granularity, range, locale))
}

pub fn run_report(
    conn: &Connection,
    granularity: Granularity,
    range: DateRange,
    locale: LabelLocale,
) -> Result<()> {
    let summaries = load_report(conn, granularity, range, locale)?;
    let title = report_title(granularity, range);
    tracing::info!(periods = summaries.len(), "rendering report");
    render_report(&title, &summaries)
}

fn report_title(granularity: Granularity, range: DateRange) -> String {
    let bound = |d: Option<NaiveDate>| {
        d.map(|d| d.format("%d.%m.%Y").to_string())
            .unwrap_or_else(|| "…".to_string())
    };
    format!(
        "{:?} report {} - {}",
        granularity,
        bound(range.start),
        bound(range.end)
    )
}

fn category_color(category: ZakatType) -> Color {
    match category {
        ZakatType::Fitrah => Color::Blue,
        ZakatType::Mal => Color::Green,
        ZakatType::Infak => Color::Yellow,
        ZakatType::Other => Color::Red,
    }
}

fn render_report(title: &str, summaries: &[PeriodSummary]) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let result = (|| -> Result<()> {
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)?;
        let totals = ReportTotals::from_summaries(summaries);

        loop {
            terminal.draw(|frame| {
                let layout = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(3),
                        Constraint::Percentage(45),
                        Constraint::Min(5),
                    ])
                    .split(frame.area());

                render_totals(frame, layout[0], title, &totals);
                render_bar_chart(frame, layout[1], summaries);
                render_period_table(frame, layout[2], summaries);
            })?;

            if event::poll(std::time::Duration::from_millis(250))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Release => {}
                    Event::Key(key) if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) => {
                        break;
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    })();

    disable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen)?;

    result
}

fn render_totals(frame: &mut ratatui::Frame, area: Rect, title: &str, totals: &ReportTotals) {
    let line = Line::from(vec![
        Span::styled(
            format!("{}  (press q to exit)", title),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::raw(format!("Total: {}", format_currency(totals.grand_total))),
        Span::raw("  |  "),
        Span::raw(format!("Donations: {}", totals.transaction_count)),
        Span::raw("  |  "),
        Span::raw(format!(
            "Average: {}",
            format_currency(totals.average_per_transaction)
        )),
        Span::raw("  |  "),
        Span::raw(format!("Periods: {}", totals.active_periods)),
    ]);
    frame.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn render_bar_chart(frame: &mut ratatui::Frame, area: Rect, summaries: &[PeriodSummary]) {
    let block = Block::default()
        .title("Donations per period")
        .borders(Borders::ALL);
    let chart_area = block.inner(area);
    frame.render_widget(block, area);

    let bar_height = chart_area.height.saturating_sub(1) as usize;
    if bar_height == 0 || summaries.is_empty() {
        return;
    }

    // Oldest on the left.
    let periods: Vec<&PeriodSummary> = summaries.iter().rev().collect();
    let bucket_width = std::cmp::max(1, chart_area.width as usize / periods.len());

    let max_total = periods
        .iter()
        .map(|s| s.total.to_f64().unwrap_or(0.0))
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let mut lines: Vec<Line> = Vec::new();
    for row in 0..bar_height {
        let level = bar_height - row;
        let mut spans: Vec<Span> = Vec::new();

        for summary in &periods {
            let total = summary.total.to_f64().unwrap_or(0.0);
            let scaled_height = (total / max_total * bar_height as f64).ceil() as usize;
            if total <= 0.0 || level > scaled_height {
                spans.push(Span::raw(" ".repeat(bucket_width)));
                continue;
            }

            let mut stacked = 0usize;
            let mut color = Color::DarkGray;
            for (category, height) in
                compute_category_heights(&summary.amount_by_category, total, scaled_height)
            {
                stacked += height;
                if level <= stacked {
                    color = category_color(category);
                    break;
                }
            }
            let bar = if bucket_width > 1 {
                format!("{} ", "█".repeat(bucket_width - 1))
            } else {
                "█".to_string()
            };
            spans.push(Span::styled(bar, Style::default().fg(color)));
        }
        lines.push(Line::from(spans));
    }

    let mut labels = String::new();
    for summary in &periods {
        let mut label: String = summary
            .period_label
            .chars()
            .take(bucket_width.saturating_sub(1))
            .collect();
        while label.chars().count() < bucket_width {
            label.push(' ');
        }
        labels.push_str(&label);
    }
    lines.push(Line::from(labels));

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), chart_area);
}

/// Splits a bar of `bar_height` rows between categories, largest remainders first.
fn compute_category_heights(
    amounts: &CategoryAmounts,
    bucket_total: f64,
    bar_height: usize,
) -> Vec<(ZakatType, usize)> {
    if bucket_total <= 0.0 {
        return amounts.iter().map(|(c, _)| (c, 0)).collect();
    }

    let mut heights: Vec<(ZakatType, usize, f64)> = amounts
        .iter()
        .map(|(category, amount)| {
            let exact = amount.to_f64().unwrap_or(0.0) / bucket_total * bar_height as f64;
            let floor = exact.floor() as usize;
            (category, floor, exact - floor as f64)
        })
        .collect();

    let used: usize = heights.iter().map(|(_, h, _)| *h).sum();
    let mut remaining = bar_height.saturating_sub(used);
    let mut by_remainder: Vec<usize> = (0..heights.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        heights[b]
            .2
            .partial_cmp(&heights[a].2)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for idx in by_remainder {
        if remaining == 0 {
            break;
        }
        if heights[idx].2 > 0.0 {
            heights[idx].1 += 1;
            remaining -= 1;
        }
    }

    heights.into_iter().map(|(c, h, _)| (c, h)).collect()
}

fn render_period_table(frame: &mut ratatui::Frame, area: Rect, summaries: &[PeriodSummary]) {
    let block = Block::default().title("Report detail").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if summaries.is_empty() {
        frame.render_widget(
            Paragraph::new("No donations in this range").alignment(Alignment::Center),
            inner,
        );
        return;
    }

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let header = Row::new([
        Cell::from("Period").style(bold),
        Cell::from("Fitrah").style(bold.fg(category_color(ZakatType::Fitrah))),
        Cell::from("Mal").style(bold.fg(category_color(ZakatType::Mal))),
        Cell::from("Infak").style(bold.fg(category_color(ZakatType::Infak))),
        Cell::from("Other").style(bold.fg(category_color(ZakatType::Other))),
        Cell::from("Total").style(bold),
        Cell::from("Count").style(bold),
    ]);

    let rows = summaries.iter().map(|summary| {
        let amounts = &summary.amount_by_category;
        Row::new([
            Cell::from(summary.period_label.clone()),
            Cell::from(format_currency(amounts.fitrah)),
            Cell::from(format_currency(amounts.mal)),
            Cell::from(format_currency(amounts.infak)),
            Cell::from(format_currency(amounts.other)),
            Cell::from(format_currency(summary.total)).style(Style::default().fg(Color::Green)),
            Cell::from(summary.transaction_count.to_string()),
        ])
    });

    let widths = [
        Constraint::Length(20),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(18),
        Constraint::Length(6),
    ];

    frame.render_widget(Table::new(rows, widths).header(header).column_spacing(1), inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(id: &str, amount: i64, date: (i32, u32, u32), category: ZakatType) -> DonationRecord {
        DonationRecord::new(
            id.to_string(),
            NaiveDate::from_ymd_opt(date.0, date.1, date.2)
                .unwrap()
                .and_hms_opt(9, 15, 0)
                .unwrap(),
            "Donor".to_string(),
            "Recipient".to_string(),
            Decimal::new(amount, 0),
            category,
        )
    }

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn mixed_records() -> Vec<DonationRecord> {
        vec![
            record("1", 100, (2022, 3, 14), ZakatType::Fitrah),
            record("2", 250, (2023, 1, 1), ZakatType::Mal),
            record("3", 75, (2023, 1, 1), ZakatType::Infak),
            record("4", 40, (2023, 7, 20), ZakatType::Other),
            record("5", 500, (2024, 1, 5), ZakatType::Mal),
            record("6", 60, (2024, 1, 20), ZakatType::Fitrah),
            record("7", 90, (2024, 2, 10), ZakatType::Infak),
            record("8", 10, (2024, 3, 3), ZakatType::from_raw("zzz")),
            record("9", 33, (2024, 12, 31), ZakatType::Fitrah),
        ]
    }

    const ALL_GRANULARITIES: [Granularity; 4] = [
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
        Granularity::Yearly,
    ];

    #[test]
    fn test_single_month_scenario() {
        let records = vec![
            record("a", 100, (2024, 1, 5), ZakatType::Fitrah),
            record("b", 50, (2024, 1, 20), ZakatType::Mal),
        ];

        let result = aggregate(&records, Granularity::Monthly, None, None);

        assert_eq!(result.len(), 1);
        let summary = &result[0];
        assert_eq!(summary.period_label, "January 2024");
        assert_eq!(summary.amount_by_category.fitrah, Decimal::new(100, 0));
        assert_eq!(summary.amount_by_category.mal, Decimal::new(50, 0));
        assert_eq!(summary.amount_by_category.infak, Decimal::ZERO);
        assert_eq!(summary.amount_by_category.other, Decimal::ZERO);
        assert_eq!(summary.total, Decimal::new(150, 0));
        assert_eq!(summary.transaction_count, 2);
    }

    #[test]
    fn test_months_ordered_newest_first() {
        let records = vec![
            record("a", 200, (2024, 1, 10), ZakatType::Fitrah),
            record("b", 300, (2024, 2, 10), ZakatType::Fitrah),
        ];

        let result = aggregate(&records, Granularity::Monthly, None, None);

        let rows: Vec<(&str, Decimal, usize)> = result
            .iter()
            .map(|s| (s.period_label.as_str(), s.total, s.transaction_count))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("February 2024", Decimal::new(300, 0), 1),
                ("January 2024", Decimal::new(200, 0), 1),
            ]
        );
    }

    #[test]
    fn test_empty_input_gives_empty_report() {
        for granularity in ALL_GRANULARITIES {
            assert!(aggregate(&[], granularity, None, None).is_empty());
        }
    }

    #[test]
    fn test_unknown_category_lands_in_other() {
        let records = vec![record("a", 70, (2024, 5, 5), ZakatType::from_raw("zzz"))];
        let result = aggregate(&records, Granularity::Daily, None, None);
        assert_eq!(result[0].amount_by_category.other, Decimal::new(70, 0));
        assert_eq!(result[0].total, Decimal::new(70, 0));
    }

    #[test]
    fn test_yearly_buckets_descend() {
        let result = aggregate(&mixed_records(), Granularity::Yearly, None, None);
        let labels: Vec<&str> = result.iter().map(|s| s.period_label.as_str()).collect();
        assert_eq!(labels, vec!["2024", "2023", "2022"]);
    }

    #[test]
    fn test_date_bounds_keep_only_february() {
        let records = vec![
            record("a", 200, (2024, 1, 10), ZakatType::Fitrah),
            record("b", 300, (2024, 2, 10), ZakatType::Mal),
            record("c", 10, (2024, 2, 29), ZakatType::Mal),
        ];

        let result = aggregate(
            &records,
            Granularity::Monthly,
            Some(ymd(2024, 2, 1)),
            Some(ymd(2024, 2, 29)),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].period_label, "February 2024");
        assert_eq!(result[0].total, Decimal::new(310, 0));
        assert_eq!(result[0].transaction_count, 2);
    }

    #[test]
    fn test_conservation_across_granularities() {
        let records = mixed_records();
        let expected: Decimal = records.iter().map(|r| r.amount).sum();
        for granularity in ALL_GRANULARITIES {
            let result = aggregate(&records, granularity, None, None);
            let total: Decimal = result.iter().map(|s| s.total).sum();
            let count: usize = result.iter().map(|s| s.transaction_count).sum();
            assert_eq!(total, expected, "{:?}", granularity);
            assert_eq!(count, records.len(), "{:?}", granularity);
        }
    }

    #[test]
    fn test_category_partition_and_no_empty_buckets() {
        for granularity in ALL_GRANULARITIES {
            for summary in aggregate(&mixed_records(), granularity, None, None) {
                assert_eq!(summary.total, summary.amount_by_category.sum());
                assert!(summary.transaction_count >= 1);
            }
        }
    }

    #[test]
    fn test_reaggregation_is_idempotent() {
        let records = mixed_records();
        for granularity in ALL_GRANULARITIES {
            let first = aggregate(&records, granularity, Some(ymd(2023, 1, 1)), None);
            let second = aggregate(&records, granularity, Some(ymd(2023, 1, 1)), None);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_coarser_granularity_never_has_more_buckets() {
        let records = mixed_records();
        let yearly = aggregate(&records, Granularity::Yearly, None, None).len();
        let monthly = aggregate(&records, Granularity::Monthly, None, None).len();
        let daily = aggregate(&records, Granularity::Daily, None, None).len();
        assert!(yearly <= monthly);
        assert!(monthly <= daily);
        assert_eq!((yearly, monthly, daily), (3, 7, 8));
    }

    #[test]
    fn test_filtered_keys_subset_of_unfiltered() {
        let records = mixed_records();
        let bounds = [
            (Some(ymd(2023, 1, 1)), Some(ymd(2024, 1, 31))),
            (None, Some(ymd(2023, 6, 30))),
            (Some(ymd(2024, 2, 11)), None),
            (Some(ymd(2030, 1, 1)), None),
        ];
        for granularity in ALL_GRANULARITIES {
            let unfiltered: Vec<PeriodKey> = aggregate(&records, granularity, None, None)
                .iter()
                .map(|s| s.key)
                .collect();
            for (start, end) in bounds {
                for summary in aggregate(&records, granularity, start, end) {
                    assert!(unfiltered.contains(&summary.key));
                }
            }
        }
    }

    #[test]
    fn test_week_numbers_follow_sunday_start() {
        // 2024-01-01 is a Monday.
        assert_eq!(week_of_year(ymd(2024, 1, 1)), 1);
        assert_eq!(week_of_year(ymd(2024, 1, 6)), 1);
        assert_eq!(week_of_year(ymd(2024, 1, 7)), 2);
        assert_eq!(week_of_year(ymd(2024, 12, 31)), 53);
        // 2023-01-01 is a Sunday.
        assert_eq!(week_of_year(ymd(2023, 1, 1)), 1);
        assert_eq!(week_of_year(ymd(2023, 1, 7)), 1);
        assert_eq!(week_of_year(ymd(2023, 1, 8)), 2);
    }

    #[test]
    fn test_weekly_buckets_sort_numerically() {
        let records = vec![
            record("a", 1, (2024, 2, 26), ZakatType::Mal),
            record("b", 2, (2024, 3, 4), ZakatType::Mal),
            record("c", 3, (2024, 1, 2), ZakatType::Mal),
        ];

        let result = aggregate(&records, Granularity::Weekly, None, None);
        let labels: Vec<&str> = result.iter().map(|s| s.period_label.as_str()).collect();
        assert_eq!(labels, vec!["Week 10 2024", "Week 9 2024", "Week 1 2024"]);
    }

    #[test]
    fn test_daily_label_and_indonesian_locale() {
        let records = vec![record("a", 5, (2024, 1, 5), ZakatType::Mal)];

        let english = aggregate(&records, Granularity::Daily, None, None);
        assert_eq!(english[0].period_label, "05 January 2024");

        let range = DateRange::unbounded();
        let daily = aggregate_with_locale(&records, Granularity::Daily, range, LabelLocale::Indonesian);
        let monthly =
            aggregate_with_locale(&records, Granularity::Monthly, range, LabelLocale::Indonesian);
        let weekly =
            aggregate_with_locale(&records, Granularity::Weekly, range, LabelLocale::Indonesian);
        assert_eq!(daily[0].period_label, "05 Januari 2024");
        assert_eq!(monthly[0].period_label, "Januari 2024");
        assert_eq!(weekly[0].period_label, "Minggu 1 2024");
    }

    #[test]
    fn test_report_totals() {
        let summaries = aggregate(&mixed_records(), Granularity::Yearly, None, None);
        let totals = ReportTotals::from_summaries(&summaries);

        assert_eq!(totals.grand_total, Decimal::new(1158, 0));
        assert_eq!(totals.transaction_count, 9);
        assert_eq!(totals.average_per_transaction, Decimal::new(12867, 2));
        assert_eq!(totals.active_periods, 3);
        assert_eq!(totals.by_category.sum(), totals.grand_total);

        let shares = totals.category_shares();
        assert_eq!(shares.len(), 4);
        let pct_sum: f64 = shares.iter().map(|(_, _, pct)| pct).sum();
        assert!((pct_sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_totals_empty() {
        let totals = ReportTotals::from_summaries(&[]);
        assert_eq!(totals.average_per_transaction, Decimal::ZERO);
        assert!(totals.category_shares().is_empty());
    }

    #[test]
    fn test_render_report_text_lists_each_period() {
        let summaries = aggregate(&mixed_records(), Granularity::Yearly, None, None);
        let text = render_report_text(&summaries);
        assert!(text.starts_with("Period"));
        assert!(text.contains("2022"));
        assert!(text.contains("Rp 1.158"));
        assert_eq!(text.lines().filter(|l| l.starts_with("202")).count(), 3);
    }

    #[test]
    fn test_render_report_text_prints_each_share_once() {
        let records = vec![
            record("a", 300, (2024, 4, 2), ZakatType::Fitrah),
            record("b", 100, (2024, 4, 9), ZakatType::Mal),
        ];
        let text = render_report_text(&aggregate(&records, Granularity::Monthly, None, None));

        let share_lines: Vec<&str> = text.lines().filter(|l| l.ends_with('%')).collect();
        assert_eq!(share_lines.len(), 2);
        assert_eq!(share_lines.iter().filter(|l| l.contains("Fitrah")).count(), 1);
        assert_eq!(share_lines.iter().filter(|l| l.contains("Mal")).count(), 1);
        assert!(share_lines[0].contains("75.0%"));
        assert!(share_lines[1].contains("25.0%"));
    }

    #[test]
    fn test_category_heights_fill_bar() {
        let mut amounts = CategoryAmounts::default();
        amounts.add(ZakatType::Fitrah, Decimal::new(1, 0));
        amounts.add(ZakatType::Mal, Decimal::new(1, 0));
        amounts.add(ZakatType::Infak, Decimal::new(1, 0));

        let heights = compute_category_heights(&amounts, 3.0, 10);
        let used: usize = heights.iter().map(|(_, h)| h).sum();
        assert_eq!(used, 10);
        assert_eq!(heights.iter().find(|(c, _)| *c == ZakatType::Other).unwrap().1, 0);
    }

    #[test]
    fn test_load_report_reads_range_from_db() {
        let conn = crate::db::connection::establish_test_connection().unwrap();
        for r in mixed_records() {
            repository::add_donation(&conn, &r).unwrap();
        }

        let range = DateRange::new(Some(ymd(2024, 1, 1)), Some(ymd(2024, 2, 29)));
        let summaries = load_report(&conn, Granularity::Monthly, range, LabelLocale::English).unwrap();
        let labels: Vec<&str> = summaries.iter().map(|s| s.period_label.as_str()).collect();
        assert_eq!(labels, vec!["February 2024", "January 2024"]);
    }

    fn arb_record() -> impl Strategy<Value = DonationRecord> {
        (2020i32..2027, 0u32..366, 1i64..100_000_000, 0usize..4).prop_map(
            |(year, day, cents, category)| {
                let date = NaiveDate::from_yo_opt(year, day + 1)
                    .unwrap_or_else(|| NaiveDate::from_yo_opt(year, 365).unwrap());
                DonationRecord::new(
                    format!("{}-{}-{}", year, day, cents),
                    date.and_hms_opt(12, 0, 0).unwrap(),
                    "Donor".to_string(),
                    "Recipient".to_string(),
                    Decimal::new(cents, 2),
                    ZakatType::ALL[category],
                )
            },
        )
    }

    fn arb_granularity() -> impl Strategy<Value = Granularity> {
        prop_oneof![
            Just(Granularity::Daily),
            Just(Granularity::Weekly),
            Just(Granularity::Monthly),
            Just(Granularity::Yearly),
        ]
    }

    proptest! {
        #[test]
        fn prop_totals_are_conserved_and_partitioned(
            records in proptest::collection::vec(arb_record(), 0..60),
            granularity in arb_granularity(),
        ) {
            let result = aggregate(&records, granularity, None, None);

            let expected: Decimal = records.iter().map(|r| r.amount).sum();
            let total: Decimal = result.iter().map(|s| s.total).sum();
            let count: usize = result.iter().map(|s| s.transaction_count).sum();
            prop_assert_eq!(total, expected);
            prop_assert_eq!(count, records.len());

            for summary in &result {
                prop_assert_eq!(summary.total, summary.amount_by_category.sum());
                prop_assert!(summary.transaction_count >= 1);
            }
            for pair in result.windows(2) {
                prop_assert!(pair[0].key > pair[1].key);
            }
        }

        #[test]
        fn prop_date_filter_only_narrows(
            records in proptest::collection::vec(arb_record(), 0..40),
            granularity in arb_granularity(),
            start_day in 0u32..2500,
            span in 0u32..800,
        ) {
            let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
            let start = base + chrono::Days::new(start_day as u64);
            let end = start + chrono::Days::new(span as u64);

            let unfiltered: Vec<PeriodKey> =
                aggregate(&records, granularity, None, None).iter().map(|s| s.key).collect();
            let filtered = aggregate(&records, granularity, Some(start), Some(end));

            let kept = records
                .iter()
                .filter(|r| r.date.date() >= start && r.date.date() <= end)
                .count();
            prop_assert_eq!(filtered.iter().map(|s| s.transaction_count).sum::<usize>(), kept);
            for summary in &filtered {
                prop_assert!(unfiltered.contains(&summary.key));
            }
        }
    }
}
