use std::fmt;

use climatology::{DayReport, Metric, MetricAverages, MetricReport, WindowComparison};

fn degrees(value: Option<f64>) -> String {
    match value {
        Some(value) => format!("{value:.2}"),
        None => String::from("--"),
    }
}

fn triple(averages: &MetricAverages) -> String {
    format!(
        "{} / {} / {}℃",
        degrees(averages.high),
        degrees(averages.mean),
        degrees(averages.low)
    )
}

fn card(f: &mut fmt::Formatter<'_>, metric: Metric, report: Option<&MetricReport>) -> fmt::Result {
    let Some(report) = report else {
        return writeln!(f, "{:<5} no reading", metric.name());
    };
    let result = &report.result;
    writeln!(
        f,
        "{:<5} {:>6.1}℃  top {:.1}% ({} of {})",
        metric.name(),
        result.target_value,
        result.percentile,
        result.rank,
        result.cohort_size
    )?;
    writeln!(
        f,
        "      record {:.1}℃ on {} ({:+.1}℃)",
        result.extreme.value,
        result.extreme.date,
        result.delta()
    )
}

fn listing(f: &mut fmt::Formatter<'_>, title: &str, report: Option<&MetricReport>) -> fmt::Result {
    let Some(report) = report else {
        return Ok(());
    };
    writeln!(f, "{title} {} days", report.top.len())?;
    for (position, entry) in report.top.iter().enumerate() {
        writeln!(f, "  {}. {}  {:.1}℃", position + 1, entry.date, entry.value)?;
    }
    Ok(())
}

/// Text rendering of a single-day comparison.
pub struct DayText<'a>(pub &'a DayReport);

impl fmt::Display for DayText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(
            f,
            "{} compared with {} years of the same day",
            report.target.date, report.cohort_size
        )?;
        for metric in Metric::ALL {
            card(f, metric, report.get(metric))?;
        }
        writeln!(f)?;
        listing(f, "Hottest", report.high.as_ref())?;
        listing(f, "Coldest", report.low.as_ref())
    }
}

/// Text rendering of a window comparison.
pub struct WindowText<'a>(pub &'a WindowComparison);

impl fmt::Display for WindowText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let comparison = self.0;
        let last = comparison.end_date.previous_day().unwrap_or(comparison.end_date);
        writeln!(
            f,
            "Last {} days ({} to {}, {} records)",
            comparison.window_length,
            comparison.start_date(),
            last,
            comparison.actual_records
        )?;
        writeln!(f, "  actual   high/mean/low: {}", triple(&comparison.actual))?;
        writeln!(
            f,
            "  history  high/mean/low: {}",
            triple(&comparison.historical_average())
        )?;
        writeln!(
            f,
            "  top {:.1}% of the same period (warmer than {} of {} years)",
            comparison.top_percent(),
            comparison.years_below,
            comparison.ranked_years
        )?;
        for point in &comparison.overlay {
            writeln!(
                f,
                "    {}  high {:>6} (avg {:>6})  low {:>6} (avg {:>6})",
                point.date,
                degrees(point.high.map(f64::from)),
                degrees(point.historical_high),
                degrees(point.low.map(f64::from)),
                degrees(point.historical_low),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use climatology::{compare_day, compare_window, DayQuery, RawRow, RecordStore};
    use time::macros::date;

    use super::*;

    fn store() -> RecordStore {
        RecordStore::load(vec![
            RawRow::new("2021-01-14", Some(3.), Some(1.), Some(-1.)),
            RawRow::new("2021-01-15", Some(3.), Some(1.), Some(-1.)),
            RawRow::new("2022-01-14", Some(4.), Some(2.), Some(-2.)),
            RawRow::new("2022-01-15", Some(4.), None, Some(-2.)),
        ])
        .unwrap()
    }

    #[test]
    fn day_text_marks_missing_readings() {
        let store = store();
        let report = compare_day(&store, &DayQuery::new(date!(2022 - 01 - 15))).unwrap();
        let text = DayText(&report).to_string();

        assert!(text.starts_with("2022-01-15 compared with 2 years of the same day\n"));
        assert!(text.contains("mean  no reading\n"));
        assert!(text.contains("Hottest 2 days\n  1. 2022-01-15  4.0℃\n"));
        assert!(text.contains("Coldest 2 days\n"));
    }

    #[test]
    fn window_text_reports_top_share() {
        let store = store();
        let comparison = compare_window(date!(2022 - 01 - 15), 1, &store).unwrap();
        let text = WindowText(&comparison).to_string();

        assert!(text.starts_with("Last 1 days (2022-01-14 to 2022-01-14, 1 records)\n"));
        assert!(text.contains("top 50.0% of the same period (warmer than 1 of 2 years)\n"));
    }
}
