use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};
use tracing::debug;

use crate::{
    error::QueryError,
    record::{DailyRecord, Metric, MonthDay},
    store::RecordStore,
};

/// How a year's baseline records are picked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaselineRule {
    /// Every record of the year whose month-day is in the offset set. A
    /// window crossing new year pools early January and late December of the
    /// same year.
    #[default]
    MonthDay,
    /// The actual window's date range moved by whole years, labelled with the
    /// year of its end.
    ShiftedRange,
}

/// Distinct month-days in a year, Feb 29 included.
const MONTH_DAYS: usize = 366;

/// Longest accepted window, ten thousand leap years.
pub const MAX_WINDOW: usize = MONTH_DAYS * 10_000;

/// The month-days of the `length` days before `end`, most recent first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OffsetSet(Vec<MonthDay>);

impl OffsetSet {
    pub fn new(end: Date, length: usize) -> Result<Self, QueryError> {
        if length == 0 || length > MAX_WINDOW {
            return Err(QueryError::InvalidWindow);
        }
        let span = i64::try_from(length).map_err(|_| QueryError::InvalidWindow)?;
        let mut days = Vec::with_capacity(length.min(MONTH_DAYS));
        for offset in 1..=span {
            if days.len() == MONTH_DAYS {
                break;
            }
            let Some(date) = end.checked_sub(Duration::days(offset)) else {
                break;
            };
            let key = MonthDay::of(date);
            // a window longer than a year wraps onto itself
            if !days.contains(&key) {
                days.push(key);
            }
        }
        Ok(Self(days))
    }

    pub fn contains(&self, key: MonthDay) -> bool {
        self.0.contains(&key)
    }

    pub fn days(&self) -> &[MonthDay] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Skip-missing averages of the three readings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricAverages {
    pub high: Option<f64>,
    pub mean: Option<f64>,
    pub low: Option<f64>,
}

impl MetricAverages {
    pub fn of<'a>(records: impl IntoIterator<Item = &'a DailyRecord>) -> Self {
        let mut sums = [(0f64, 0usize); 3];
        for record in records {
            for (slot, metric) in sums.iter_mut().zip(Metric::ALL) {
                if let Some(value) = record.get(metric) {
                    slot.0 += value as f64;
                    slot.1 += 1;
                }
            }
        }
        let [high, mean, low] = sums.map(|(sum, count)| (count > 0).then(|| sum / count as f64));
        Self { high, mean, low }
    }

    fn of_values(values: impl IntoIterator<Item = MetricAverages>) -> Self {
        let mut sums = [(0f64, 0usize); 3];
        for averages in values {
            for (slot, metric) in sums.iter_mut().zip(Metric::ALL) {
                if let Some(value) = averages.get(metric) {
                    slot.0 += value;
                    slot.1 += 1;
                }
            }
        }
        let [high, mean, low] = sums.map(|(sum, count)| (count > 0).then(|| sum / count as f64));
        Self { high, mean, low }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::High => self.high,
            Metric::Mean => self.mean,
            Metric::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowBaseline {
    pub year: i32,
    pub records: usize,
    pub averages: MetricAverages,
}

/// One day of the actual window next to the historical average of its
/// month-day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayPoint {
    pub date: Date,
    pub high: Option<f32>,
    pub low: Option<f32>,
    pub historical_high: Option<f64>,
    pub historical_low: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowComparison {
    /// First day after the window.
    pub end_date: Date,
    pub window_length: usize,
    pub rule: BaselineRule,
    pub offsets: OffsetSet,
    pub actual: MetricAverages,
    pub actual_records: usize,
    /// Ascending by year.
    pub baselines: Vec<WindowBaseline>,
    /// `years_above + 1`, 1 being the warmest.
    pub rank: usize,
    /// Baseline years with a mean average, the ones ranked against.
    pub ranked_years: usize,
    /// Ranked years with a strictly higher mean.
    pub years_above: usize,
    /// Ranked years with a strictly lower mean.
    pub years_below: usize,
    /// `100 * years_below / ranked_years`, the share of years the window
    /// beats.
    pub percentile: f64,
    pub overlay: Vec<OverlayPoint>,
}

impl WindowComparison {
    /// The window sits in the top `top_percent` % of such windows.
    pub fn top_percent(&self) -> f64 {
        100. - self.percentile
    }

    /// Average of the per-year baselines.
    pub fn historical_average(&self) -> MetricAverages {
        MetricAverages::of_values(self.baselines.iter().map(|baseline| baseline.averages))
    }

    pub fn start_date(&self) -> Date {
        window_start(self.end_date, self.window_length)
    }
}

fn window_start(end: Date, length: usize) -> Date {
    i64::try_from(length.min(MAX_WINDOW))
        .ok()
        .and_then(|days| end.checked_sub(Duration::days(days)))
        .unwrap_or(Date::MIN)
}

/// Compare the `length` days before `end` with the same days of every year.
pub fn compare_window(end: Date, length: usize, store: &RecordStore) -> Result<WindowComparison, QueryError> {
    compare_window_with(end, length, BaselineRule::default(), store)
}

pub fn compare_window_with(
    end: Date,
    length: usize,
    rule: BaselineRule,
    store: &RecordStore,
) -> Result<WindowComparison, QueryError> {
    let offsets = OffsetSet::new(end, length)?;
    let start = window_start(end, length);

    let window = store.between(start, end);
    let actual = MetricAverages::of(window);

    let pooled: Vec<&DailyRecord> = store
        .records()
        .iter()
        .filter(|record| offsets.contains(record.month_day()))
        .collect();

    let groups = match rule {
        BaselineRule::MonthDay => group_by(pooled.iter().copied(), |record| record.year()),
        BaselineRule::ShiftedRange => shifted_groups(store, end, length),
    };
    let baselines: Vec<_> = groups
        .into_iter()
        .map(|(year, records)| WindowBaseline {
            year,
            records: records.len(),
            averages: MetricAverages::of(records),
        })
        .collect();

    debug!(
        start = %start,
        end = %end,
        offsets = offsets.len(),
        window_records = window.len(),
        baseline_years = baselines.len(),
        "window climatology"
    );

    let current = actual.mean.ok_or_else(|| {
        QueryError::InsufficientHistory(format!("no mean readings between {start} and {end}"))
    })?;
    let history: Vec<f64> = baselines.iter().filter_map(|baseline| baseline.averages.mean).collect();
    if history.is_empty() {
        return Err(QueryError::InsufficientHistory(format!(
            "no year has mean readings on the {} days before {}",
            offsets.len(),
            end
        )));
    }

    let years_above = history.iter().filter(|&&mean| mean > current).count();
    let years_below = history.iter().filter(|&&mean| mean < current).count();
    let rank = years_above + 1;
    let percentile = 100. * years_below as f64 / history.len() as f64;

    let by_month_day = group_by(pooled.iter().copied(), |record| record.month_day());
    let overlay = window
        .iter()
        .map(|record| {
            let historical = by_month_day
                .get(&record.month_day())
                .map(|records| MetricAverages::of(records.iter().copied()))
                .unwrap_or_default();
            OverlayPoint {
                date: record.date,
                high: record.high,
                low: record.low,
                historical_high: historical.high,
                historical_low: historical.low,
            }
        })
        .collect();

    Ok(WindowComparison {
        end_date: end,
        window_length: length,
        rule,
        offsets,
        actual,
        actual_records: window.len(),
        baselines,
        rank,
        ranked_years: history.len(),
        years_above,
        years_below,
        percentile,
        overlay,
    })
}

fn group_by<'a, K: Ord>(
    records: impl Iterator<Item = &'a DailyRecord>,
    key: impl Fn(&DailyRecord) -> K,
) -> BTreeMap<K, Vec<&'a DailyRecord>> {
    let mut groups: BTreeMap<K, Vec<&DailyRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    groups
}

fn shifted_groups(store: &RecordStore, end: Date, length: usize) -> BTreeMap<i32, Vec<&DailyRecord>> {
    let mut groups = BTreeMap::new();
    let Some((first, last)) = store.year_range() else {
        return groups;
    };
    // a window ending in the next year can still reach back into `last`
    for year in first..=last + 1 {
        let Some(shifted_end) = shift_year(end, year) else {
            continue;
        };
        let records = store.between(window_start(shifted_end, length), shifted_end);
        if !records.is_empty() {
            groups.insert(year, records.iter().collect());
        }
    }
    groups
}

/// `date` in `year`, Feb 29 becoming Mar 1 in common years.
fn shift_year(date: Date, year: i32) -> Option<Date> {
    date.replace_year(year)
        .or_else(|_| Date::from_calendar_date(year, Month::March, 1))
        .ok()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::record::RawRow;

    fn day(date: &str, mean: f32) -> RawRow {
        RawRow::new(date, Some(mean + 5.), Some(mean), Some(mean - 5.))
    }

    #[test]
    fn offset_set_excludes_end() {
        let offsets = OffsetSet::new(date!(2023 - 01 - 15), 3).unwrap();
        let days: Vec<_> = offsets.days().iter().map(ToString::to_string).collect();
        assert_eq!(days, ["01-14", "01-13", "01-12"]);
    }

    #[test]
    fn offset_set_crosses_new_year() {
        let offsets = OffsetSet::new(date!(2023 - 01 - 02), 3).unwrap();
        let days: Vec<_> = offsets.days().iter().map(ToString::to_string).collect();
        assert_eq!(days, ["01-01", "12-31", "12-30"]);
    }

    #[test]
    fn zero_length_window_is_rejected() {
        assert_eq!(OffsetSet::new(date!(2023 - 01 - 15), 0), Err(QueryError::InvalidWindow));
        let store = RecordStore::load(vec![day("2023-01-14", 1.)]).unwrap();
        assert_eq!(
            compare_window(date!(2023 - 01 - 15), 0, &store).unwrap_err(),
            QueryError::InvalidWindow
        );
    }

    #[test]
    fn only_years_with_matching_days_form_a_baseline() {
        let store = RecordStore::load(vec![
            day("2019-06-01", 20.),
            day("2020-03-03", 20.),
            day("2022-01-12", 1.),
            day("2022-01-13", 2.),
            day("2022-01-14", 3.),
            day("2023-01-12", 4.),
            day("2023-01-13", 5.),
            day("2023-01-14", 6.),
            day("2023-01-15", 7.),
        ])
        .unwrap();

        let comparison = compare_window(date!(2023 - 01 - 15), 3, &store).unwrap();
        let years: Vec<_> = comparison.baselines.iter().map(|b| b.year).collect();
        assert_eq!(years, [2022, 2023]);
        assert_eq!(comparison.actual_records, 3);
        assert_eq!(comparison.actual.mean, Some(5.));
        assert_eq!(comparison.baselines[0].averages.mean, Some(2.));
        assert_eq!(comparison.rank, 1);
        assert_eq!(comparison.years_above, 0);
        assert_eq!(comparison.years_below, 1);
        assert_eq!(comparison.percentile, 50.);
        assert_eq!(comparison.top_percent(), 50.);
        assert_eq!(comparison.historical_average().mean, Some(3.5));
    }

    #[test]
    fn window_length_changes_both_selections() {
        let mut rows = Vec::new();
        for year in 2020..=2023 {
            for day_of_month in 1..=28 {
                rows.push(day(&format!("{year}-02-{day_of_month:02}"), day_of_month as f32));
            }
        }
        let store = RecordStore::load(rows).unwrap();
        let end = date!(2023 - 02 - 28);

        let week = compare_window(end, 7, &store).unwrap();
        let fortnight = compare_window(end, 14, &store).unwrap();
        assert_eq!(week.actual_records, 7);
        assert_eq!(fortnight.actual_records, 14);
        assert!(week.baselines.iter().all(|b| b.records == 7));
        assert!(fortnight.baselines.iter().all(|b| b.records == 14));
        assert_eq!(week.ranked_years, 4);
    }

    #[test]
    fn empty_history_is_reported() {
        let store = RecordStore::load(vec![day("2023-05-01", 1.)]).unwrap();
        let err = compare_window(date!(2023 - 01 - 15), 3, &store).unwrap_err();
        assert!(matches!(err, QueryError::InsufficientHistory(_)));
    }

    #[test]
    fn coldest_window_beats_no_year() {
        // the actual window crosses new year, the 2022 and 2023 baselines pool
        // January and late December of the same year
        let store = RecordStore::load(vec![
            day("2022-01-01", 10.),
            day("2022-12-31", -10.),
            day("2023-01-01", -10.),
            day("2023-12-31", 10.),
            day("2021-12-31", 5.),
            day("2021-01-01", 5.),
        ])
        .unwrap();
        let comparison = compare_window(date!(2023 - 01 - 02), 2, &store).unwrap();
        assert_eq!(comparison.actual.mean, Some(-10.));
        let years: Vec<_> = comparison.baselines.iter().map(|b| b.year).collect();
        assert_eq!(years, [2021, 2022, 2023]);
        assert_eq!(comparison.years_above, 3);
        assert_eq!(comparison.years_below, 0);
        assert_eq!(comparison.rank, 4);
        assert_eq!(comparison.percentile, 0.);
        assert_eq!(comparison.top_percent(), 100.);
    }

    #[test]
    fn hotter_window_sits_in_a_smaller_top_share() {
        let hot = RecordStore::load(vec![
            day("2021-01-14", 0.),
            day("2022-01-14", 1.),
            day("2023-01-14", 30.),
        ])
        .unwrap();
        let cold = RecordStore::load(vec![
            day("2021-01-14", 10.),
            day("2022-01-14", 11.),
            day("2023-01-14", -30.),
        ])
        .unwrap();
        let end = date!(2023 - 01 - 15);

        let hot = compare_window(end, 1, &hot).unwrap();
        let cold = compare_window(end, 1, &cold).unwrap();
        assert_eq!(hot.rank, 1);
        assert_eq!(hot.years_below, 2);
        assert_eq!(format!("{:.1}", hot.top_percent()), "33.3");
        assert_eq!(cold.rank, 3);
        assert_eq!(cold.top_percent(), 100.);
        assert!(hot.top_percent() < cold.top_percent());
    }

    #[test]
    fn equal_means_are_neither_above_nor_below() {
        let store = RecordStore::load(vec![
            day("2020-01-14", 1.),
            day("2021-01-14", 5.),
            day("2022-01-14", 5.),
            day("2023-01-14", 5.),
        ])
        .unwrap();
        let comparison = compare_window(date!(2023 - 01 - 15), 1, &store).unwrap();
        assert_eq!(comparison.ranked_years, 4);
        assert_eq!(comparison.years_above, 0);
        assert_eq!(comparison.years_below, 1);
        assert_eq!(comparison.rank, 1);
        assert_eq!(comparison.percentile, 25.);
    }

    #[test]
    fn year_without_means_is_listed_but_not_ranked() {
        let store = RecordStore::load(vec![
            RawRow::new("2021-01-13", Some(9.), None, Some(-1.)),
            RawRow::new("2021-01-14", Some(8.), None, Some(-2.)),
            day("2022-01-14", 2.),
            day("2023-01-14", 4.),
        ])
        .unwrap();
        let comparison = compare_window(date!(2023 - 01 - 15), 2, &store).unwrap();
        let years: Vec<_> = comparison.baselines.iter().map(|b| b.year).collect();
        assert_eq!(years, [2021, 2022, 2023]);
        assert_eq!(comparison.baselines[0].averages.mean, None);
        assert_eq!(comparison.baselines[0].averages.high, Some(8.5));
        assert_eq!(comparison.ranked_years, 2);
        assert_eq!(comparison.years_below, 1);
        assert_eq!(comparison.percentile, 50.);
    }

    #[test]
    fn long_windows_stop_at_every_month_day() {
        let offsets = OffsetSet::new(date!(2023 - 01 - 15), 5000).unwrap();
        assert_eq!(offsets.len(), 366);
        assert!(offsets.contains(MonthDay { month: 2, day: 29 }));

        let offsets = OffsetSet::new(date!(2023 - 01 - 15), MAX_WINDOW).unwrap();
        assert_eq!(offsets.len(), 366);
    }

    #[test]
    fn oversized_window_is_rejected() {
        assert_eq!(
            OffsetSet::new(date!(2023 - 01 - 15), MAX_WINDOW + 1),
            Err(QueryError::InvalidWindow)
        );
        let store = RecordStore::load(vec![day("2023-01-14", 1.)]).unwrap();
        assert_eq!(
            compare_window(date!(2023 - 01 - 15), usize::MAX, &store).unwrap_err(),
            QueryError::InvalidWindow
        );
        assert!(window_start(date!(2023 - 01 - 15), usize::MAX).year() < 0);
    }

    #[test]
    fn shifted_range_keeps_the_window_shape() {
        let store = RecordStore::load(vec![
            day("2021-12-31", 5.),
            day("2022-01-01", 5.),
            day("2022-12-31", -10.),
            day("2023-01-01", -10.),
            day("2023-12-31", 10.),
        ])
        .unwrap();
        let comparison =
            compare_window_with(date!(2023 - 01 - 02), 2, BaselineRule::ShiftedRange, &store).unwrap();
        let years: Vec<_> = comparison.baselines.iter().map(|b| (b.year, b.records)).collect();
        assert_eq!(years, [(2022, 2), (2023, 2), (2024, 1)]);
        assert_eq!(comparison.baselines[0].averages.mean, Some(5.));
    }

    #[test]
    fn overlay_lines_up_with_history() {
        let store = RecordStore::load(vec![
            day("2021-01-14", 0.),
            day("2022-01-14", 2.),
            day("2023-01-14", 4.),
        ])
        .unwrap();
        let comparison = compare_window(date!(2023 - 01 - 15), 1, &store).unwrap();
        assert_eq!(comparison.overlay.len(), 1);
        let point = &comparison.overlay[0];
        assert_eq!(point.date, date!(2023 - 01 - 14));
        assert_eq!(point.high, Some(9.));
        assert_eq!(point.historical_high, Some(7.));
        assert_eq!(point.historical_low, Some(-3.));
    }

    #[test]
    fn leap_day_shifts_to_march() {
        assert_eq!(shift_year(date!(2024 - 02 - 29), 2023), Some(date!(2023 - 03 - 01)));
        assert_eq!(shift_year(date!(2024 - 02 - 29), 2020), Some(date!(2020 - 02 - 29)));
    }
}
