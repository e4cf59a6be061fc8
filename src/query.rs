use serde::{Deserialize, Serialize};
use time::Date;
use tracing::debug;

use crate::{
    cohort::{cohort_for, YearRange},
    error::QueryError,
    rank::{RankResult, RankedCohort},
    record::{DailyRecord, Metric},
    store::RecordStore,
    window::{compare_window_with, BaselineRule, WindowComparison},
};

/// Parameters of a single-day comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayQuery {
    pub date: Date,
    pub years: Option<YearRange>,
    pub top: usize,
}

impl DayQuery {
    pub fn new(date: Date) -> Self {
        Self {
            date,
            years: None,
            top: 5,
        }
    }

    pub fn years(mut self, years: YearRange) -> Self {
        self.years = Some(years);
        self
    }

    pub fn top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }
}

/// Parameters of a window comparison. `end` is excluded from the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowQuery {
    pub end: Date,
    pub length: usize,
    #[serde(default)]
    pub rule: BaselineRule,
}

impl WindowQuery {
    pub fn new(end: Date, length: usize) -> Self {
        Self {
            end,
            length,
            rule: BaselineRule::default(),
        }
    }

    pub fn rule(mut self, rule: BaselineRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn run(&self, store: &RecordStore) -> Result<WindowComparison, QueryError> {
        compare_window_with(self.end, self.length, self.rule, store)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub date: Date,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReport {
    pub result: RankResult,
    /// The `top` most extreme members.
    pub top: Vec<Listing>,
    /// Every ranked member in date order.
    pub series: Vec<Listing>,
}

/// One cohort member with both a high and a low reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub date: Date,
    pub high: f32,
    pub low: f32,
    pub is_target: bool,
}

/// How one day compares with its calendar-day cohort, for all three readings.
///
/// A reading the target day lacks has no report and is listed in `missing`,
/// the other readings are still ranked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub target: DailyRecord,
    pub cohort_size: usize,
    pub high: Option<MetricReport>,
    pub mean: Option<MetricReport>,
    pub low: Option<MetricReport>,
    pub missing: Vec<Metric>,
    /// High against low for every member, in date order.
    pub scatter: Vec<ScatterPoint>,
}

impl DayReport {
    pub fn get(&self, metric: Metric) -> Option<&MetricReport> {
        match metric {
            Metric::High => self.high.as_ref(),
            Metric::Mean => self.mean.as_ref(),
            Metric::Low => self.low.as_ref(),
        }
    }
}

pub fn compare_day(store: &RecordStore, query: &DayQuery) -> Result<DayReport, QueryError> {
    let cohort = cohort_for(store, query.date, query.years)?;

    let report = |metric| -> Result<MetricReport, QueryError> {
        let ranked = RankedCohort::new(&cohort, metric);
        let result = ranked.result(&cohort, query.date)?;
        let listing = |(date, value): (Date, f32)| Listing { date, value };
        Ok(MetricReport {
            result,
            top: ranked
                .top(query.top)
                .iter()
                .map(|(record, value)| listing((record.date, *value)))
                .collect(),
            series: ranked.chronological().into_iter().map(listing).collect(),
        })
    };

    let mut missing = Vec::new();
    let mut ranked = |metric: Metric| match report(metric) {
        Ok(report) => Ok(Some(report)),
        Err(QueryError::MissingValue { date, metric }) => {
            debug!(%date, %metric, "target has no value, metric skipped");
            missing.push(metric);
            Ok(None)
        }
        Err(e) => Err(e),
    };
    let high = ranked(Metric::High)?;
    let mean = ranked(Metric::Mean)?;
    let low = ranked(Metric::Low)?;

    let scatter = cohort
        .members()
        .iter()
        .filter_map(|record| {
            Some(ScatterPoint {
                date: record.date,
                high: record.high?,
                low: record.low?,
                is_target: record.date == query.date,
            })
        })
        .collect();

    Ok(DayReport {
        target: cohort.target.clone(),
        cohort_size: cohort.len(),
        high,
        mean,
        low,
        missing,
        scatter,
    })
}
