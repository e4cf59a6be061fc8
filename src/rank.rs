use serde::Serialize;
use time::Date;
use tracing::debug;

use crate::{
    cohort::CalendarDayCohort,
    error::QueryError,
    record::{DailyRecord, Metric},
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extreme {
    pub date: Date,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankResult {
    pub metric: Metric,
    pub target_date: Date,
    pub target_value: f32,
    /// 1-based, 1 is the most extreme value for the metric.
    pub rank: usize,
    pub cohort_size: usize,
    /// `100 * (rank - 1) / cohort_size`, 0 for the most extreme member.
    pub percentile: f64,
    pub extreme: Extreme,
}

impl RankResult {
    /// How far the cohort record sits from the target.
    pub fn delta(&self) -> f32 {
        self.extreme.value - self.target_value
    }

    pub fn is_record(&self) -> bool {
        self.rank == 1
    }
}

/// Share of the cohort ranked ahead of `rank`, 0 for the extreme itself.
/// Ranks start at 1, a rank of 0 counts as 1.
pub fn percentile(rank: usize, size: usize) -> f64 {
    if size == 0 {
        return 0.;
    }
    100. * rank.saturating_sub(1) as f64 / size as f64
}

/// A cohort in one metric's order.
///
/// Members without a value for the metric are left out. Ties keep date order,
/// so among equal readings the earliest date takes the lower rank.
#[derive(Debug, Clone)]
pub struct RankedCohort<'a> {
    pub metric: Metric,
    ordered: Vec<(&'a DailyRecord, f32)>,
}

impl<'a> RankedCohort<'a> {
    pub fn new(cohort: &CalendarDayCohort<'a>, metric: Metric) -> Self {
        let mut ordered: Vec<_> = cohort
            .members()
            .iter()
            .filter_map(|&record| record.get(metric).map(|value| (record, value)))
            .collect();

        // `sort_by` is stable and members come in date order
        if metric.descending() {
            ordered.sort_by(|(_, left), (_, right)| right.total_cmp(left));
        } else {
            ordered.sort_by(|(_, left), (_, right)| left.total_cmp(right));
        }

        Self { metric, ordered }
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn ordered(&self) -> &[(&'a DailyRecord, f32)] {
        &self.ordered
    }

    pub fn top(&self, n: usize) -> &[(&'a DailyRecord, f32)] {
        &self.ordered[..n.min(self.ordered.len())]
    }

    /// Rank of `date`, if it is a ranked member.
    pub fn rank_of(&self, date: Date) -> Option<usize> {
        self.ordered
            .iter()
            .position(|(record, _)| record.date == date)
            .map(|index| index + 1)
    }

    /// Ranked members back in date order, for trend lines.
    pub fn chronological(&self) -> Vec<(Date, f32)> {
        let mut points: Vec<_> = self
            .ordered
            .iter()
            .map(|(record, value)| (record.date, *value))
            .collect();
        points.sort_by_key(|(date, _)| *date);
        points
    }

    pub fn result(&self, cohort: &CalendarDayCohort<'_>, target: Date) -> Result<RankResult, QueryError> {
        if !cohort.contains(target) {
            return Err(QueryError::TargetNotInCohort {
                date: target,
                month_day: cohort.month_day,
            });
        }
        let rank = self.rank_of(target).ok_or(QueryError::MissingValue {
            date: target,
            metric: self.metric,
        })?;
        let (_, target_value) = self.ordered[rank - 1];
        let (record, value) = self.ordered[0];

        Ok(RankResult {
            metric: self.metric,
            target_date: target,
            target_value,
            rank,
            cohort_size: self.len(),
            percentile: percentile(rank, self.len()),
            extreme: Extreme {
                date: record.date,
                value,
            },
        })
    }
}

/// Rank the observation of `target` within its cohort for one metric.
pub fn rank(cohort: &CalendarDayCohort<'_>, metric: Metric, target: Date) -> Result<RankResult, QueryError> {
    let result = RankedCohort::new(cohort, metric).result(cohort, target)?;
    debug!(
        %metric,
        rank = result.rank,
        size = result.cohort_size,
        percentile = result.percentile,
        "ranked"
    );
    Ok(result)
}
