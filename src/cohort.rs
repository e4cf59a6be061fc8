use serde::{Deserialize, Serialize};
use time::Date;
use tracing::debug;

use crate::{
    error::QueryError,
    record::{DailyRecord, MonthDay},
    store::RecordStore,
};

/// Inclusive bound on the years a cohort may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub from: i32,
    pub to: i32,
}

impl YearRange {
    pub fn new(from: i32, to: i32) -> Result<Self, QueryError> {
        if from > to {
            return Err(QueryError::InvalidYearRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.from..=self.to).contains(&year)
    }
}

/// Every record sharing the target's month and day, in date order. Borrowed
/// from the store, never copied.
#[derive(Debug, Clone)]
pub struct CalendarDayCohort<'a> {
    pub target: &'a DailyRecord,
    pub month_day: MonthDay,
    pub years: Option<YearRange>,
    members: Vec<&'a DailyRecord>,
}

impl<'a> CalendarDayCohort<'a> {
    pub fn members(&self) -> &[&'a DailyRecord] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, date: Date) -> bool {
        self.members.iter().any(|record| record.date == date)
    }
}

/// Select the calendar-day cohort of `target`.
///
/// Two dates match when their month and day are equal, so Feb 29 only ever
/// meets other Feb 29s. The target has to be in the store; when it falls
/// outside `years` it is still the anchor but not a member, and ranking it
/// will report it.
pub fn cohort_for(
    store: &RecordStore,
    target: Date,
    years: Option<YearRange>,
) -> Result<CalendarDayCohort<'_>, QueryError> {
    let anchor = store.by_date(target).ok_or(QueryError::EmptyCohort(target))?;
    let month_day = MonthDay::of(target);

    let members: Vec<_> = store
        .records()
        .iter()
        .filter(|record| month_day.matches(record.date))
        .filter(|record| years.map_or(true, |range| range.contains(record.year())))
        .collect();

    debug!(%month_day, size = members.len(), "calendar-day cohort");

    Ok(CalendarDayCohort {
        target: anchor,
        month_day,
        years,
        members,
    })
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;
    use crate::record::RawRow;

    fn store() -> RecordStore {
        RecordStore::load(
            [
                "2020-02-29",
                "2021-01-15",
                "2021-02-28",
                "2022-01-15",
                "2022-01-16",
                "2023-01-15",
                "2024-02-29",
            ]
            .into_iter()
            .map(|d| RawRow::new(d, Some(1.), Some(1.), Some(1.))),
        )
        .unwrap()
    }

    #[test]
    fn picks_same_month_day_across_years() {
        let store = store();
        let cohort = cohort_for(&store, date!(2023 - 01 - 15), None).unwrap();
        let dates: Vec<_> = cohort.members().iter().map(|r| r.date).collect();
        assert_eq!(
            dates,
            [date!(2021 - 01 - 15), date!(2022 - 01 - 15), date!(2023 - 01 - 15)]
        );
        assert_eq!(cohort.target.date, date!(2023 - 01 - 15));
    }

    #[test]
    fn year_range_is_inclusive() {
        let store = store();
        let years = YearRange::new(2022, 2023).unwrap();
        let cohort = cohort_for(&store, date!(2023 - 01 - 15), Some(years)).unwrap();
        assert_eq!(cohort.len(), 2);
        assert!(!cohort.contains(date!(2021 - 01 - 15)));
    }

    #[test]
    fn leap_day_cohort_is_not_padded() {
        let store = store();
        let cohort = cohort_for(&store, date!(2024 - 02 - 29), None).unwrap();
        assert_eq!(cohort.len(), 2);
        assert!(!cohort.contains(date!(2021 - 02 - 28)));
    }

    #[test]
    fn missing_target_is_an_error() {
        let store = store();
        let err = cohort_for(&store, date!(2023 - 01 - 16), None).unwrap_err();
        assert_eq!(err, QueryError::EmptyCohort(date!(2023 - 01 - 16)));
    }

    #[test]
    fn reversed_year_range_is_rejected() {
        assert_eq!(
            YearRange::new(2023, 2020),
            Err(QueryError::InvalidYearRange {
                from: 2023,
                to: 2020
            })
        );
    }
}
