use std::ops::Range;

use time::{macros::format_description, Date};
use tracing::debug;

use crate::{
    error::ValidationError,
    record::{DailyRecord, RawRow},
};

/// Every daily record of one location, sorted by date. Built once and never
/// mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    // Sorted by date, dates are unique
    records: Vec<DailyRecord>,
}

pub fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
}

impl RecordStore {
    /// Validate rows and build the store. Rows may come in any order.
    pub fn load(rows: impl IntoIterator<Item = RawRow>) -> Result<Self, ValidationError> {
        let mut records = Vec::new();
        for (row, raw) in rows.into_iter().enumerate() {
            let date = parse_date(&raw.date).map_err(|_| ValidationError::BadDate {
                row: row + 1,
                value: raw.date.clone(),
            })?;
            records.push(DailyRecord {
                date,
                high: raw.high,
                mean: raw.mean,
                low: raw.low,
            });
        }
        Self::from_records(records)
    }

    pub fn from_records(mut records: Vec<DailyRecord>) -> Result<Self, ValidationError> {
        records.sort_by_key(|record| record.date);
        if let Some(pair) = records.windows(2).find(|pair| pair[0].date == pair[1].date) {
            return Err(ValidationError::DuplicateDate(pair[0].date));
        }
        debug!(records = records.len(), "record store built");
        Ok(Self { records })
    }

    pub fn by_date(&self, date: Date) -> Option<&DailyRecord> {
        self.records
            .binary_search_by_key(&date, |record| record.date)
            .ok()
            .map(|index| &self.records[index])
    }

    /// First and last year of the store, `None` when it is empty.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        let first = self.records.first()?;
        let last = self.records.last()?;
        Some((first.year(), last.year()))
    }

    /// Records whose date lies in `[start, end)`.
    pub fn between(&self, start: Date, end: Date) -> &[DailyRecord] {
        let from = self.records.partition_point(|record| record.date < start);
        let to = self.records.partition_point(|record| record.date < end);
        &self.records[from..to.max(from)]
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Lowest low to highest high, for chart axes.
    pub fn temperature_range(&self) -> Option<Range<f32>> {
        let low = self
            .records
            .iter()
            .filter_map(|record| record.low)
            .min_by(|left, right| left.total_cmp(right))?;
        let high = self
            .records
            .iter()
            .filter_map(|record| record.high)
            .max_by(|left, right| left.total_cmp(right))?;
        Some(low..high)
    }

    pub fn first_date(&self) -> Option<Date> {
        self.records.first().map(|record| record.date)
    }

    pub fn last_date(&self) -> Option<Date> {
        self.records.last().map(|record| record.date)
    }
}
