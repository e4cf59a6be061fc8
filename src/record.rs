use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Date;

/// The three daily temperature readings a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    High,
    Mean,
    Low,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::High, Metric::Mean, Metric::Low];

    /// Whether rank 1 is the largest value. "Extreme" means hottest for the
    /// high and mean readings, and coldest for the low reading.
    pub fn descending(self) -> bool {
        match self {
            Metric::High | Metric::Mean => true,
            Metric::Low => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Metric::High => "high",
            Metric::Mean => "mean",
            Metric::Low => "low",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" | "max" => Ok(Self::High),
            "mean" | "avg" => Ok(Self::Mean),
            "low" | "min" => Ok(Self::Low),
            s => Err(format!("Unknown metric {s}. Expecting `high`, `mean` or `low`")),
        }
    }
}

/// Month and day of a date, the key shared by a calendar-day cohort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
    pub month: u8,
    pub day: u8,
}

impl MonthDay {
    pub fn of(date: Date) -> Self {
        Self {
            month: date.month() as u8,
            day: date.day(),
        }
    }

    pub fn matches(self, date: Date) -> bool {
        date.month() as u8 == self.month && date.day() == self.day
    }
}

impl From<Date> for MonthDay {
    fn from(date: Date) -> Self {
        Self::of(date)
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl Serialize for MonthDay {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One day of observations. Any reading may be absent when the source cell
/// was empty or not a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    pub date: Date,
    pub high: Option<f32>,
    pub mean: Option<f32>,
    pub low: Option<f32>,
}

impl DailyRecord {
    pub fn new(date: Date, high: f32, mean: f32, low: f32) -> Self {
        Self {
            date,
            high: Some(high),
            mean: Some(mean),
            low: Some(low),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f32> {
        match metric {
            Metric::High => self.high,
            Metric::Mean => self.mean,
            Metric::Low => self.low,
        }
    }

    pub fn month_day(&self) -> MonthDay {
        MonthDay::of(self.date)
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }
}

/// A row as handed over by ingestion: the date is still text, metrics are
/// already coerced.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    pub date: String,
    pub high: Option<f32>,
    pub mean: Option<f32>,
    pub low: Option<f32>,
}

impl RawRow {
    pub fn new(date: impl Into<String>, high: Option<f32>, mean: Option<f32>, low: Option<f32>) -> Self {
        Self {
            date: date.into(),
            high,
            mean,
            low,
        }
    }
}
