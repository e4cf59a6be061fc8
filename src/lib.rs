//! How does a day compare with the same calendar day of every other year, and
//! how do the last few days compare with the same days of previous years?
//!
//! ```no_run
//! use climatology::{compare_day, ingest, DayQuery, Layout, WindowQuery};
//! use time::macros::date;
//!
//! let store = ingest::load("ta_seoul.csv", &Layout::default())?;
//! let report = compare_day(&store, &DayQuery::new(date!(2023 - 01 - 15)))?;
//! if let Some(high) = &report.high {
//!     println!("{} of {}", high.result.rank, high.result.cohort_size);
//! }
//!
//! let window = WindowQuery::new(date!(2023 - 01 - 16), 14).run(&store)?;
//! println!("top {:.1}%", window.top_percent());
//! # Ok::<(), climatology::Error>(())
//! ```

pub mod cohort;
pub mod config;
pub mod error;
pub mod ingest;
pub mod query;
pub mod rank;
pub mod record;
pub mod store;
pub mod window;

pub use cohort::{cohort_for, CalendarDayCohort, YearRange};
pub use config::Config;
pub use error::{ConfigError, Error, IngestError, QueryError, Result, ValidationError};
pub use ingest::{Columns, Layout};
pub use query::{compare_day, DayQuery, DayReport, MetricReport, ScatterPoint, WindowQuery};
pub use rank::{rank, Extreme, RankResult, RankedCohort};
pub use record::{DailyRecord, Metric, MonthDay, RawRow};
pub use store::RecordStore;
pub use window::{
    compare_window, compare_window_with, BaselineRule, MetricAverages, OffsetSet, WindowBaseline,
    WindowComparison, MAX_WINDOW,
};
