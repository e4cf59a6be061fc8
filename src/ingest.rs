//! Daily temperature exports from the Korea Meteorological Administration.
//!
//! The export starts with a few lines describing the query, then a header row
//! and one row per day:
//!
//! ```text
//! 날짜,지점,평균기온(℃),최저기온(℃),최고기온(℃)
//! \t2023-01-15,108,-1.2,-5.3,3.4
//! ```

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::EUC_KR;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{IngestError, ValidationError},
    record::RawRow,
    store::RecordStore,
};

/// Header names of the columns the store needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Columns {
    pub date: String,
    pub high: String,
    pub mean: String,
    pub low: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            date: String::from("날짜"),
            high: String::from("최고기온(℃)"),
            mean: String::from("평균기온(℃)"),
            low: String::from("최저기온(℃)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    /// Lines before the header row.
    pub skip_rows: usize,
    pub columns: Columns,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            skip_rows: 7,
            columns: Columns::default(),
        }
    }
}

fn skip_lines(input: &str, count: usize) -> &str {
    let mut rest = input;
    for _ in 0..count {
        match rest.find('\n') {
            Some(index) => rest = &rest[index + 1..],
            None => return "",
        }
    }
    rest
}

fn column(header: &StringRecord, name: &str) -> Result<usize, ValidationError> {
    header
        .iter()
        .position(|cell| cell == name)
        .ok_or_else(|| ValidationError::MissingColumn(name.to_string()))
}

/// Non-numeric cells become missing values.
fn metric(cell: Option<&str>, date: &str, name: &str) -> Option<f32> {
    let cell = cell.filter(|cell| !cell.is_empty())?;
    match cell.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(date, column = name, cell, "not a number, treated as missing");
            None
        }
    }
}

/// Parse an export into rows ready for [`RecordStore::load`].
pub fn parse(input: &str, layout: &Layout) -> Result<Vec<RawRow>, IngestError> {
    let body = skip_lines(input.strip_prefix('\u{feff}').unwrap_or(input), layout.skip_rows);
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let header = reader.headers()?.clone();
    if header.iter().all(str::is_empty) {
        return Err(ValidationError::MissingHeader.into());
    }

    let columns = &layout.columns;
    let date = column(&header, &columns.date)?;
    let high = column(&header, &columns.high)?;
    let mean = column(&header, &columns.mean)?;
    let low = column(&header, &columns.low)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let day = record.get(date).unwrap_or_default();
        rows.push(RawRow {
            date: day.to_string(),
            high: metric(record.get(high), day, &columns.high),
            mean: metric(record.get(mean), day, &columns.mean),
            low: metric(record.get(low), day, &columns.low),
        });
    }
    Ok(rows)
}

/// UTF-8 first, with its BOM stripped, then CP949, the code page the export
/// is saved in by default.
pub fn decode(bytes: &[u8]) -> Result<Cow<'_, str>, IngestError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(Cow::Borrowed(text)),
        Err(e) => {
            let text = EUC_KR
                .decode_without_bom_handling_and_without_replacement(bytes)
                .ok_or(IngestError::Encoding(e.valid_up_to()))?;
            debug!("input decoded as CP949");
            Ok(text)
        }
    }
}

/// Read and validate an export file.
pub fn load(path: impl AsRef<Path>, layout: &Layout) -> Result<RecordStore, IngestError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = parse(&decode(&bytes)?, layout)?;
    let store = RecordStore::load(rows)?;

    if let Some((from, to)) = store.year_range() {
        info!(path = %path.display(), records = store.len(), from, to, "loaded daily records");
    }
    Ok(store)
}

/// The first `ta*.csv` file of `dir`, by name.
pub fn find_default(dir: impl AsRef<Path>) -> Option<PathBuf> {
    let mut candidates: Vec<_> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("ta") && name.ends_with(".csv"))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
