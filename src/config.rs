//! Configuration file management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::ConfigError,
    ingest::{Columns, Layout},
    window::BaselineRule,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub columns: Columns,

    #[serde(default)]
    pub query: QueryConfig,
}

/// Where the daily records come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Export file, looked up as `ta*.csv` in the working directory when unset
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Description lines before the header row
    #[serde(default = "default_skip_rows")]
    pub skip_rows: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: None,
            skip_rows: default_skip_rows(),
        }
    }
}

/// Defaults for queries, overridden by command line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_window_days")]
    pub window_days: usize,

    /// Length of the "top" listings
    #[serde(default = "default_top")]
    pub top: usize,

    #[serde(default)]
    pub from_year: Option<i32>,

    #[serde(default)]
    pub to_year: Option<i32>,

    #[serde(default)]
    pub baseline: BaselineRule,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            top: default_top(),
            from_year: None,
            to_year: None,
            baseline: BaselineRule::default(),
        }
    }
}

fn default_skip_rows() -> usize {
    7
}

fn default_window_days() -> usize {
    14
}

fn default_top() -> usize {
    5
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn layout(&self) -> Layout {
        Layout {
            skip_rows: self.source.skip_rows,
            columns: self.columns.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.query.window_days, 14);
        assert_eq!(config.layout(), Layout::default());
    }

    #[test]
    fn load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[source]
path = "ta_seoul.csv"

[columns]
date = "date"

[query]
window_days = 7
from_year = 1990
baseline = "shifted-range"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.source.path, Some(PathBuf::from("ta_seoul.csv")));
        assert_eq!(config.source.skip_rows, 7);
        assert_eq!(config.columns.date, "date");
        assert_eq!(config.columns.high, "최고기온(℃)");
        assert_eq!(config.query.window_days, 7);
        assert_eq!(config.query.top, 5);
        assert_eq!(config.query.from_year, Some(1990));
        assert_eq!(config.query.baseline, BaselineRule::ShiftedRange);
    }

    #[test]
    fn bad_toml_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[query]\nwindow_days = \"two weeks\"").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            Config::load("/nonexistent/climatology.toml"),
            Err(ConfigError::Io { .. })
        ));
        assert_eq!(Config::load_or_default(None).unwrap(), Config::default());
    }
}
