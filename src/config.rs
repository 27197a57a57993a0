use crate::datekit::{Year, YearError};
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use time::error::IndeterminateOffset;
use time::Date;

pub(crate) const DEFAULT_COLLECTION: &str = "readDays";

/// Environment variable overriding the default data directory
pub(crate) const DATA_DIR_VAR: &str = "READTRACK_DATA_DIR";

/// Environment variable holding the `tracing` filter directives
pub(crate) const LOG_VAR: &str = "READTRACK_LOG";

const LOG_FILE: &str = "readtrack.log";

/// Settings given on the command line, before defaults are filled in
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Options {
    pub(crate) year: Option<Year>,
    pub(crate) today: Option<Date>,
    pub(crate) data_dir: Option<PathBuf>,
    pub(crate) collection: Option<String>,
    pub(crate) ephemeral: bool,
}

impl Options {
    /// Fill in defaults.  `local_today` is only consulted if no date was
    /// given, and `default_data_dir` is only needed for persistent storage.
    pub(crate) fn resolve<F>(
        self,
        local_today: F,
        default_data_dir: Option<PathBuf>,
    ) -> Result<Config, ConfigError>
    where
        F: FnOnce() -> Result<Date, IndeterminateOffset>,
    {
        let today = match self.today {
            Some(d) => d,
            None => local_today()?,
        };
        let year = match self.year {
            Some(y) => y,
            None => Year::of(today)?,
        };
        let collection = self
            .collection
            .unwrap_or_else(|| String::from(DEFAULT_COLLECTION));
        // The name becomes a directory under the data directory
        if matches!(collection.as_str(), "" | "." | "..") || collection.contains(['/', '\\']) {
            return Err(ConfigError::Collection(collection));
        }
        let storage = if self.ephemeral {
            Storage::Ephemeral
        } else {
            Storage::Directory(
                self.data_dir
                    .or(default_data_dir)
                    .ok_or(ConfigError::NoDataDir)?,
            )
        };
        Ok(Config {
            year,
            today,
            collection,
            storage,
        })
    }
}

/// `$READTRACK_DATA_DIR` if set and nonempty, else `readtrack/` in the
/// platform's local data directory
pub(crate) fn default_data_dir() -> Option<PathBuf> {
    env::var_os(DATA_DIR_VAR)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::data_local_dir().map(|d| d.join(env!("CARGO_PKG_NAME"))))
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Config {
    pub(crate) year: Year,
    pub(crate) today: Date,
    pub(crate) collection: String,
    pub(crate) storage: Storage,
}

impl Config {
    pub(crate) fn log_path(&self) -> PathBuf {
        match &self.storage {
            Storage::Ephemeral => env::temp_dir().join(LOG_FILE),
            Storage::Directory(dir) => dir.join(LOG_FILE),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Storage {
    /// Keep documents in memory; nothing survives the process
    Ephemeral,
    /// Keep documents as JSON files under the given directory
    Directory(PathBuf),
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to determine local date")]
    LocalDate(#[from] IndeterminateOffset),
    #[error("today's date has no supported year")]
    Year(#[from] YearError),
    #[error("invalid collection name {0:?}")]
    Collection(String),
    #[error("could not determine a data directory; use --data-dir or set {DATA_DIR_VAR}")]
    NoDataDir,
}
