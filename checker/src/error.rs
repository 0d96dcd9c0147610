//! Error taxonomy for a capacity check run

use std::path::PathBuf;
use thiserror::Error;

/// Exit code used for any failure that prevents a verdict.
pub const EXIT_UNKNOWN: u8 = 3;

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("cannot read {what} ({path}): {source}")]
    ResourceUnavailable {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{what}: {detail}")]
    MalformedSource { what: &'static str, detail: String },

    #[error("no running process matches {0}")]
    NoMatchingProcess(PathBuf),

    #[error("httpd version {major}.{minor} is newer than every supported profile")]
    UnsupportedVersion { major: u32, minor: u32 },

    #[error("unsupported concurrency model {0:?}")]
    UnsupportedConcurrencyModel(String),

    #[error("invalid configuration: {tunable} must be greater than 0 (got {value})")]
    InvalidConfiguration { tunable: &'static str, value: u64 },

    #[error("history store: {0}")]
    HistoryStore(#[from] rusqlite::Error),
}

impl CheckError {
    pub fn unavailable(what: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CheckError::ResourceUnavailable { what, path: path.into(), source }
    }

    pub fn exit_code(&self) -> u8 {
        EXIT_UNKNOWN
    }
}

pub type Result<T, E = CheckError> = std::result::Result<T, E>;
