use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop the scene from starting or running.
#[derive(Debug, Error)]
pub enum Error {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("invalid hex color: {0} (expected RRGGBB, e.g. 1a1b26)")]
    InvalidColor(String),
    #[error("{0} requires a value")]
    MissingValue(String),
    #[error("invalid value for {option}: {value}")]
    InvalidValue { option: String, value: String },
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error("invalid log level: {0} (expected error, warn, info, debug or trace)")]
    InvalidLogLevel(String),
    #[error("cannot open log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
