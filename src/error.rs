use std::path::PathBuf;

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HerbariumError {
    #[error("malformed record at row {row}: {reason}")]
    MalformedRecord { row: usize, reason: String },

    #[error("metadata source query failed: {0}")]
    SourceQuery(String),

    #[error("source image not found: {0}")]
    SourceNotFound(Utf8PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
