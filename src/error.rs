use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CrunchyError {
    #[error("invalid item identifier: {0}")]
    InvalidIdentifier(String),

    #[error("missing config file {0}")]
    MissingConfig(Utf8PathBuf),

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse YAML config: {0}")]
    ConfigParse(String),

    #[error("no collections configured in {0}")]
    EmptyCollections(Utf8PathBuf),

    #[error("archive request failed: {0}")]
    ArchiveHttp(String),

    #[error("archive returned status {status}: {message}")]
    ArchiveStatus { status: u16, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("failed to persist identifier store at {path}: {message}")]
    StorePersist { path: Utf8PathBuf, message: String },
}
