use thiserror::Error;

/// The five error kinds the workflow can surface, per the failure policy:
/// every error carries a human-readable message identifying the offending
/// path or record, and no partial output is written once one is raised.
#[derive(Debug, Error)]
pub enum StrProfileError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("I/O failure: {0}")]
    Io(String),

    #[error("logic error: {0}")]
    Logic(String),

    #[error("empty stream: {0}")]
    EmptyStream(String),
}

impl From<std::io::Error> for StrProfileError {
    fn from(err: std::io::Error) -> Self {
        StrProfileError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StrProfileError>;
