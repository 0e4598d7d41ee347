use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, TabError>;

/// Fatal errors surfaced to the user. One variant per error kind; every
/// operation propagates these and the binary maps them to a non-zero exit.
#[derive(Debug, thiserror::Error)]
pub enum TabError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on {path}: {source}")]
    IoPath {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0}")]
    Encoding(String),

    #[error("{0}")]
    Shape(String),

    #[error(
        "FieldSizeLimitError: CSV contains a field longer than the maximum length of {limit} characters on line {row}."
    )]
    FieldSizeLimit { limit: usize, row: usize },

    #[error("{0}")]
    ColumnIdentifier(String),

    #[error("{0}")]
    Format(String),

    #[error("{0}")]
    Join(String),

    #[error("ValueError: {0}")]
    Value(String),
}

impl TabError {
    pub fn io_path(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TabError::IoPath {
            path: path.into(),
            source,
        }
    }
}
