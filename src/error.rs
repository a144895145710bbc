use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComptesError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cannot load document {path}: {reason}")]
    DocumentLoad { path: String, reason: String },

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Header '{anchor}' not found in column {column} of sheet '{sheet}'")]
    HeaderNotFound {
        sheet: String,
        column: usize,
        anchor: String,
    },

    #[error("No date-like header in row {row} of sheet '{sheet}'")]
    PivotNotFound { sheet: String, row: usize },

    #[error("Invalid number at row {row}, column '{column}': {value:?}")]
    NumericParse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Invalid date at row {row}, column '{column}': {value:?}")]
    DateParse {
        row: usize,
        column: String,
        value: String,
    },

    #[error("File name must end with a four-digit year: {0}")]
    FileNaming(String),

    #[error("{count} rows carry a timestamp after their date; fix them before loading")]
    TimestampedDates { count: usize },

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ComptesError>;
