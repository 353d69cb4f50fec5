use std::io;

use thiserror::Error;

/// Fatal input and engine errors.
///
/// Tolerated data defects (unparseable cells, missing joins, negative deltas)
/// never surface here; they are coerced to `None` and counted in diagnostics.
#[derive(Debug, Error)]
pub enum CockpitError {
    /// Upload name has no `.xlsx`, `.xls`, or `.csv` extension.
    #[error("Unsupported file type. Please upload .xlsx or .csv. (got '{name}')")]
    UnsupportedFileType {
        /// Rejected file name.
        name: String,
    },
    /// First structural CSV error, verbatim.
    #[error("CSV parse error: {0}")]
    CsvParse(String),
    /// The workbook container could not be opened.
    #[error("workbook read error: {0}")]
    Workbook(String),
    /// Pipeline table above the safety ceiling.
    #[error(
        "The uploaded workbook has {rows} pipeline rows. Please split the file and retry (limit {ceiling})."
    )]
    RowCeilingExceeded {
        /// Pipeline rows in the upload.
        rows: usize,
        /// Configured ceiling.
        ceiling: usize,
    },
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// CSV/XLSX/JSON export failure.
    #[error("export failure: {0}")]
    Export(String),
    /// Invalid engine configuration or registry.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A newer upload was submitted before this one finished.
    #[error("upload {ticket} was superseded by upload {current}")]
    StaleUpload {
        /// Ticket of the discarded upload.
        ticket: u64,
        /// Latest issued ticket.
        current: u64,
    },
    /// Query made before any upload was installed.
    #[error("no dataset is loaded")]
    NoDataset,
}

impl From<csv::Error> for CockpitError {
    fn from(err: csv::Error) -> Self {
        CockpitError::CsvParse(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for CockpitError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        CockpitError::Export(err.to_string())
    }
}
