use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("invalid page selection: {0}")]
    InvalidPageSelection(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no pages available after applying selection")]
    NoPagesSelected,
}
