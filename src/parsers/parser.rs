use csv::{Error as CsvError, ErrorKind as CsvErrorKind};
use std::io;
use thiserror::Error;

/// Errors raised while reading a reference table or a flow log.
///
/// Row-level problems never surface here, they are skipped by the parsers.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(CsvError),
}

impl From<CsvError> for ReadError {
    fn from(err: CsvError) -> Self {
        if !err.is_io_error() {
            return ReadError::Csv(err);
        }
        match err.into_kind() {
            CsvErrorKind::Io(e) => ReadError::Io(e),
            kind => ReadError::Io(io::Error::new(io::ErrorKind::Other, format!("{:?}", kind))),
        }
    }
}
