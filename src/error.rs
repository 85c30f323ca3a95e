//! Error types for the inkpage library.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::store::Handle;

/// Result type alias for inkpage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by document store, ingestion and rendering operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The handle is not registered in the document store.
    #[error("Invalid document handle: {0}")]
    InvalidHandle(Handle),

    /// A malformed or out-of-range argument.
    #[error("Invalid parameter: {0}")]
    InvalidParam(String),

    /// The referenced file does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An output file could not be written.
    #[error("Cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The container file could not be parsed or serialized.
    #[error("Document format error: {0}")]
    Parse(String),

    /// The PDF source could not be decoded or rendered.
    #[error("PDF decoding error: {0}")]
    PdfDecode(String),

    /// The raster surface could not be allocated or encoded.
    #[error("Image encoding error: {0}")]
    Encode(String),

    /// The store has not been initialized (or was shut down).
    #[error("Document store is not initialized")]
    NotInitialized,

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Coarse error categories exposed at the host boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidHandle,
    InvalidParam,
    NotFound,
    IoError,
    Unknown,
}

impl ErrorKind {
    /// Status code used by the C ABI.
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::InvalidHandle => -1,
            ErrorKind::InvalidParam => -2,
            ErrorKind::NotFound => -3,
            ErrorKind::IoError => -4,
            ErrorKind::Unknown => -99,
        }
    }
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidHandle(_) => ErrorKind::InvalidHandle,
            Error::InvalidParam(_) => ErrorKind::InvalidParam,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Io(e) if e.kind() == io::ErrorKind::NotFound => ErrorKind::NotFound,
            Error::Io(_)
            | Error::Write { .. }
            | Error::Parse(_)
            | Error::PdfDecode(_)
            | Error::Encode(_) => ErrorKind::IoError,
            Error::NotInitialized | Error::Other(_) => ErrorKind::Unknown,
        }
    }

    /// Wrap a failed write of `path`.
    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        Error::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Shorthand for [`Error::InvalidParam`].
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidParam(message.into())
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::PdfDecode(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Encode(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotInitialized;
        assert_eq!(err.to_string(), "Document store is not initialized");

        let err = Error::NotFound(PathBuf::from("/tmp/missing.inkp"));
        assert_eq!(err.to_string(), "File not found: /tmp/missing.inkp");
    }

    #[test]
    fn test_error_kind_codes() {
        assert_eq!(Error::invalid("x").kind().code(), -2);
        assert_eq!(Error::Parse("bad".into()).kind(), ErrorKind::IoError);
        assert_eq!(Error::PdfDecode("bad".into()).kind().code(), -4);
        assert_eq!(Error::NotInitialized.kind().code(), -99);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), ErrorKind::IoError);
    }

    #[test]
    fn test_write_error_is_io_class() {
        let source = io::Error::new(io::ErrorKind::NotFound, "no such directory");
        let err = Error::write(Path::new("/tmp/missing/out.png"), source);
        assert_eq!(err.kind(), ErrorKind::IoError);
        assert_eq!(err.kind().code(), -4);
        assert!(err.to_string().starts_with("Cannot write /tmp/missing/out.png"));
    }
}
