//! Error types for flowpage library.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for flowpage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during HTML to document conversion.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is empty or does not look like HTML.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The render surface reported a failure (launch, navigation, evaluation, capture).
    #[error("Render error: {0}")]
    Render(String),

    /// The page did not finish loading within the configured bound.
    #[error("Page load timed out after {0:?}")]
    Timeout(Duration),

    /// A render-stage failure of the high-fidelity pipeline.
    #[error("Failed to create high-fidelity document: {0}")]
    Conversion(String),

    /// A failure while printing HTML to PDF.
    #[error("Failed to convert HTML to PDF: {0}")]
    Pdf(String),

    /// Encoding the output container failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The caller cancelled the conversion.
    #[error("Conversion cancelled")]
    Cancelled,

    /// No converter is registered under the requested name.
    #[error("No converter registered for: {0}")]
    UnknownConverter(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap a render-stage failure with the stable conversion prefix.
    ///
    /// Cancellation and validation errors pass through untouched.
    pub fn into_conversion(self) -> Self {
        match self {
            Error::Cancelled | Error::InvalidInput(_) | Error::Conversion(_) => self,
            Error::Render(msg) => Error::Conversion(msg),
            other => Error::Conversion(other.to_string()),
        }
    }

    /// Wrap a print-path failure with the stable PDF prefix.
    ///
    /// Cancellation and validation errors pass through untouched.
    pub fn into_pdf(self) -> Self {
        match self {
            Error::Cancelled | Error::InvalidInput(_) | Error::Pdf(_) => self,
            Error::Render(msg) => Error::Pdf(msg),
            other => Error::Pdf(other.to_string()),
        }
    }

    /// Check whether this error came from input validation.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "Conversion cancelled");

        let err = Error::Conversion("navigation failed".into());
        assert_eq!(
            err.to_string(),
            "Failed to create high-fidelity document: navigation failed"
        );
    }

    #[test]
    fn test_into_conversion_wraps_render() {
        let err = Error::Render("tab crashed".into()).into_conversion();
        assert_eq!(
            err.to_string(),
            "Failed to create high-fidelity document: tab crashed"
        );

        let err = Error::Timeout(Duration::from_secs(60)).into_conversion();
        assert!(matches!(err, Error::Conversion(ref m) if m.contains("timed out")));
    }

    #[test]
    fn test_into_conversion_keeps_cancel() {
        assert!(matches!(Error::Cancelled.into_conversion(), Error::Cancelled));
        assert!(Error::InvalidInput("x".into())
            .into_conversion()
            .is_invalid_input());
    }

    #[test]
    fn test_into_pdf_prefix() {
        let err = Error::Timeout(Duration::from_secs(5)).into_pdf();
        assert_eq!(
            err.to_string(),
            "Failed to convert HTML to PDF: Page load timed out after 5s"
        );
        assert!(matches!(Error::Cancelled.into_pdf(), Error::Cancelled));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
