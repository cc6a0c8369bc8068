use thiserror::Error;

/// Main error type for the Rusty Roster crate.
/// Every variant describes a workbook that could not be decoded; extraction itself never fails.
#[derive(Error, Debug)]
pub enum RustyRosterError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    #[error("{0}")]
    StringEncodingError(#[from] std::str::Utf8Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("Background parse task failed: {0}")]
    TaskError(#[from] tokio::task::JoinError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    OdsError(#[from] crate::spreadsheet::ods::OdsError),
}

/// A workbook that could not be turned into a grid. This is the only failure `parse` reports.
pub type DecodeError = RustyRosterError;

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, RustyRosterError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| RustyRosterError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_prefix_wraps_message() {
        let result: Result<(), RustyRosterError> =
            Err(crate::spreadsheet::SpreadsheetError::SpreadsheetEmptyError("book.xlsx".to_owned()).into());
        let error = result.with_prefix("Open 'book.xlsx' failed").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Open 'book.xlsx' failed: Spreadsheet 'book.xlsx' contains no sheets"
        );
    }
}
