use thiserror::Error;

/// Structural failures raised while reading an xlsx package.
#[derive(Error, Debug)]
pub enum XlsxError {
    #[error("{message}: {source}")]
    WithContextError {
        message: String,
        #[source]
        source: Box<XlsxError>,
    },

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Package errors
    #[error("Missing package part '{0}'")]
    MissingPart(String),

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Invalid cell reference '{0}'")]
    InvalidCellReference(String),

    #[error("Unsupported package location '{0}'")]
    UnsupportedLocation(String),

    #[error("Sheet data ended inside an unterminated row")]
    UnterminatedRow,
}

/// The failure kind of every sheet operation.
///
/// Carries the sheet name and the last row index the decoder reached, with the
/// structural cause available through [`std::error::Error::source`].
#[derive(Error, Debug)]
#[error("Decode sheet '{sheet}' failed at row {row}: {source}")]
pub struct SheetDecodeError {
    pub sheet: String,
    pub row: usize,
    #[source]
    pub source: XlsxError,
}

impl SheetDecodeError {
    pub(crate) fn new(sheet: &str, row: usize, source: XlsxError) -> Self {
        Self {
            sheet: sheet.to_owned(),
            row,
            source,
        }
    }

    /// Returns true if the sheet name matched no sheet of the package.
    pub fn is_sheet_not_found(&self) -> bool {
        matches!(self.source, XlsxError::SheetNotFound(_))
    }
}

pub(crate) trait ResultContext {
    fn with_context(self, message: &str) -> Self;
}

impl<T> ResultContext for Result<T, XlsxError> {
    fn with_context(self, message: &str) -> Self {
        self.map_err(|e| XlsxError::WithContextError {
            message: message.to_owned(),
            source: Box::new(e),
        })
    }
}
