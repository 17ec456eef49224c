use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfImagingError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("PDF write error: {0}")]
    PdfWriteError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Image encode error: {0}")]
    EncodeError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error(
        "No extractable images found: the document exposes no raster image \
         XObjects from any page's resources, and replaying page paint operations \
         through the rendering engine recovered none. Vector-only or text-only \
         documents contain nothing to extract; if the document visibly contains \
         images they may use an unsupported encoding — try re-exporting the \
         file from its original producer"
    )]
    NoImagesFound,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`PdfImagingError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl PdfImagingError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a PDF read error.
    pdf_read => PdfReadError,
    /// Create a PDF write error.
    pdf_write => PdfWriteError,
    /// Create a render error.
    render => RenderError,
    /// Create an image encode error.
    encode => EncodeError,
    /// Create an archive error.
    archive => ArchiveError,
}

impl From<lopdf::Error> for PdfImagingError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<image::ImageError> for PdfImagingError {
    fn from(e: image::ImageError) -> Self {
        Self::EncodeError(e.to_string())
    }
}

impl From<serde_yml::Error> for PdfImagingError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

impl From<zip::result::ZipError> for PdfImagingError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::ArchiveError(e.to_string())
    }
}

#[cfg(feature = "render")]
impl From<pdfium_render::prelude::PdfiumError> for PdfImagingError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PdfImagingError>;
