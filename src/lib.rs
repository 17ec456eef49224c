//! In-process document image tooling.
//!
//! Three pipelines over PDF byte payloads:
//! - extraction: walk (or, as fallback, harvest via the rendering engine) the
//!   raster images of a document into a deterministic zip archive;
//! - compression: re-encode every page as one lossy full-page JPEG;
//! - pagination: slice one tall laid-out capture into fixed-height page
//!   images and assemble them into a document.
//!
//! All processing is sequential: one document, one page, one raster object at
//! a time, and nothing persists across calls except the rendering-engine
//! initialization done once at startup.

pub mod config;
pub mod error;
pub mod extract;
pub mod pdf;
pub mod pipeline;
pub mod render;

pub use config::CompressionOptions;
pub use error::{PdfImagingError, Result};
pub use extract::{DEFAULT_RESOLVE_TIMEOUT, extract_images};
pub use pipeline::compressor::compress_document;
pub use pipeline::paginate::{PaginationPlan, capture_to_document};
