//! Rendering-engine seam.
//!
//! All pipeline code talks to [`RenderEngine`]/[`PageRenderer`] so the
//! pdfium-backed engine can be swapped for a scripted fake in tests. Engine
//! initialization happens once at startup; the traits expose only read access
//! to the engine's object caches.

#[cfg(feature = "render")]
pub mod pdfium;

use std::time::Instant;

use image::{DynamicImage, RgbaImage};

/// A raster operand recovered from the engine's object caches. Two raw-data
/// shapes occur in practice: an already-decoded bitmap surface, or an explicit
/// pixel buffer whose channel layout must be inferred from its length.
#[derive(Debug, Clone)]
pub enum ResolvedImage {
    Bitmap(RgbaImage),
    Raw {
        data: Vec<u8>,
        width: u32,
        height: u32,
    },
}

/// Process-wide rendering engine, initialized once and never mutated.
pub trait RenderEngine {
    /// Open a document for rendering. The renderer borrows the engine only;
    /// the byte payload is copied or parsed as the backend requires.
    fn open<'a>(&'a self, pdf_bytes: &[u8]) -> crate::error::Result<Box<dyn PageRenderer + 'a>>;
}

/// Per-document rendering session. Page indexes are 0-based.
pub trait PageRenderer {
    fn page_count(&self) -> u32;

    /// Render the page at `scale` (1.0 = 72 dpi). The returned surface may
    /// carry alpha; callers flatten onto their own background. Rendering also
    /// materializes the page's paint operands in the engine's caches.
    fn render_page(&mut self, page_index: u32, scale: f32) -> crate::error::Result<DynamicImage>;

    /// Names of the page's image paint operands, in paint order. Meaningful
    /// after [`PageRenderer::render_page`] has materialized the page.
    fn paint_image_operands(&mut self, page_index: u32) -> crate::error::Result<Vec<String>>;

    /// Resolve one paint operand to raster data, first from the synchronous
    /// caches, then waiting at most until `deadline`. `None` means the operand
    /// could not be resolved in time and is abandoned, not retried.
    fn resolve_image(
        &mut self,
        page_index: u32,
        name: &str,
        deadline: Instant,
    ) -> Option<ResolvedImage>;

    /// Release resources tied to a completed page, bounding peak memory to
    /// roughly one page's raster surface.
    fn release_page(&mut self, page_index: u32);
}
