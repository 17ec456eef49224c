// pdfium-render wrapper: in-memory page rendering and image-object recovery.

use std::path::PathBuf;
use std::time::Instant;

use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::debug;

use super::{PageRenderer, RenderEngine, ResolvedImage};

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `vendor/pdfium/lib/` relative to the project root (for development)
fn resolve_pdfium_lib_path() -> crate::error::Result<PathBuf> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(p);
        }
        return Err(crate::error::PdfImagingError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{}' but the path does not exist",
            path
        )));
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor_path = PathBuf::from(&manifest_dir).join("vendor/pdfium/lib");
        if vendor_path.exists() {
            return Ok(vendor_path);
        }
    }

    Err(crate::error::PdfImagingError::render(
        "pdfium library not found: set PDFIUM_DYNAMIC_LIB_PATH or place libpdfium.so in vendor/pdfium/lib/",
    ))
}

fn create_pdfium() -> crate::error::Result<Pdfium> {
    let lib_path = resolve_pdfium_lib_path()?;
    let lib_path_str = lib_path.to_str().ok_or_else(|| {
        crate::error::PdfImagingError::render("pdfium library path contains non-UTF-8 characters")
    })?;
    let bindings =
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))
            .map_err(|e| crate::error::PdfImagingError::render(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

/// Rendering engine backed by a dynamically loaded pdfium library.
///
/// Initialized once at startup; documents are reopened from their byte
/// payload per call, so no per-page state outlives a method invocation.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    pub fn new() -> crate::error::Result<Self> {
        Ok(Self {
            pdfium: create_pdfium()?,
        })
    }
}

impl RenderEngine for PdfiumEngine {
    fn open<'a>(&'a self, pdf_bytes: &[u8]) -> crate::error::Result<Box<dyn PageRenderer + 'a>> {
        let bytes = pdf_bytes.to_vec();
        let page_count = {
            let document = self
                .pdfium
                .load_pdf_from_byte_slice(&bytes, None)
                .map_err(|e| crate::error::PdfImagingError::render(e.to_string()))?;
            document.pages().len() as u32
        };
        Ok(Box::new(PdfiumPageRenderer {
            pdfium: &self.pdfium,
            bytes,
            page_count,
        }))
    }
}

struct PdfiumPageRenderer<'a> {
    pdfium: &'a Pdfium,
    bytes: Vec<u8>,
    page_count: u32,
}

impl PdfiumPageRenderer<'_> {
    fn with_page<T>(
        &self,
        page_index: u32,
        f: impl FnOnce(&PdfPage) -> crate::error::Result<T>,
    ) -> crate::error::Result<T> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(&self.bytes, None)
            .map_err(|e| crate::error::PdfImagingError::render(e.to_string()))?;

        let page_index_u16 = u16::try_from(page_index)
            .map_err(|_| crate::error::PdfImagingError::render("page index exceeds u16 range"))?;
        let page = document
            .pages()
            .get(page_index_u16)
            .map_err(|e| crate::error::PdfImagingError::render(e.to_string()))?;

        f(&page)
    }
}

impl PageRenderer for PdfiumPageRenderer<'_> {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render_page(&mut self, page_index: u32, scale: f32) -> crate::error::Result<DynamicImage> {
        self.with_page(page_index, |page| {
            // PDF default user unit: 1 point = 1/72 inch. At scale 1 each
            // point maps to one pixel.
            let width_px = (page.width().value * scale).round() as i32;
            let height_px = (page.height().value * scale).round() as i32;

            let config = PdfRenderConfig::new()
                .set_target_width(width_px)
                .set_target_height(height_px);

            let bitmap = page
                .render_with_config(&config)
                .map_err(|e| crate::error::PdfImagingError::render(e.to_string()))?;

            Ok(bitmap.as_image())
        })
    }

    fn paint_image_operands(&mut self, page_index: u32) -> crate::error::Result<Vec<String>> {
        self.with_page(page_index, |page| {
            let mut names = Vec::new();
            for (i, object) in page.objects().iter().enumerate() {
                if matches!(object, PdfPageObject::Image(_)) {
                    // pdfium does not expose resource names; index-based
                    // operand identifiers are stable within one page.
                    names.push(format!("Im{i}"));
                }
            }
            Ok(names)
        })
    }

    fn resolve_image(
        &mut self,
        page_index: u32,
        name: &str,
        deadline: Instant,
    ) -> Option<ResolvedImage> {
        if Instant::now() >= deadline {
            debug!(page_index, name, "resolution deadline already expired");
            return None;
        }

        let object_index: usize = name.strip_prefix("Im")?.parse().ok()?;

        let result = self.with_page(page_index, |page| {
            for (i, object) in page.objects().iter().enumerate() {
                if i != object_index {
                    continue;
                }
                if let PdfPageObject::Image(ref image_object) = object {
                    let bitmap = image_object
                        .get_raw_bitmap()
                        .map_err(|e| crate::error::PdfImagingError::render(e.to_string()))?;
                    return Ok(Some(bitmap.as_image().to_rgba8()));
                }
            }
            Ok(None)
        });

        match result {
            Ok(Some(bitmap)) => Some(ResolvedImage::Bitmap(bitmap)),
            Ok(None) => None,
            Err(e) => {
                debug!(page_index, name, error = %e, "paint operand resolution failed");
                None
            }
        }
    }

    fn release_page(&mut self, _page_index: u32) {
        // Documents are reopened per call; nothing is retained across pages.
    }
}
