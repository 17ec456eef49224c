// Slicing one tall laid-out capture into fixed-height page images.

use image::{RgbImage, RgbaImage};
use tracing::warn;

use crate::config::CompressionOptions;
use crate::pdf::writer::ImagePageWriter;
use crate::pipeline::page_raster::{self, EncodedPageImage, WHITE};

/// Geometry of one capture-to-pages conversion, derived once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationPlan {
    pub total_content_height: u32,
    pub page_height: u32,
    pub page_count: u32,
}

impl PaginationPlan {
    /// `page_count = max(1, ceil(total_content_height / page_height))`.
    pub fn new(total_content_height: u32, page_height: u32) -> crate::error::Result<Self> {
        if page_height == 0 {
            return Err(crate::error::PdfImagingError::config(
                "page height must be positive",
            ));
        }
        let page_count = total_content_height.div_ceil(page_height).max(1);
        Ok(PaginationPlan {
            total_content_height,
            page_height,
            page_count,
        })
    }

    /// Drawn height of the given 0-based slice; only the final slice may be
    /// shorter than a full page.
    pub fn drawn_height(&self, slice_index: u32) -> u32 {
        let offset = slice_index * self.page_height;
        self.total_content_height
            .saturating_sub(offset)
            .min(self.page_height)
    }
}

/// Cut one full-height capture into per-page JPEG images.
///
/// Slice boundaries are purely geometric; no look-ahead avoids splitting a
/// paragraph or table row. Each slice is composited onto a fresh white canvas
/// of exactly one page's pixel size; a short final slice leaves the remainder
/// white.
pub fn slice_capture(
    capture: &RgbaImage,
    plan: &PaginationPlan,
    quality: u8,
) -> crate::error::Result<Vec<EncodedPageImage>> {
    if capture.width() == 0 {
        return Err(crate::error::PdfImagingError::encode(
            "capture has zero width",
        ));
    }

    let mut pages = Vec::with_capacity(plan.page_count as usize);

    for slice_index in 0..plan.page_count {
        let top = slice_index * plan.page_height;
        let drawn = plan
            .drawn_height(slice_index)
            .min(capture.height().saturating_sub(top));

        let mut canvas = RgbImage::from_pixel(capture.width(), plan.page_height, image::Rgb(WHITE));
        for y in 0..drawn {
            for x in 0..capture.width() {
                let [r, g, b, a] = capture.get_pixel(x, top + y).0;
                let alpha = a as u16;
                let blend = |fg: u8| -> u8 {
                    ((fg as u16 * alpha + 255u16 * (255 - alpha)) / 255) as u8
                };
                canvas.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
            }
        }

        let bytes = page_raster::encode_jpeg(&canvas, quality)?;
        pages.push(EncodedPageImage {
            bytes,
            width: canvas.width(),
            height: canvas.height(),
        });
    }

    Ok(pages)
}

/// Assemble a document from one full-height markup capture.
///
/// The capture is sliced at `page_height_px` (derived from the page geometry
/// at `options.dpi`), each slice re-encoded at the effective quality, and the
/// slices written as pages of `page_width_pts` x `page_height_pts`.
pub fn capture_to_document(
    capture: &RgbaImage,
    page_width_pts: f64,
    page_height_pts: f64,
    options: &CompressionOptions,
) -> crate::error::Result<Vec<u8>> {
    options.validate()?;
    if page_width_pts <= 0.0 || page_height_pts <= 0.0 {
        return Err(crate::error::PdfImagingError::config(
            "page dimensions must be positive",
        ));
    }

    let page_height_px = (page_height_pts * options.dpi as f64 / 72.0).round().max(1.0) as u32;
    let plan = PaginationPlan::new(capture.height(), page_height_px)?;

    let slices = slice_capture(capture, &plan, options.effective_quality())?;

    let mut writer = ImagePageWriter::new();
    for (i, slice) in slices.iter().enumerate() {
        if let Err(e) = writer.add_page(slice, page_width_pts, page_height_pts) {
            warn!(slice = i, error = %e, "slice could not be written; page omitted");
        }
    }
    writer.finish_to_bytes()
}
