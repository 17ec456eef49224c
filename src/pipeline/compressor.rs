// Whole-document recompression: every page rendered and re-encoded as one
// full-bleed JPEG, metadata scrubbed.

use tracing::warn;

use crate::config::CompressionOptions;
use crate::pdf::reader::PdfReader;
use crate::pdf::writer::ImagePageWriter;
use crate::pipeline::page_raster::{self, PageRasterJob, WHITE};
use crate::render::RenderEngine;

/// Re-encode `pdf_bytes` as a document of lossy full-page images.
///
/// Pages are processed one at a time in ascending order. Capture resolution
/// comes from `options.dpi`; assembled page geometry is the source page's
/// untransformed size at scale 1, read from the document itself and decoupled
/// from the capture resolution. A page whose render or encode fails is
/// omitted from the output rather than aborting the document; the operation
/// fails only when no page could be processed at all.
pub fn compress_document(
    pdf_bytes: &[u8],
    options: &CompressionOptions,
    engine: &dyn RenderEngine,
) -> crate::error::Result<Vec<u8>> {
    options.validate()?;

    let reader = PdfReader::from_bytes(pdf_bytes)?;
    let mut renderer = engine.open(pdf_bytes)?;
    let quality = options.effective_quality();
    let scale = options.render_scale();

    let mut writer = ImagePageWriter::new();

    for page_number in reader.page_numbers() {
        let page_index = page_number - 1;
        if page_index >= renderer.page_count() {
            warn!(page = page_number, "page unknown to the rendering engine; omitted");
            continue;
        }

        let (width_pts, height_pts) = match reader.page_dimensions(page_number) {
            Ok(dims) => dims,
            Err(e) => {
                warn!(page = page_number, error = %e, "page geometry unusable; page omitted");
                continue;
            }
        };

        let job = PageRasterJob {
            page_index,
            target_scale: scale,
            output_quality: quality,
            color_background: WHITE,
        };

        let encoded = match page_raster::render_page_image(renderer.as_mut(), &job) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(page = page_number, error = %e, "page render failed; page omitted");
                continue;
            }
        };

        writer.add_page(&encoded, width_pts, height_pts)?;
        renderer.release_page(page_index);
    }

    if writer.page_count() == 0 {
        return Err(crate::error::PdfImagingError::render(
            "no page of the document could be rendered",
        ));
    }

    writer.finish_to_bytes()
}
