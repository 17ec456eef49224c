// Fallback strategy: replay page paint operations through the rendering
// engine's object caches to recover images the object walk could not reach.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use image::RgbaImage;
use tracing::{debug, warn};

use super::{ExtractedFormat, ExtractedImage, ExtractionContext, ExtractionStrategy, StrategyOutcome};
use crate::pdf::raster::{
    self, ChannelLayout, DecodedPixelBuffer, Provenance, RasterObjectRecord,
};
use crate::render::ResolvedImage;

/// Recovers raster operands by rendering each page (which materializes the
/// engine's caches) and resolving every distinct image paint operand at most
/// once per page, under a bounded deadline. Page resources are released after
/// each page's harvest completes.
pub struct HarvestStrategy;

impl ExtractionStrategy for HarvestStrategy {
    fn name(&self) -> &'static str {
        "paint-harvest"
    }

    fn extract(
        &self,
        ctx: &mut ExtractionContext<'_>,
        pages: &BTreeSet<u32>,
    ) -> crate::error::Result<StrategyOutcome> {
        let Some(engine) = ctx.engine else {
            debug!("no rendering engine configured; harvest unavailable");
            return Ok(StrategyOutcome::default());
        };

        let mut renderer = engine.open(ctx.pdf_bytes)?;
        let mut outcome = StrategyOutcome::default();

        for &page_number in pages {
            let page_index = page_number - 1;
            if page_index >= renderer.page_count() {
                continue;
            }

            // A full render forces materialization of every raster operand
            // the page paints.
            if let Err(e) = renderer.render_page(page_index, 1.0) {
                warn!(page = page_number, error = %e, "page render failed; skipping harvest");
                continue;
            }

            let operands = match renderer.paint_image_operands(page_index) {
                Ok(operands) => operands,
                Err(e) => {
                    warn!(page = page_number, error = %e, "could not list paint operands");
                    renderer.release_page(page_index);
                    continue;
                }
            };

            let mut resolved_names: HashSet<String> = HashSet::new();
            for name in operands {
                if !resolved_names.insert(name.clone()) {
                    continue;
                }

                let deadline = Instant::now() + ctx.resolve_timeout;
                let Some(resolved) = renderer.resolve_image(page_index, &name, deadline) else {
                    debug!(page = page_number, name = %name, "operand unresolved before deadline; abandoned");
                    continue;
                };

                let Some((record, rgba)) = materialize(page_number, &name, resolved) else {
                    continue;
                };

                if !ctx.dedup.should_emit(&record) {
                    outcome.covered_pages.insert(page_number);
                    continue;
                }

                match encode_png(&rgba) {
                    Ok(bytes) => {
                        outcome.covered_pages.insert(page_number);
                        outcome.images.push(ExtractedImage {
                            page_number,
                            format: ExtractedFormat::Png,
                            bytes,
                        });
                    }
                    Err(e) => {
                        debug!(page = page_number, name = %name, error = %e, "harvested image failed PNG encoding");
                    }
                }
            }

            renderer.release_page(page_index);
        }

        Ok(outcome)
    }
}

/// Turn a resolved operand into a dedup record plus an RGBA surface.
///
/// Bitmap surfaces are copied onto a freshly sized canvas; raw buffers are
/// reinterpreted with the same RGB/Gray/RGBA length-matching rule the stream
/// decoder uses, with missing alpha synthesized opaque.
fn materialize(
    page_number: u32,
    name: &str,
    resolved: ResolvedImage,
) -> Option<(RasterObjectRecord, RgbaImage)> {
    match resolved {
        ResolvedImage::Bitmap(bitmap) => {
            let (width, height) = bitmap.dimensions();
            if width == 0 || height == 0 {
                debug!(page = page_number, name, "discarding zero-sized bitmap operand");
                return None;
            }
            let mut canvas = RgbaImage::new(width, height);
            image::imageops::replace(&mut canvas, &bitmap, 0, 0);

            let record = RasterObjectRecord {
                page_number,
                name: name.to_owned(),
                width,
                height,
                color_space_hint: String::new(),
                bits_per_component: 8,
                filter_chain: Vec::new(),
                raw_bytes: canvas.as_raw().clone(),
                provenance: Provenance::HarvestedBitmap,
            };
            Some((record, canvas))
        }
        ResolvedImage::Raw {
            data,
            width,
            height,
        } => {
            let buffer: DecodedPixelBuffer = raster::reinterpret_channels(&data, width, height, "")
                .or_else(|| {
                    debug!(
                        page = page_number,
                        name,
                        len = data.len(),
                        "raw operand matches no channel layout"
                    );
                    None
                })?;
            let rgba = buffer.to_rgba_image()?;

            let record = RasterObjectRecord {
                page_number,
                name: name.to_owned(),
                width,
                height,
                color_space_hint: String::new(),
                bits_per_component: 8,
                filter_chain: Vec::new(),
                raw_bytes: data,
                provenance: Provenance::HarvestedRaw,
            };
            Some((record, rgba))
        }
    }
}

fn encode_png(rgba: &RgbaImage) -> crate::error::Result<Vec<u8>> {
    DecodedPixelBuffer {
        width: rgba.width(),
        height: rgba.height(),
        layout: ChannelLayout::Rgba,
        samples: rgba.as_raw().clone(),
    }
    .to_png()
}
