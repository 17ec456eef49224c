// Direct strategy: walk each page's resource dictionary for image XObjects.

use std::collections::BTreeSet;

use tracing::debug;

use super::{ExtractedFormat, ExtractedImage, ExtractionContext, ExtractionStrategy, StrategyOutcome};
use crate::pdf::raster::{self, DecodedStream};

/// Enumerates raster image objects reachable from page resources, in page
/// order then resource-dictionary insertion order. The source document is
/// never mutated.
///
/// A page counts as covered once any of its records is accepted by the
/// deduplicator, whether emitted or suppressed as a duplicate: suppressed
/// content is already in the archive, so the fallback harvester must not
/// recover it again under another provenance.
pub struct WalkStrategy;

impl ExtractionStrategy for WalkStrategy {
    fn name(&self) -> &'static str {
        "object-walk"
    }

    fn extract(
        &self,
        ctx: &mut ExtractionContext<'_>,
        pages: &BTreeSet<u32>,
    ) -> crate::error::Result<StrategyOutcome> {
        let mut outcome = StrategyOutcome::default();

        for &page_number in pages {
            let entries = match ctx.reader.page_image_xobjects(page_number) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!(page = page_number, error = %e, "skipping unreadable page resources");
                    continue;
                }
            };

            for (name, stream) in entries {
                let Some(record) = raster::record_from_stream(page_number, &name, stream) else {
                    continue;
                };

                if !ctx.dedup.should_emit(&record) {
                    outcome.covered_pages.insert(page_number);
                    continue;
                }

                let Some(decoded) = raster::decode(&record) else {
                    continue;
                };

                let (format, bytes) = match decoded {
                    DecodedStream::Passthrough(bytes) => (ExtractedFormat::Jpeg, bytes),
                    DecodedStream::Pixels(buffer) => match buffer.to_png() {
                        Ok(bytes) => (ExtractedFormat::Png, bytes),
                        Err(e) => {
                            debug!(
                                page = page_number,
                                name = %record.name,
                                error = %e,
                                "skipping image that failed PNG encoding"
                            );
                            continue;
                        }
                    },
                    DecodedStream::Opaque(bytes) => (ExtractedFormat::Bin, bytes),
                };

                outcome.covered_pages.insert(page_number);
                outcome.images.push(ExtractedImage {
                    page_number,
                    format,
                    bytes,
                });
            }
        }

        Ok(outcome)
    }
}
