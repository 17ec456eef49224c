//! Image extraction: ordered strategies over one loaded document.
//!
//! The direct object-model walk runs first; the render-based harvester covers
//! only the pages the walk found no acceptable raster record on. A page whose
//! records were all suppressed as duplicates counts as covered. Extraction
//! fails with a single terminal error only when every strategy produced zero
//! images.

pub mod archive;
pub mod dedup;
pub mod harvester;
pub mod walker;

use std::collections::BTreeSet;
use std::time::Duration;

use tracing::{debug, warn};

use crate::pdf::reader::PdfReader;
use crate::render::RenderEngine;
use dedup::Deduplicator;
use harvester::HarvestStrategy;
use walker::WalkStrategy;

/// How long one paint-operand resolution may wait before the operand is
/// abandoned.
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Payload format of one extracted image, which decides the archive entry
/// extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractedFormat {
    /// Pass-through JPEG-filtered stream.
    Jpeg,
    /// Decoded raster buffer, re-encoded as PNG.
    Png,
    /// Unrecognized filter payload, stored verbatim.
    Bin,
}

impl ExtractedFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExtractedFormat::Jpeg => "jpg",
            ExtractedFormat::Png => "png",
            ExtractedFormat::Bin => "bin",
        }
    }
}

/// One image ready for archiving.
#[derive(Debug, Clone)]
pub struct ExtractedImage {
    /// 1-based source page.
    pub page_number: u32,
    pub format: ExtractedFormat,
    pub bytes: Vec<u8>,
}

/// Shared state for one extraction run. The deduplicator spans strategies so
/// the accepted/rejected decision sequence is a property of the whole run.
pub struct ExtractionContext<'a> {
    pub reader: &'a PdfReader,
    pub pdf_bytes: &'a [u8],
    pub engine: Option<&'a dyn RenderEngine>,
    pub resolve_timeout: Duration,
    pub dedup: Deduplicator,
}

/// What one strategy recovered from its assigned pages.
///
/// `covered_pages` marks pages the strategy found acceptable raster content
/// on, including records the deduplicator suppressed as duplicates of already
/// emitted content. Later strategies skip covered pages entirely.
#[derive(Debug, Default)]
pub struct StrategyOutcome {
    pub images: Vec<ExtractedImage>,
    pub covered_pages: BTreeSet<u32>,
}

/// One way of recovering raster images from a document. Strategies are tried
/// in a fixed order; each receives only the pages its predecessors left
/// uncovered.
pub trait ExtractionStrategy {
    fn name(&self) -> &'static str;

    fn extract(
        &self,
        ctx: &mut ExtractionContext<'_>,
        pages: &BTreeSet<u32>,
    ) -> crate::error::Result<StrategyOutcome>;
}

/// Extract every distinct raster image of `pdf_bytes` into a zip archive.
///
/// Entries are named `image_{sequence}_page{page}.{jpg|png|bin}` in ascending
/// `(page, discovery)` order. Without an engine, only the direct walk runs.
/// Returns [`crate::error::PdfImagingError::NoImagesFound`] when no strategy
/// recovered anything; all per-object failures are absorbed earlier.
pub fn extract_images(
    pdf_bytes: &[u8],
    engine: Option<&dyn RenderEngine>,
    resolve_timeout: Duration,
) -> crate::error::Result<Vec<u8>> {
    let reader = PdfReader::from_bytes(pdf_bytes)?;
    let page_numbers: BTreeSet<u32> = reader.page_numbers().into_iter().collect();

    let mut ctx = ExtractionContext {
        reader: &reader,
        pdf_bytes,
        engine,
        resolve_timeout,
        dedup: Deduplicator::new(),
    };

    let strategies: [&dyn ExtractionStrategy; 2] = [&WalkStrategy, &HarvestStrategy];

    let mut images: Vec<ExtractedImage> = Vec::new();
    let mut uncovered = page_numbers;

    for strategy in strategies {
        if uncovered.is_empty() {
            break;
        }
        match strategy.extract(&mut ctx, &uncovered) {
            Ok(outcome) => {
                debug!(
                    strategy = strategy.name(),
                    images = outcome.images.len(),
                    covered = outcome.covered_pages.len(),
                    "extraction strategy finished"
                );
                for page in &outcome.covered_pages {
                    uncovered.remove(page);
                }
                images.extend(outcome.images);
            }
            // A failing strategy leaves its pages to the next one.
            Err(e) => warn!(strategy = strategy.name(), error = %e, "extraction strategy failed"),
        }
    }

    if images.is_empty() {
        return Err(crate::error::PdfImagingError::NoImagesFound);
    }

    // Stable by page; within a page, discovery order is already correct.
    images.sort_by_key(|image| image.page_number);
    archive::build_archive(&images)
}
