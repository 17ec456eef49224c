use std::path::Path;

use serde::Deserialize;

/// Lowest JPEG quality applied when `full_page_mode` is off.
///
/// Graphics-heavy pages degrade visibly below this point, so caller-requested
/// qualities under the floor are raised to it. Full-page mode carries no floor.
pub const GRAPHICS_QUALITY_FLOOR: u8 = 30;

pub const QUALITY_MIN: u8 = 1;
pub const QUALITY_MAX: u8 = 100;
pub const DPI_MIN: u32 = 36;
pub const DPI_MAX: u32 = 600;

/// Options for whole-document recompression and capture-to-document assembly.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CompressionOptions {
    /// JPEG quality, 1-100.
    pub image_quality: u8,
    /// Capture resolution in dots per inch, 36-600. Affects encoded sharpness
    /// only; assembled page dimensions always follow the source page at scale 1.
    pub dpi: u32,
    /// `true`: pure lossy full-page re-encoding at the requested quality.
    /// `false`: quality is floored at [`GRAPHICS_QUALITY_FLOOR`].
    pub full_page_mode: bool,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        CompressionOptions {
            image_quality: 50,
            dpi: 150,
            full_page_mode: true,
        }
    }
}

impl CompressionOptions {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let options: CompressionOptions = serde_yml::from_str(yaml).map_err(|e| {
            crate::error::PdfImagingError::config(format!("Failed to parse options YAML: {e}"))
        })?;
        options.validate()?;
        Ok(options)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if !(QUALITY_MIN..=QUALITY_MAX).contains(&self.image_quality) {
            return Err(crate::error::PdfImagingError::config(format!(
                "image_quality must be {QUALITY_MIN}-{QUALITY_MAX}, got {}",
                self.image_quality
            )));
        }
        if !(DPI_MIN..=DPI_MAX).contains(&self.dpi) {
            return Err(crate::error::PdfImagingError::config(format!(
                "dpi must be {DPI_MIN}-{DPI_MAX}, got {}",
                self.dpi
            )));
        }
        Ok(())
    }

    /// Requested quality with the graphics floor applied when applicable.
    pub fn effective_quality(&self) -> u8 {
        if self.full_page_mode {
            self.image_quality
        } else {
            self.image_quality.max(GRAPHICS_QUALITY_FLOOR)
        }
    }

    /// Render scale for the configured capture resolution (72 dpi = scale 1).
    pub fn render_scale(&self) -> f32 {
        self.dpi as f32 / 72.0
    }
}
