// Page rasterization and lossy re-encoding.

use std::io::Cursor;

use image::{DynamicImage, RgbImage};

use crate::render::PageRenderer;

pub const WHITE: [u8; 3] = [255, 255, 255];

/// Contract between a page source and the rasterization pipeline: one job
/// yields exactly one encoded page image.
#[derive(Debug, Clone, Copy)]
pub struct PageRasterJob {
    /// 0-based page index.
    pub page_index: u32,
    /// Render scale (1.0 = 72 dpi).
    pub target_scale: f32,
    /// JPEG quality, 1-100. Callers apply any policy floor before building
    /// the job.
    pub output_quality: u8,
    /// Backing color the rendered surface is flattened onto. White, so that
    /// transparent source content does not turn into a black background.
    pub color_background: [u8; 3],
}

/// One re-encoded page image.
#[derive(Debug, Clone)]
pub struct EncodedPageImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Render one page and re-encode it as JPEG.
pub fn render_page_image(
    renderer: &mut dyn PageRenderer,
    job: &PageRasterJob,
) -> crate::error::Result<EncodedPageImage> {
    let rendered = renderer.render_page(job.page_index, job.target_scale)?;
    let flattened = flatten_onto_background(&rendered, job.color_background);
    let bytes = encode_jpeg(&flattened, job.output_quality)?;
    Ok(EncodedPageImage {
        bytes,
        width: flattened.width(),
        height: flattened.height(),
    })
}

/// Alpha-composite a rendered surface onto an opaque background.
pub fn flatten_onto_background(image: &DynamicImage, background: [u8; 3]) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());

    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u16;
        let blend = |fg: u8, bg: u8| -> u8 {
            ((fg as u16 * alpha + bg as u16 * (255 - alpha)) / 255) as u8
        };
        out.put_pixel(
            x,
            y,
            image::Rgb([
                blend(r, background[0]),
                blend(g, background[1]),
                blend(b, background[2]),
            ]),
        );
    }

    out
}

/// Encode an RGB surface as baseline JPEG at the given quality (1-100).
pub fn encode_jpeg(rgb: &RgbImage, quality: u8) -> crate::error::Result<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(crate::error::PdfImagingError::encode(format!(
            "JPEG quality must be 1-100, got {}",
            quality
        )));
    }

    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn test_flatten_transparent_pixels_become_background() {
        let mut rgba = RgbaImage::new(2, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 0]));
        rgba.put_pixel(1, 0, image::Rgba([10, 20, 30, 255]));

        let flat = flatten_onto_background(&DynamicImage::ImageRgba8(rgba), WHITE);
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(flat.get_pixel(1, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_flatten_blends_partial_alpha() {
        let mut rgba = RgbaImage::new(1, 1);
        rgba.put_pixel(0, 0, image::Rgba([0, 0, 0, 128]));

        let flat = flatten_onto_background(&DynamicImage::ImageRgba8(rgba), WHITE);
        let [r, g, b] = flat.get_pixel(0, 0).0;
        // Half-transparent black over white lands near mid gray.
        assert!((126..=129).contains(&r));
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_encode_jpeg_rejects_invalid_quality() {
        let rgb = RgbImage::new(4, 4);
        assert!(encode_jpeg(&rgb, 0).is_err());
        assert!(encode_jpeg(&rgb, 101).is_err());
        assert!(encode_jpeg(&rgb, 1).is_ok());
    }

    #[test]
    fn test_encode_jpeg_produces_jfif_payload() {
        let rgb = RgbImage::from_pixel(8, 8, image::Rgb([200, 100, 50]));
        let bytes = encode_jpeg(&rgb, 80).expect("encode");
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
