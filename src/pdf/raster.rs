// Raster XObject records and the stream decoder that turns their stored
// bytes into storable payloads.

use std::io::{Cursor, Read};

use flate2::read::ZlibDecoder;
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use lopdf::Object;
use tracing::debug;

/// Where a raster record came from. Fingerprints are namespaced by provenance
/// because the two extraction strategies produce structurally different
/// identifiers for the same logical image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Resource-dictionary stream object found by the walker.
    WalkedObject,
    /// Raw `{data, width, height}` buffer recovered by the harvester.
    HarvestedRaw,
    /// Pre-decoded bitmap surface recovered by the harvester.
    HarvestedBitmap,
}

impl Provenance {
    pub(crate) fn namespace(self) -> &'static str {
        match self {
            Provenance::WalkedObject => "walk/raw",
            Provenance::HarvestedRaw => "harvest/raw",
            Provenance::HarvestedBitmap => "harvest/bitmap",
        }
    }
}

/// One raster image object as discovered inside the document, before decoding.
#[derive(Debug, Clone)]
pub struct RasterObjectRecord {
    /// 1-based page the object was reached from.
    pub page_number: u32,
    /// Resource key or paint operand the object was referenced by.
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub color_space_hint: String,
    pub bits_per_component: u8,
    /// Declared filter names in application order. Empty for unfiltered streams.
    pub filter_chain: Vec<String>,
    pub raw_bytes: Vec<u8>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Gray,
    Rgb,
    Rgba,
}

impl ChannelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ChannelLayout::Gray => 1,
            ChannelLayout::Rgb => 3,
            ChannelLayout::Rgba => 4,
        }
    }
}

/// Uncompressed 8-bit pixel data produced by the decoder.
#[derive(Debug, Clone)]
pub struct DecodedPixelBuffer {
    pub width: u32,
    pub height: u32,
    pub layout: ChannelLayout,
    pub samples: Vec<u8>,
}

impl DecodedPixelBuffer {
    /// Convert to an RGBA image, synthesizing fully opaque alpha where the
    /// source carries none.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        let img = match self.layout {
            ChannelLayout::Rgba => {
                return RgbaImage::from_raw(self.width, self.height, self.samples.clone());
            }
            ChannelLayout::Rgb => DynamicImage::ImageRgb8(RgbImage::from_raw(
                self.width,
                self.height,
                self.samples.clone(),
            )?),
            ChannelLayout::Gray => DynamicImage::ImageLuma8(GrayImage::from_raw(
                self.width,
                self.height,
                self.samples.clone(),
            )?),
        };
        Some(img.to_rgba8())
    }

    /// Encode as PNG bytes.
    pub fn to_png(&self) -> crate::error::Result<Vec<u8>> {
        let img = match self.layout {
            ChannelLayout::Gray => {
                GrayImage::from_raw(self.width, self.height, self.samples.clone())
                    .map(DynamicImage::ImageLuma8)
            }
            ChannelLayout::Rgb => RgbImage::from_raw(self.width, self.height, self.samples.clone())
                .map(DynamicImage::ImageRgb8),
            ChannelLayout::Rgba => {
                RgbaImage::from_raw(self.width, self.height, self.samples.clone())
                    .map(DynamicImage::ImageRgba8)
            }
        }
        .ok_or_else(|| {
            crate::error::PdfImagingError::encode("pixel buffer shorter than its declared geometry")
        })?;

        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png)?;
        Ok(buf.into_inner())
    }
}

/// Outcome of decoding one record's stored bytes.
#[derive(Debug, Clone)]
pub enum DecodedStream {
    /// Directly-storable compressed payload (baseline JPEG); no pixel work done.
    Passthrough(Vec<u8>),
    /// Decompressed and reinterpreted pixel data.
    Pixels(DecodedPixelBuffer),
    /// Unrecognized filter chain, passed through with no format guarantee.
    Opaque(Vec<u8>),
}

/// Decode a record according to its declared filter chain.
///
/// Returns `None` as a skip signal for malformed or unsupported records
/// (wrong bit depth, unmatched buffer length, zero dimensions); such records
/// are dropped without failing the surrounding extraction.
pub fn decode(record: &RasterObjectRecord) -> Option<DecodedStream> {
    if record.width == 0 || record.height == 0 {
        debug!(
            page = record.page_number,
            name = %record.name,
            "skipping raster object with zero dimension"
        );
        return None;
    }

    if record.filter_chain.iter().any(|f| f == "DCTDecode") {
        return Some(DecodedStream::Passthrough(record.raw_bytes.clone()));
    }

    if record.filter_chain.iter().any(|f| f == "FlateDecode") {
        if record.bits_per_component != 8 {
            debug!(
                page = record.page_number,
                name = %record.name,
                bits = record.bits_per_component,
                "skipping raster object with unsupported bit depth"
            );
            return None;
        }
        let mut decoder = ZlibDecoder::new(record.raw_bytes.as_slice());
        let mut decompressed = Vec::new();
        if let Err(e) = decoder.read_to_end(&mut decompressed) {
            debug!(
                page = record.page_number,
                name = %record.name,
                error = %e,
                "skipping raster object with undecodable flate stream"
            );
            return None;
        }
        return reinterpret_channels(
            &decompressed,
            record.width,
            record.height,
            &record.color_space_hint,
        )
        .map(DecodedStream::Pixels)
        .or_else(|| {
            debug!(
                page = record.page_number,
                name = %record.name,
                len = decompressed.len(),
                "skipping raster object whose buffer matches no channel layout"
            );
            None
        });
    }

    if record.filter_chain.is_empty() {
        // Unfiltered streams hold raw pixels directly.
        if record.bits_per_component != 8 {
            debug!(
                page = record.page_number,
                name = %record.name,
                bits = record.bits_per_component,
                "skipping raster object with unsupported bit depth"
            );
            return None;
        }
        return reinterpret_channels(
            &record.raw_bytes,
            record.width,
            record.height,
            &record.color_space_hint,
        )
        .map(DecodedStream::Pixels);
    }

    // Anything else (CCITT, JBIG2, JPX, ...) is an unknown binary payload.
    Some(DecodedStream::Opaque(record.raw_bytes.clone()))
}

/// Select a channel layout for an uncompressed buffer.
///
/// An exact length match against `width*height*{3,1,4}` is preferred; the
/// color-space name hint (`RGB`, `Gray`/`Grey` substrings) is consulted only
/// when no length matches exactly, accepting over-long buffers. The buffer is
/// then truncated to the layout's exact size.
pub fn reinterpret_channels(
    data: &[u8],
    width: u32,
    height: u32,
    color_space_hint: &str,
) -> Option<DecodedPixelBuffer> {
    let pixels = (width as usize).checked_mul(height as usize)?;
    if pixels == 0 {
        return None;
    }

    let layout = if data.len() == pixels * 3 {
        ChannelLayout::Rgb
    } else if data.len() == pixels {
        ChannelLayout::Gray
    } else if data.len() == pixels * 4 {
        ChannelLayout::Rgba
    } else if color_space_hint.contains("RGB") && data.len() >= pixels * 3 {
        ChannelLayout::Rgb
    } else if (color_space_hint.contains("Gray") || color_space_hint.contains("Grey"))
        && data.len() >= pixels
    {
        ChannelLayout::Gray
    } else {
        return None;
    };

    let exact = pixels * layout.bytes_per_pixel();
    Some(DecodedPixelBuffer {
        width,
        height,
        layout,
        samples: data[..exact].to_vec(),
    })
}

/// Read a walker record from an image XObject stream.
///
/// Returns `None` when the declared geometry is unusable; dictionary defaults
/// follow the PDF conventions (missing `BitsPerComponent` means 8).
pub fn record_from_stream(
    page_number: u32,
    name: &str,
    stream: &lopdf::Stream,
) -> Option<RasterObjectRecord> {
    let dict = &stream.dict;

    let width = dict_get_u32(dict, b"Width")?;
    let height = dict_get_u32(dict, b"Height")?;
    if width == 0 || height == 0 {
        debug!(page = page_number, name, "ignoring image XObject with zero dimension");
        return None;
    }

    let bits_per_component = match dict.get(b"BitsPerComponent") {
        Ok(_) => dict_get_u32(dict, b"BitsPerComponent")? as u8,
        Err(_) => 8,
    };

    let color_space_hint = match dict.get(b"ColorSpace") {
        Ok(Object::Name(n)) => String::from_utf8_lossy(n).into_owned(),
        _ => String::new(),
    };

    Some(RasterObjectRecord {
        page_number,
        name: name.to_owned(),
        width,
        height,
        color_space_hint,
        bits_per_component,
        filter_chain: filter_chain(dict),
        raw_bytes: stream.content.clone(),
        provenance: Provenance::WalkedObject,
    })
}

/// Declared filter names of a stream dictionary, in application order.
pub fn filter_chain(dict: &lopdf::Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![String::from_utf8_lossy(n).into_owned()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|obj| match obj {
                Object::Name(n) => Some(String::from_utf8_lossy(n).into_owned()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn dict_get_u32(dict: &lopdf::Dictionary, key: &[u8]) -> Option<u32> {
    match dict.get(key) {
        Ok(Object::Integer(i)) if (0..=u32::MAX as i64).contains(i) => Some(*i as u32),
        Ok(Object::Real(f)) if (0.0..=u32::MAX as f32).contains(f) => Some(*f as u32),
        _ => None,
    }
}
