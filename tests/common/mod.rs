// Shared test support: a scripted rendering engine and lopdf-built test
// documents. All test PDFs are generated dynamically (no committed fixtures).

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{DynamicImage, RgbImage, RgbaImage};
use lopdf::{Document, Object, Stream, dictionary};

use pdf_imaging::render::{PageRenderer, RenderEngine, ResolvedImage};

// ============================================================
// Scripted rendering engine
// ============================================================

/// What one scripted paint operand resolves to.
pub enum FakeOperand {
    Bitmap(RgbaImage),
    Raw {
        data: Vec<u8>,
        width: u32,
        height: u32,
    },
    /// Blocks until the caller's deadline and never produces data.
    NeverResolves,
}

/// One scripted page.
pub struct FakePage {
    pub size_pts: (f32, f32),
    pub fill: [u8; 4],
    pub paint_images: Vec<(String, FakeOperand)>,
    pub fail_render: bool,
}

impl FakePage {
    pub fn blank(width_pts: f32, height_pts: f32) -> Self {
        FakePage {
            size_pts: (width_pts, height_pts),
            fill: [255, 255, 255, 255],
            paint_images: Vec::new(),
            fail_render: false,
        }
    }

    pub fn filled(width_pts: f32, height_pts: f32, fill: [u8; 4]) -> Self {
        FakePage {
            fill,
            ..FakePage::blank(width_pts, height_pts)
        }
    }

    pub fn with_operand(mut self, name: &str, operand: FakeOperand) -> Self {
        self.paint_images.push((name.to_owned(), operand));
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_render = true;
        self
    }
}

/// Scripted engine with observable open/release behavior.
pub struct FakeEngine {
    pages: Vec<FakePage>,
    pub opens: Arc<Mutex<u32>>,
    pub released: Arc<Mutex<Vec<u32>>>,
}

impl FakeEngine {
    pub fn new(pages: Vec<FakePage>) -> Self {
        FakeEngine {
            pages,
            opens: Arc::new(Mutex::new(0)),
            released: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn open_count(&self) -> u32 {
        *self.opens.lock().unwrap()
    }

    pub fn released_pages(&self) -> Vec<u32> {
        self.released.lock().unwrap().clone()
    }
}

impl RenderEngine for FakeEngine {
    fn open<'a>(
        &'a self,
        _pdf_bytes: &[u8],
    ) -> pdf_imaging::Result<Box<dyn PageRenderer + 'a>> {
        *self.opens.lock().unwrap() += 1;
        Ok(Box::new(FakeRenderer {
            pages: &self.pages,
            released: Arc::clone(&self.released),
        }))
    }
}

struct FakeRenderer<'a> {
    pages: &'a [FakePage],
    released: Arc<Mutex<Vec<u32>>>,
}

impl PageRenderer for FakeRenderer<'_> {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn render_page(&mut self, page_index: u32, scale: f32) -> pdf_imaging::Result<DynamicImage> {
        let page = self
            .pages
            .get(page_index as usize)
            .ok_or_else(|| pdf_imaging::PdfImagingError::render("page index out of range"))?;
        if page.fail_render {
            return Err(pdf_imaging::PdfImagingError::render("scripted render failure"));
        }

        let width = (page.size_pts.0 * scale).round().max(1.0) as u32;
        let height = (page.size_pts.1 * scale).round().max(1.0) as u32;
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba(page.fill),
        )))
    }

    fn paint_image_operands(&mut self, page_index: u32) -> pdf_imaging::Result<Vec<String>> {
        let page = self
            .pages
            .get(page_index as usize)
            .ok_or_else(|| pdf_imaging::PdfImagingError::render("page index out of range"))?;
        Ok(page
            .paint_images
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn resolve_image(
        &mut self,
        page_index: u32,
        name: &str,
        deadline: Instant,
    ) -> Option<ResolvedImage> {
        let page = self.pages.get(page_index as usize)?;
        let (_, operand) = page.paint_images.iter().find(|(n, _)| n == name)?;

        match operand {
            FakeOperand::Bitmap(bitmap) => Some(ResolvedImage::Bitmap(bitmap.clone())),
            FakeOperand::Raw {
                data,
                width,
                height,
            } => Some(ResolvedImage::Raw {
                data: data.clone(),
                width: *width,
                height: *height,
            }),
            FakeOperand::NeverResolves => {
                std::thread::sleep(deadline.saturating_duration_since(Instant::now()));
                None
            }
        }
    }

    fn release_page(&mut self, page_index: u32) {
        self.released.lock().unwrap().push(page_index);
    }
}

// ============================================================
// Image XObject stream builders
// ============================================================

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("compress test data");
    encoder.finish().expect("finish compression")
}

fn image_stream_dict(width: u32, height: u32, color_space: &str, filter: Option<&str>) -> lopdf::Dictionary {
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
    };
    if let Some(filter) = filter {
        dict.set("Filter", Object::Name(filter.as_bytes().to_vec()));
    }
    dict
}

/// Flate-compressed DeviceRGB image stream; `seed` varies the pixel content.
pub fn flate_rgb_stream(width: u32, height: u32, seed: u8) -> Stream {
    let raw: Vec<u8> = (0..(width as usize * height as usize * 3))
        .map(|i| (i as u8).wrapping_add(seed))
        .collect();
    Stream::new(
        image_stream_dict(width, height, "DeviceRGB", Some("FlateDecode")),
        deflate(&raw),
    )
}

/// Flate-compressed DeviceGray image stream filled with one value.
pub fn flate_gray_stream(width: u32, height: u32, value: u8) -> Stream {
    let raw = vec![value; width as usize * height as usize];
    Stream::new(
        image_stream_dict(width, height, "DeviceGray", Some("FlateDecode")),
        deflate(&raw),
    )
}

/// Real baseline JPEG payload for DCTDecode streams.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let rgb = RgbImage::from_pixel(width, height, image::Rgb([180, 90, 45]));
    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, 85);
    rgb.write_with_encoder(encoder).expect("encode test JPEG");
    buf.into_inner()
}

pub fn dct_stream(width: u32, height: u32, payload: Vec<u8>) -> Stream {
    Stream::new(
        image_stream_dict(width, height, "DeviceRGB", Some("DCTDecode")),
        payload,
    )
}

/// Image stream with a filter the decoder does not understand.
pub fn unknown_filter_stream(width: u32, height: u32, payload: Vec<u8>) -> Stream {
    Stream::new(
        image_stream_dict(width, height, "DeviceGray", Some("CCITTFaxDecode")),
        payload,
    )
}

// ============================================================
// Document builders
// ============================================================

/// Build a PDF whose pages carry the given named image XObjects. Pages are
/// Letter-sized; an empty inner vec produces a page with no images.
pub fn image_pdf(pages: Vec<Vec<(&str, Stream)>>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();

    for page_images in pages {
        let mut xobjects = lopdf::Dictionary::new();
        for (name, stream) in page_images {
            let stream_id = doc.add_object(Object::Stream(stream));
            xobjects.set(name, Object::Reference(stream_id));
        }

        let content_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, Vec::new())));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Resources" => dictionary! {
                "XObject" => Object::Dictionary(xobjects),
            },
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize test PDF");
    buf
}

/// Build a PDF of imageless pages with the given MediaBox sizes in points.
pub fn blank_pdf(sizes: &[(i64, i64)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();

    for &(width, height) in sizes {
        let content_id = doc.add_object(Object::Stream(Stream::new(dictionary! {}, Vec::new())));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width),
                Object::Integer(height),
            ],
            "Resources" => dictionary! {},
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize test PDF");
    buf
}

// ============================================================
// Archive and document inspection
// ============================================================

/// Entry names of a zip archive, in stored order.
pub fn archive_entry_names(archive_bytes: &[u8]) -> Vec<String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(archive_bytes.to_vec())).expect("open archive");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("archive entry").name().to_owned())
        .collect()
}

/// Read one named entry's bytes out of a zip archive.
pub fn archive_entry_bytes(archive_bytes: &[u8], name: &str) -> Vec<u8> {
    use std::io::Read;
    let mut archive =
        zip::ZipArchive::new(Cursor::new(archive_bytes.to_vec())).expect("open archive");
    let mut entry = archive.by_name(name).expect("archive entry by name");
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).expect("read archive entry");
    bytes
}

/// Content bytes of every image XObject stream in a document.
pub fn embedded_image_streams(pdf_bytes: &[u8]) -> Vec<Vec<u8>> {
    let doc = Document::load_mem(pdf_bytes).expect("load output PDF");
    let mut streams = Vec::new();
    for (_, object) in doc.objects.iter() {
        if let Object::Stream(stream) = object
            && let Ok(subtype) = stream.dict.get(b"Subtype").and_then(Object::as_name)
            && subtype == b"Image"
        {
            streams.push(stream.content.clone());
        }
    }
    streams
}
