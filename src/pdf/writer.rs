// Assembles one-JPEG-per-page documents from encoded page images.

use lopdf::{Document, Object, Stream, dictionary};

use crate::pipeline::page_raster::EncodedPageImage;

/// Builds an output document where each page is a single full-bleed JPEG
/// XObject. Page geometry is taken from the caller (source page size at scale
/// 1), independent of the pixel dimensions of the encoded image.
pub struct ImagePageWriter {
    doc: Document,
    pages_id: lopdf::ObjectId,
    page_ids: Vec<lopdf::ObjectId>,
}

impl ImagePageWriter {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
        }
    }

    /// Append one page drawing `image` scaled to `width_pts` x `height_pts`.
    pub fn add_page(
        &mut self,
        image: &EncodedPageImage,
        width_pts: f64,
        height_pts: f64,
    ) -> crate::error::Result<()> {
        if width_pts <= 0.0 || height_pts <= 0.0 {
            return Err(crate::error::PdfImagingError::pdf_write(format!(
                "non-positive page dimensions: {width_pts} x {height_pts}"
            )));
        }

        let xobject_id = self.doc.add_object(Object::Stream(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.bytes.clone(),
        )));

        let mut xobject_dict = lopdf::Dictionary::new();
        xobject_dict.set("PageImg", Object::Reference(xobject_id));
        let resources_id = self.doc.add_object(dictionary! {
            "XObject" => Object::Dictionary(xobject_dict),
        });

        let content_bytes = Self::build_page_content_stream("PageImg", width_pts, height_pts);
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, content_bytes)));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width_pts as f32),
                Object::Real(height_pts as f32),
            ],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        self.page_ids.push(page_id);

        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Drawing commands scaling the named XObject to the full page:
    /// `q <w> 0 0 <h> 0 0 cm /Name Do Q`
    fn build_page_content_stream(image_name: &str, width_pts: f64, height_pts: f64) -> Vec<u8> {
        format!("q {width_pts:.2} 0 0 {height_pts:.2} 0 0 cm /{image_name} Do Q").into_bytes()
    }

    /// Document Info with descriptive fields cleared and provenance fields
    /// overwritten. Full-page recompression is lossy by design; the policy
    /// additionally strips whatever metadata the source carried.
    fn write_scrubbed_metadata(&mut self) {
        let generator = concat!("pdf_imaging ", env!("CARGO_PKG_VERSION"));
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::string_literal(""),
            "Author" => Object::string_literal(""),
            "Subject" => Object::string_literal(""),
            "Keywords" => Object::string_literal(""),
            "Producer" => Object::string_literal(generator),
            "Creator" => Object::string_literal(generator),
        });
        self.doc.trailer.set("Info", info_id);
    }

    /// Finish the page tree and serialize the document.
    pub fn finish_to_bytes(&mut self) -> crate::error::Result<Vec<u8>> {
        if self.page_ids.is_empty() {
            return Err(crate::error::PdfImagingError::pdf_write(
                "document has no pages",
            ));
        }

        let kids: Vec<Object> = self.page_ids.iter().map(|id| (*id).into()).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => self.page_ids.len() as i64,
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        self.write_scrubbed_metadata();
        crate::pdf::optimizer::optimize(&mut self.doc);

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| crate::error::PdfImagingError::pdf_write(e.to_string()))?;
        Ok(buf)
    }
}

impl Default for ImagePageWriter {
    fn default() -> Self {
        Self::new()
    }
}
