use lopdf::Document;

/// Read-only view over a loaded document's page tree and resources.
///
/// Nothing here mutates the source document; extraction works on borrowed
/// stream objects only.
pub struct PdfReader {
    doc: Document,
}

impl PdfReader {
    /// Load a document from an in-memory byte payload.
    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        let doc = Document::load_mem(bytes)?;
        Ok(Self { doc })
    }

    /// Page numbers in ascending order (1-indexed).
    pub fn page_numbers(&self) -> Vec<u32> {
        self.doc.get_pages().keys().copied().collect()
    }

    /// MediaBox lookup with Parent-tree inheritance.
    fn get_media_box(&self, dict: &lopdf::Dictionary) -> crate::error::Result<lopdf::Object> {
        if let Ok(obj) = dict.get(b"MediaBox") {
            return Ok(obj.clone());
        }

        if let Ok(lopdf::Object::Reference(parent_id)) = dict.get(b"Parent") {
            let parent_dict = self.doc.get_dictionary(*parent_id)?;
            return self.get_media_box(parent_dict);
        }

        Err(crate::error::PdfImagingError::pdf_read("MediaBox not found"))
    }

    /// Untransformed page dimensions `(width_pts, height_pts)` for a
    /// 1-indexed page.
    pub fn page_dimensions(&self, page_num: u32) -> crate::error::Result<(f64, f64)> {
        let page_id = self.get_page_id(page_num)?;
        let page_dict = self.doc.get_dictionary(page_id)?;

        let media_box = self.get_media_box(page_dict)?;
        let media_box_array = media_box.as_array()?;
        if media_box_array.len() < 4 {
            return Err(crate::error::PdfImagingError::pdf_read("Invalid MediaBox"));
        }

        let to_f64 = |obj: &lopdf::Object| -> crate::error::Result<f64> {
            match obj {
                lopdf::Object::Integer(i) => Ok(*i as f64),
                lopdf::Object::Real(f) => Ok(*f as f64),
                _ => Err(crate::error::PdfImagingError::pdf_read(
                    "Invalid MediaBox value",
                )),
            }
        };

        let x0 = to_f64(&media_box_array[0])?;
        let y0 = to_f64(&media_box_array[1])?;
        let x1 = to_f64(&media_box_array[2])?;
        let y1 = to_f64(&media_box_array[3])?;

        let width = (x1 - x0).abs();
        let height = (y1 - y0).abs();

        if width <= 0.0 || height <= 0.0 {
            return Err(crate::error::PdfImagingError::pdf_read(
                "Invalid MediaBox: non-positive page dimensions",
            ));
        }

        // Upper bound from the PDF format's nominal limit (14,400 pt ≈ 200 in).
        const PDF_MAX_DIMENSION_PT: f64 = 14_400.0;
        if width > PDF_MAX_DIMENSION_PT || height > PDF_MAX_DIMENSION_PT {
            return Err(crate::error::PdfImagingError::pdf_read(
                "Invalid MediaBox: page dimensions exceed PDF limits",
            ));
        }

        Ok((width, height))
    }

    /// Image XObject entries of a 1-indexed page, as `(name, stream)` pairs.
    ///
    /// Entries appear in resource-dictionary insertion order (page-local
    /// resources first, then inherited resource dictionaries); that order is
    /// preserved into the extraction archive's naming scheme. Only entries
    /// with `Subtype /Image` are returned; indirection is resolved to the
    /// underlying stream object.
    pub fn page_image_xobjects(
        &self,
        page_num: u32,
    ) -> crate::error::Result<Vec<(String, &lopdf::Stream)>> {
        let page_id = self.get_page_id(page_num)?;
        let (resource_dict, resource_ids) = self.doc.get_page_resources(page_id)?;

        let mut entries = Vec::new();

        if let Some(dict) = resource_dict {
            self.collect_image_xobjects(dict, &mut entries)?;
        }
        for res_id in resource_ids {
            let dict = self.doc.get_dictionary(res_id)?;
            self.collect_image_xobjects(dict, &mut entries)?;
        }

        Ok(entries)
    }

    fn collect_image_xobjects<'a>(
        &'a self,
        dict: &'a lopdf::Dictionary,
        entries: &mut Vec<(String, &'a lopdf::Stream)>,
    ) -> crate::error::Result<()> {
        let xobject_entry = match dict.get(b"XObject") {
            Ok(entry) => entry,
            Err(_) => return Ok(()),
        };

        let xobject_dict = match xobject_entry {
            lopdf::Object::Dictionary(d) => d,
            lopdf::Object::Reference(id) => {
                self.doc.get_object(*id).and_then(lopdf::Object::as_dict)?
            }
            _ => return Ok(()),
        };

        for (name_bytes, value) in xobject_dict.iter() {
            let stream = match value {
                lopdf::Object::Reference(id) => {
                    match self.doc.get_object(*id).and_then(lopdf::Object::as_stream) {
                        Ok(s) => s,
                        // A dangling or non-stream reference is that entry's
                        // problem, not the page's.
                        Err(_) => continue,
                    }
                }
                lopdf::Object::Stream(s) => s,
                _ => continue,
            };

            if let Ok(subtype) = stream.dict.get(b"Subtype").and_then(lopdf::Object::as_name)
                && subtype == b"Image"
            {
                let name = String::from_utf8_lossy(name_bytes).into_owned();
                entries.push((name, stream));
            }
        }

        Ok(())
    }

    fn get_page_id(&self, page_num: u32) -> crate::error::Result<lopdf::ObjectId> {
        let pages = self.doc.get_pages();
        pages.get(&page_num).copied().ok_or_else(|| {
            crate::error::PdfImagingError::pdf_read(format!("page {} not found", page_num))
        })
    }
}
