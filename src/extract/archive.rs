// Deterministic zip assembly for extracted images.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;

use super::ExtractedImage;

/// Build the extraction archive. Entry `n` (1-based, in the order the images
/// were emitted) is named `image_{n}_page{p}.{ext}`. A fixed timestamp keeps
/// the archive bytes deterministic for identical inputs.
pub fn build_archive(images: &[ExtractedImage]) -> crate::error::Result<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    for (i, image) in images.iter().enumerate() {
        let entry_name = format!(
            "image_{}_page{}.{}",
            i + 1,
            image.page_number,
            image.format.extension()
        );
        writer.start_file(entry_name, options)?;
        writer.write_all(&image.bytes)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractedFormat;

    fn image(page_number: u32, format: ExtractedFormat) -> ExtractedImage {
        ExtractedImage {
            page_number,
            format,
            bytes: vec![1, 2, 3, 4],
        }
    }

    #[test]
    fn test_entry_naming_follows_emission_order() {
        let images = vec![
            image(1, ExtractedFormat::Jpeg),
            image(1, ExtractedFormat::Png),
            image(3, ExtractedFormat::Bin),
        ];
        let bytes = build_archive(&images).expect("archive");

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open archive");
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).expect("entry").name().to_owned())
            .collect();
        assert_eq!(
            names,
            vec!["image_1_page1.jpg", "image_2_page1.png", "image_3_page3.bin"]
        );
    }

    #[test]
    fn test_archive_bytes_are_deterministic() {
        let images = vec![image(1, ExtractedFormat::Png), image(2, ExtractedFormat::Png)];
        let a = build_archive(&images).expect("archive");
        let b = build_archive(&images).expect("archive");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input_builds_empty_archive() {
        let bytes = build_archive(&[]).expect("archive");
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open archive");
        assert_eq!(archive.len(), 0);
    }
}
