// FlateDecode compression of plain streams and orphan-object removal,
// applied to assembled output documents before save.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Document, Object, ObjectId};

/// Apply FlateDecode to every stream without a declared filter.
///
/// Streams that already carry a filter (the per-page JPEG XObjects) are left
/// alone to avoid double compression.
pub fn compress_streams(doc: &mut Document) {
    let ids: Vec<ObjectId> = doc.objects.keys().copied().collect();

    for id in ids {
        let needs_compression = {
            let Some(Object::Stream(stream)) = doc.objects.get(&id) else {
                continue;
            };
            stream.dict.get(b"Filter").is_err()
        };

        if needs_compression {
            let Some(Object::Stream(stream)) = doc.objects.get_mut(&id) else {
                continue;
            };

            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            if encoder.write_all(&stream.content).is_err() {
                continue;
            }
            let Ok(compressed) = encoder.finish() else {
                continue;
            };

            stream.dict.set("Filter", "FlateDecode");
            stream.set_content(compressed);
        }
    }
}

/// Remove objects no longer referenced from the document graph.
pub fn delete_unused_objects(doc: &mut Document) {
    doc.prune_objects();
}

/// All optimization passes, in order.
pub fn optimize(doc: &mut Document) {
    compress_streams(doc);
    delete_unused_objects(doc);
}
