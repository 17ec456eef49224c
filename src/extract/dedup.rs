// Content fingerprinting and duplicate suppression for one extraction run.

use std::collections::HashSet;
use std::fmt;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::pdf::raster::RasterObjectRecord;

/// Upper bound on content bytes sampled into a fingerprint. Sampling a prefix
/// keeps fingerprinting cheap on large payloads; records agreeing on geometry,
/// length, and this prefix are treated as duplicates without byte-for-byte
/// verification.
pub const SAMPLE_LIMIT: usize = 100;

/// Cheap approximate identity for a raster payload: SHA-256 over
/// `(width, height, byte length, first ≤100 content bytes)`, namespaced by
/// the record's provenance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub fn of(record: &RasterObjectRecord) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(record.provenance.namespace().as_bytes());
        hasher.update(record.width.to_le_bytes());
        hasher.update(record.height.to_le_bytes());
        hasher.update((record.raw_bytes.len() as u64).to_le_bytes());
        let sample_len = record.raw_bytes.len().min(SAMPLE_LIMIT);
        hasher.update(&record.raw_bytes[..sample_len]);
        ContentFingerprint(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Running set of fingerprints seen during one extraction run.
///
/// The first record with a given fingerprint is emitted; later records with an
/// equal fingerprint are suppressed. The set lives for one run only.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<ContentFingerprint>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` exactly once per distinct fingerprint.
    pub fn should_emit(&mut self, record: &RasterObjectRecord) -> bool {
        let fingerprint = ContentFingerprint::of(record);
        let first = self.seen.insert(fingerprint.clone());
        if !first {
            debug!(
                page = record.page_number,
                name = %record.name,
                fingerprint = %fingerprint,
                "duplicate raster content suppressed"
            );
        }
        first
    }

    pub fn distinct_count(&self) -> usize {
        self.seen.len()
    }
}
