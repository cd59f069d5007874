//! Build fingerprint accumulated over every converted document.

use crate::models::DocumentMeta;
use sha2::{Digest, Sha256};

/// Running SHA-256 over rendered output and canonical metadata.
///
/// The digest depends on the order documents are folded in, so it is only
/// reproducible for a fixed processing order.
#[derive(Debug, Clone, Default)]
pub struct BuildFingerprint {
    hasher: Sha256,
    documents: usize,
}

impl BuildFingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, html: &str, meta: &DocumentMeta) {
        self.hasher.update(html.as_bytes());
        self.hasher.update(meta.canonical().as_bytes());
        self.documents += 1;
    }

    /// Number of documents folded in so far
    pub fn documents(&self) -> usize {
        self.documents
    }

    /// Lowercase hex digest of everything seen so far
    pub fn hex(&self) -> String {
        let hash = self.hasher.clone().finalize();
        format!("{hash:x}")
    }
}
