//! Book manifest types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One file written for a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name relative to the book directory
    pub file: String,
    /// SHA-256 of the file contents
    pub sha256: String,
    /// Size in bytes
    pub size_bytes: u64,
}

/// Manifest written alongside a generated book as `book.json`.
///
/// Records what was generated and the content hash of every image, so a
/// book directory can be audited after the fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookManifest {
    /// Book title as entered
    pub title: String,
    /// Style key the book was generated with
    pub style: String,
    /// Whether consistency mode was active
    pub consistency: bool,
    /// When generation finished
    pub created_at: DateTime<Utc>,
    /// Files written, in generation order
    pub entries: Vec<ManifestEntry>,
}

impl BookManifest {
    /// Start a manifest for a book.
    pub fn new(title: impl Into<String>, style: impl Into<String>, consistency: bool) -> Self {
        Self {
            title: title.into(),
            style: style.into(),
            consistency,
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    /// Record a written file and its content hash.
    pub fn record(&mut self, file: impl Into<String>, bytes: &[u8]) {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        self.entries.push(ManifestEntry {
            file: file.into(),
            sha256: format!("{:x}", hasher.finalize()),
            size_bytes: bytes.len() as u64,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_hashes_content() {
        let mut manifest = BookManifest::new("Title", "childrens_dreamy", false);
        manifest.record("cover.png", b"abc");
        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.entries[0].size_bytes, 3);
        // sha256("abc")
        assert_eq!(
            manifest.entries[0].sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
